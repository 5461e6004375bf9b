/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Classification engine
//!
//! Every classifier is a pure function of its raw inputs and the
//! [`DatasetRegistry`](crate::domain::DatasetRegistry). Tiers are tried in a
//! fixed order (dataset exact, dataset partial, heuristic rule table,
//! fallback default) and the first tier that produces a value wins, so each
//! call yields a [`ClassifiedAttribute`] with a non-empty value.

pub mod chassis;
pub mod hardware;
pub mod memory;
pub mod rules;
pub mod system;
pub mod usb;

pub use chassis::{chassis_state_is_safe, classify_chassis_type, derive_system_type};
pub use hardware::{
    classify_cpu_architecture, classify_gpu_type, classify_storage_drive_type, clean_device_name,
};
pub use memory::{classify_form_factor, classify_memory_manufacturer, classify_memory_type};
pub use rules::{first_match, Field, Matcher, Rule, RuleInput};
pub use system::{classify_os_product_type, is_oem_manufacturer, service_pack_label};
pub use usb::{
    classify_usb_device, classify_usb_version, extract_vid_pid, highest_usb_version,
    UsbClassification, UsbIdentity,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stage of the pipeline produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceTier {
    DatasetExact,
    DatasetPartial,
    Heuristic,
    FallbackDefault,
}

/// Attribute being classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    CpuArchitecture,
    GpuType,
    StorageDriveType,
    MemoryType,
    MemoryFormFactor,
    MemoryManufacturer,
    ChassisType,
    SystemType,
    UsbDeviceClass,
    UsbVersion,
    OsProductType,
}

/// Canonical value plus provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedAttribute {
    pub category: Category,
    pub value: String,
    pub tier: SourceTier,
}

impl ClassifiedAttribute {
    pub fn new(category: Category, value: impl Into<String>, tier: SourceTier) -> Self {
        let value = value.into();
        // Blank values are never stored; they degrade to the fallback
        if value.trim().is_empty() {
            return Self::fallback(category, UNKNOWN);
        }
        Self {
            category,
            value,
            tier,
        }
    }

    pub fn fallback(category: Category, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            category,
            value: if value.trim().is_empty() {
                UNKNOWN.to_string()
            } else {
                value
            },
            tier: SourceTier::FallbackDefault,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.tier == SourceTier::FallbackDefault
    }
}

impl fmt::Display for ClassifiedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Default canonical value when nothing else applies
pub const UNKNOWN: &str = "Unknown";
