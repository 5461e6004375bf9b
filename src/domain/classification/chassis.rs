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

//! Chassis type and system form factor classifiers

use super::rules::{first_match, Field, Matcher, Rule, RuleInput};
use super::{Category, ClassifiedAttribute, SourceTier, UNKNOWN};
use crate::domain::DatasetRegistry;

/// SMBIOS system enclosure types, used when the chassis dataset is missing
const SMBIOS_CHASSIS_TYPES: &[&str] = &[
    "Other",
    "Unknown",
    "Desktop",
    "Low Profile Desktop",
    "Pizza Box",
    "Mini Tower",
    "Tower",
    "Portable",
    "Laptop",
    "Notebook",
    "Hand Held",
    "Docking Station",
    "All in One",
    "Sub Notebook",
    "Space-saving",
    "Lunch Box",
    "Main Server Chassis",
    "Expansion Chassis",
    "SubChassis",
    "Bus Expansion Chassis",
    "Peripheral Chassis",
    "RAID Chassis",
    "Rack Mount Chassis",
    "Sealed-case PC",
    "Multi-system chassis",
    "Compact PCI",
    "Advanced TCA",
    "Blade",
    "Blade Enclosure",
    "Tablet",
    "Convertible",
    "Detachable",
    "IoT Gateway",
    "Embedded PC",
    "Mini PC",
    "Stick PC",
];

/// Chassis management state code meaning "Safe"
const STATE_SAFE: u64 = 3;

/// Classify a chassis type code.
///
/// The dataset table is tried first, then the SMBIOS enclosure table, then a
/// description the probe may have supplied. Unknown codes become
/// "Chassis Type N".
pub fn classify_chassis_type(
    registry: &DatasetRegistry,
    code: Option<u64>,
    description: Option<&str>,
) -> ClassifiedAttribute {
    let category = Category::ChassisType;

    if let Some(name) = code.and_then(|c| registry.chassis_type_name(c)) {
        return ClassifiedAttribute::new(category, name, SourceTier::DatasetExact);
    }

    let builtin = code
        .filter(|c| *c >= 1)
        .and_then(|c| SMBIOS_CHASSIS_TYPES.get((c - 1) as usize));
    if let Some(name) = builtin {
        return ClassifiedAttribute::new(category, *name, SourceTier::Heuristic);
    }

    if let Some(text) = description.map(str::trim).filter(|d| !d.is_empty()) {
        return ClassifiedAttribute::new(category, text, SourceTier::Heuristic);
    }

    match code {
        Some(c) => ClassifiedAttribute::fallback(category, format!("Chassis Type {}", c)),
        None => ClassifiedAttribute::fallback(category, UNKNOWN),
    }
}

static SYSTEM_TYPE_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::Contains(Field::Description, &["laptop", "notebook", "portable"]),
        then: "Laptop",
    },
    Rule {
        when: Matcher::Contains(Field::Description, &["desktop", "tower", "mini tower"]),
        then: "Desktop",
    },
    Rule {
        when: Matcher::Contains(Field::Description, &["server", "rack"]),
        then: "Server",
    },
    Rule {
        when: Matcher::Contains(Field::Description, &["tablet"]),
        then: "Tablet",
    },
    Rule {
        when: Matcher::Contains(Field::Description, &["all in one"]),
        then: "All-in-One",
    },
    Rule {
        when: Matcher::Contains(Field::Description, &["workstation"]),
        then: "Workstation",
    },
];

/// Derive the system form factor from a chassis description.
///
/// Unmatched descriptions pass through unchanged.
pub fn derive_system_type(chassis_description: Option<&str>) -> ClassifiedAttribute {
    let category = Category::SystemType;
    let input = RuleInput::new().with(Field::Description, chassis_description);
    if let Some(kind) = first_match(SYSTEM_TYPE_RULES, &input) {
        return ClassifiedAttribute::new(category, *kind, SourceTier::Heuristic);
    }
    ClassifiedAttribute::fallback(category, chassis_description.unwrap_or("").trim())
}

/// Bootup, power supply and thermal states report 3 for "Safe"
pub fn chassis_state_is_safe(code: Option<u64>) -> Option<bool> {
    code.map(|c| c == STATE_SAFE)
}
