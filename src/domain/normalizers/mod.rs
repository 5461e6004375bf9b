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

//! Section normalizers: probe records to snapshot entities
//!
//! Every string read through [`FieldReader::text`] passes the
//! [`PlaceholderFilter`] first, so classifiers never see sentinel values.
//! Field names read by each normalizer are listed on the function.

pub mod accounts;
pub mod hardware;
pub mod memory;
pub mod system;
pub mod usb;

pub use accounts::{normalize_active_user, normalize_security, normalize_user};
pub use hardware::{normalize_cpu, normalize_disk, normalize_gpu, normalize_partition};
pub use memory::{normalize_basic_memory, normalize_memory_module, summarize_memory};
pub use system::{
    normalize_baseboard, normalize_chassis, normalize_manufacturers, normalize_os,
    normalize_uuids,
};
pub use usb::{normalize_usb_controller, normalize_usb_device};

use crate::domain::{AttributeValue, DatasetRegistry, PlaceholderFilter, RawAttributeRecord};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;

lazy_static! {
    static ref EMPTY_RECORD: RawAttributeRecord = RawAttributeRecord::new();
}

/// Shared read-only inputs of every normalizer
#[derive(Clone, Copy)]
pub struct NormalizationContext<'a> {
    pub registry: &'a DatasetRegistry,
    pub filter: &'a PlaceholderFilter,
}

impl<'a> NormalizationContext<'a> {
    pub fn new(registry: &'a DatasetRegistry, filter: &'a PlaceholderFilter) -> Self {
        Self { registry, filter }
    }

    pub fn reader(&self, record: &'a RawAttributeRecord) -> FieldReader<'a> {
        FieldReader {
            record,
            filter: self.filter,
        }
    }

    /// Reader over an absent record; every field reads as `None`
    pub fn reader_opt(&self, record: Option<&'a RawAttributeRecord>) -> FieldReader<'a> {
        self.reader(record.unwrap_or(&*EMPTY_RECORD))
    }
}

/// Typed, placeholder-aware access to one record
#[derive(Clone, Copy)]
pub struct FieldReader<'a> {
    record: &'a RawAttributeRecord,
    filter: &'a PlaceholderFilter,
}

impl<'a> FieldReader<'a> {
    fn value(&self, field: &str) -> Option<&'a AttributeValue> {
        self.record.get(field)
    }

    /// Trimmed text with sentinels removed
    pub fn text(&self, field: &str) -> Option<String> {
        self.value(field)
            .and_then(AttributeValue::as_text)
            .and_then(|raw| self.filter.filter(&raw))
    }

    /// First present field among `fields`
    pub fn text_any(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|field| self.text(field))
    }

    pub fn unsigned(&self, field: &str) -> Option<u64> {
        self.value(field).and_then(AttributeValue::as_unsigned)
    }

    pub fn float(&self, field: &str) -> Option<f64> {
        self.value(field).and_then(AttributeValue::as_float)
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.value(field).and_then(AttributeValue::as_bool)
    }

    pub fn date(&self, field: &str) -> Option<DateTime<Utc>> {
        self.value(field).and_then(AttributeValue::as_date)
    }
}

/// Bytes to whole megabytes
pub(crate) fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_filters_sentinels() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let record = RawAttributeRecord::new()
            .with("manufacturer", "  To Be Filled By O.E.M. ")
            .with("model", " B550 AORUS ELITE ")
            .with("speed", "3200")
            .with("enabled", "Yes");
        let reader = ctx.reader(&record);

        assert_eq!(reader.text("manufacturer"), None);
        assert_eq!(reader.text("model").as_deref(), Some("B550 AORUS ELITE"));
        assert_eq!(reader.text_any(&["manufacturer", "model"]).as_deref(), Some("B550 AORUS ELITE"));
        assert_eq!(reader.unsigned("speed"), Some(3200));
        assert_eq!(reader.boolean("enabled"), Some(true));
        assert_eq!(ctx.reader_opt(None).text("model"), None);
    }
}
