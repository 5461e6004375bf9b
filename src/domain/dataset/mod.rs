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

//! Reference datasets used to normalize raw hardware values
//!
//! Tables are loaded once from static JSON files and shared read-only by every
//! classifier for the rest of the process.

pub mod chipset;
pub mod registry;

pub use chipset::{BoardIdentity, ChipsetCatalog, ChipsetDataset, ChipsetEntry, PciSlot};
pub use registry::{DatasetRegistry, DatasetStatus};

use crate::domain::classification::SourceTier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One independently loadable group of reference files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetDomain {
    Manufacturers,
    Memory,
    Chassis,
    UsbClasses,
    Chipsets,
}

impl DatasetDomain {
    pub const ALL: [DatasetDomain; 5] = [
        DatasetDomain::Manufacturers,
        DatasetDomain::Memory,
        DatasetDomain::Chassis,
        DatasetDomain::UsbClasses,
        DatasetDomain::Chipsets,
    ];

    /// File names backing this domain, in search order
    pub fn file_names(&self) -> &'static [&'static str] {
        match self {
            DatasetDomain::Manufacturers => &["manufacturers.json"],
            DatasetDomain::Memory => &["memory_types.json"],
            DatasetDomain::Chassis => &["chassis_types.json"],
            DatasetDomain::UsbClasses => &["usb_device_classes.json"],
            DatasetDomain::Chipsets => &["amd_chipsets.json", "intel_chipsets.json"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatasetDomain::Manufacturers => "Manufacturers",
            DatasetDomain::Memory => "Memory",
            DatasetDomain::Chassis => "Chassis",
            DatasetDomain::UsbClasses => "UsbClasses",
            DatasetDomain::Chipsets => "Chipsets",
        }
    }
}

impl fmt::Display for DatasetDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uppercase and strip a leading hex prefix
pub fn normalize_key(key: &str) -> String {
    let upper = key.trim().to_uppercase();
    match upper.strip_prefix("0X") {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

/// Immutable code → canonical name table preserving file order
#[derive(Debug, Clone, Default)]
pub struct DatasetTable {
    entries: Vec<(String, String)>,
    exact: HashMap<String, usize>,
    normalized: Vec<String>,
}

impl DatasetTable {
    /// Build a table from `(key, value)` pairs; on duplicate keys the first wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = DatasetTable::default();
        for (key, value) in pairs {
            let key = key.into();
            if key.trim().is_empty() || table.exact.contains_key(&key) {
                continue;
            }
            table.exact.insert(key.clone(), table.entries.len());
            table.normalized.push(normalize_key(&key));
            table.entries.push((key, value.into()));
        }
        table
    }

    /// Build a table from a JSON object whose values are strings or numbers
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self::from_pairs(object.iter().filter_map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        }))
    }

    /// Tiered lookup: exact key, normalized key, then substring containment
    /// in either direction. Ties resolve by table order.
    pub fn lookup(&self, key: &str) -> Option<(&str, SourceTier)> {
        if let Some(hit) = self.lookup_exact(key) {
            return Some(hit);
        }
        let query = normalize_key(key);
        if query.is_empty() {
            return None;
        }
        self.normalized
            .iter()
            .position(|candidate| {
                !candidate.is_empty() && (query.contains(candidate) || candidate.contains(&query))
            })
            .map(|index| (self.entries[index].1.as_str(), SourceTier::DatasetPartial))
    }

    /// Exact and normalized-equality lookup only.
    ///
    /// Numeric code tables use this: substring matching on decimal codes
    /// would alias "3" into "35".
    pub fn lookup_exact(&self, key: &str) -> Option<(&str, SourceTier)> {
        if key.trim().is_empty() {
            return None;
        }
        if let Some(&index) = self.exact.get(key) {
            return Some((self.entries[index].1.as_str(), SourceTier::DatasetExact));
        }
        let query = normalize_key(key);
        self.normalized
            .iter()
            .position(|candidate| *candidate == query)
            .map(|index| (self.entries[index].1.as_str(), SourceTier::DatasetExact))
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, v)| v.eq_ignore_ascii_case(value.trim()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manufacturers() -> DatasetTable {
        DatasetTable::from_pairs([
            ("0x1234", "Acme Memory"),
            ("80CE", "Samsung"),
            ("802C", "Micron"),
            ("", "Ignored"),
        ])
    }

    #[test]
    fn test_hex_prefix_and_case_insensitive() {
        let table = manufacturers();
        assert_eq!(table.lookup("0x1234"), table.lookup("1234"));
        assert_eq!(table.lookup("1234").unwrap().0, "Acme Memory");
        assert_eq!(table.lookup("80ce"), Some(("Samsung", SourceTier::DatasetExact)));
    }

    #[test]
    fn test_partial_match_either_direction() {
        let table = manufacturers();
        assert_eq!(
            table.lookup("80CE000080CE"),
            Some(("Samsung", SourceTier::DatasetPartial))
        );
        assert_eq!(table.lookup("2C"), Some(("Micron", SourceTier::DatasetPartial)));
    }

    #[test]
    fn test_partial_tie_breaks_by_insertion_order() {
        let table = DatasetTable::from_pairs([("AB", "First"), ("ABC", "Second")]);
        assert_eq!(table.lookup("xxABCxx").unwrap().0, "First");
    }

    #[test]
    fn test_empty_keys_never_match() {
        let table = manufacturers();
        assert_eq!(table.len(), 3);
        assert!(table.lookup("").is_none());
        assert!(table.lookup("0x").is_none());
        assert!(table.lookup("ZZZZ").is_none());
    }

    #[test]
    fn test_exact_lookup_skips_partial_tier() {
        let table = DatasetTable::from_pairs([("3", "DRAM"), ("26", "DDR4")]);
        assert!(table.lookup_exact("35").is_none());
        assert_eq!(table.lookup_exact("26").unwrap().0, "DDR4");
    }

    #[test]
    fn test_json_object_keeps_file_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z": "last-key-first", "a": "second", "n": 5, "skip": []}"#)
                .unwrap();
        let table = DatasetTable::from_json_object(json.as_object().unwrap());
        let values: Vec<&str> = table.values().collect();
        assert_eq!(values, vec!["last-key-first", "second", "5"]);
    }
}
