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

//! Load-once registry of every reference table

use super::{ChipsetCatalog, ChipsetDataset, DatasetDomain, DatasetTable};
use crate::domain::classification::SourceTier;
use crate::domain::DatasetError;
use crate::ports::DatasetSource;
use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Load status of one dataset domain, reported in snapshot diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatus {
    pub domain: DatasetDomain,
    pub loaded: bool,
    /// Entry count per table within the domain
    pub entries: BTreeMap<String, usize>,
    pub error: Option<String>,
}

/// Immutable collection of reference tables.
///
/// Each domain loads independently; a missing or malformed file leaves only
/// that domain empty and its classifiers fall through to heuristics.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    manufacturers: Option<DatasetTable>,
    memory_types: Option<DatasetTable>,
    form_factors: Option<DatasetTable>,
    memory_type_mappings: Option<DatasetTable>,
    chassis_types: Option<DatasetTable>,
    usb_classes: Option<DatasetTable>,
    /// Lowercase name pattern → class code, file order
    usb_common_devices: Option<Vec<(String, String)>>,
    chipsets: Option<ChipsetCatalog>,
    failures: BTreeMap<DatasetDomain, String>,
}

impl DatasetRegistry {
    /// Registry with no tables; every classifier runs heuristic-only
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every domain from `source` concurrently
    pub async fn load(source: &dyn DatasetSource) -> Self {
        let loads = DatasetDomain::ALL
            .iter()
            .map(|domain| async move { (*domain, source.load(*domain).await) });
        let results = join_all(loads).await;
        Self::from_documents(results)
    }

    /// Build a registry from already-fetched documents, one result per domain
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (DatasetDomain, Result<Vec<Value>, DatasetError>)>,
    {
        let mut registry = Self::default();
        for (domain, fetched) in documents {
            let outcome = fetched.and_then(|docs| registry.install(domain, &docs));
            match outcome {
                Ok(()) => debug!("Loaded dataset domain {}", domain),
                Err(e) => {
                    warn!("Dataset domain {} unavailable, using heuristics: {}", domain, e);
                    registry.failures.insert(domain, e.to_string());
                }
            }
        }
        registry
    }

    fn install(&mut self, domain: DatasetDomain, docs: &[Value]) -> Result<(), DatasetError> {
        let path = domain.file_names().join(", ");
        let first = || {
            docs.first()
                .ok_or_else(|| DatasetError::NotFound(path.clone()))
        };

        match domain {
            DatasetDomain::Manufacturers => {
                self.manufacturers = Some(required_table(first()?, "manufacturers", &path)?);
            }
            DatasetDomain::Memory => {
                let doc = first()?;
                self.memory_types = Some(required_table(doc, "memoryTypes", &path)?);
                self.form_factors = optional_table(doc, "formFactors");
                self.memory_type_mappings = optional_table(doc, "memoryTypeMappings");
            }
            DatasetDomain::Chassis => {
                self.chassis_types = Some(required_table(first()?, "chassisTypes", &path)?);
            }
            DatasetDomain::UsbClasses => {
                let doc = first()?;
                self.usb_classes = Some(required_table(doc, "deviceClasses", &path)?);
                self.usb_common_devices = doc
                    .get("commonDevices")
                    .and_then(Value::as_object)
                    .map(|devices| {
                        devices
                            .iter()
                            .filter_map(|(pattern, entry)| {
                                let class = entry.get("class")?.as_str()?;
                                let pattern = pattern.trim().to_lowercase();
                                (!pattern.is_empty()).then(|| (pattern, class.to_string()))
                            })
                            .collect()
                    });
            }
            DatasetDomain::Chipsets => {
                if docs.is_empty() {
                    return Err(DatasetError::NotFound(path.clone()));
                }
                let datasets = docs
                    .iter()
                    .map(|doc| {
                        serde_json::from_value::<ChipsetDataset>(doc.clone()).map_err(|e| {
                            DatasetError::Parse {
                                path: path.clone(),
                                reason: e.to_string(),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.chipsets = Some(ChipsetCatalog::new(datasets));
            }
        }
        Ok(())
    }

    pub fn is_loaded(&self, domain: DatasetDomain) -> bool {
        match domain {
            DatasetDomain::Manufacturers => self.manufacturers.is_some(),
            DatasetDomain::Memory => self.memory_types.is_some(),
            DatasetDomain::Chassis => self.chassis_types.is_some(),
            DatasetDomain::UsbClasses => self.usb_classes.is_some(),
            DatasetDomain::Chipsets => self.chipsets.is_some(),
        }
    }

    pub fn is_fully_loaded(&self) -> bool {
        DatasetDomain::ALL.iter().all(|domain| self.is_loaded(*domain))
    }

    /// Per-domain load status and table sizes
    pub fn statistics(&self) -> Vec<DatasetStatus> {
        let count = |table: &Option<DatasetTable>| table.as_ref().map_or(0, DatasetTable::len);

        DatasetDomain::ALL
            .iter()
            .map(|domain| {
                let mut entries = BTreeMap::new();
                match domain {
                    DatasetDomain::Manufacturers => {
                        entries.insert("Manufacturers".to_string(), count(&self.manufacturers));
                    }
                    DatasetDomain::Memory => {
                        entries.insert("MemoryTypes".to_string(), count(&self.memory_types));
                        entries.insert("FormFactors".to_string(), count(&self.form_factors));
                        entries.insert(
                            "MemoryTypeMappings".to_string(),
                            count(&self.memory_type_mappings),
                        );
                    }
                    DatasetDomain::Chassis => {
                        entries.insert("ChassisTypes".to_string(), count(&self.chassis_types));
                    }
                    DatasetDomain::UsbClasses => {
                        entries.insert("UsbDeviceClasses".to_string(), count(&self.usb_classes));
                        entries.insert(
                            "UsbCommonDevices".to_string(),
                            self.usb_common_devices.as_ref().map_or(0, Vec::len),
                        );
                    }
                    DatasetDomain::Chipsets => {
                        entries.insert(
                            "Chipsets".to_string(),
                            self.chipsets.as_ref().map_or(0, ChipsetCatalog::len),
                        );
                    }
                }
                DatasetStatus {
                    domain: *domain,
                    loaded: self.is_loaded(*domain),
                    entries,
                    error: self.failures.get(domain).cloned(),
                }
            })
            .collect()
    }

    /// Resolve a JEDEC manufacturer id (or name) to a vendor name
    pub fn manufacturer_name(&self, id: &str) -> Option<(&str, SourceTier)> {
        self.manufacturers.as_ref()?.lookup(id)
    }

    pub fn is_known_manufacturer(&self, name: &str) -> bool {
        self.manufacturers
            .as_ref()
            .is_some_and(|table| table.contains_value(name))
    }

    pub fn memory_type_name(&self, code: u64) -> Option<&str> {
        self.memory_types
            .as_ref()?
            .lookup_exact(&code.to_string())
            .map(|(name, _)| name)
    }

    pub fn form_factor_name(&self, code: u64) -> Option<&str> {
        self.form_factors
            .as_ref()?
            .lookup_exact(&code.to_string())
            .map(|(name, _)| name)
    }

    /// Map a raw memory type name ("DDR4 SDRAM") to its canonical form
    pub fn map_memory_type(&self, raw: &str) -> Option<(&str, SourceTier)> {
        self.memory_type_mappings.as_ref()?.lookup_exact(raw)
    }

    pub fn chassis_type_name(&self, code: u64) -> Option<&str> {
        self.chassis_types
            .as_ref()?
            .lookup_exact(&code.to_string())
            .map(|(name, _)| name)
    }

    pub fn usb_class_name(&self, code: &str) -> Option<&str> {
        self.usb_classes
            .as_ref()?
            .lookup_exact(code)
            .map(|(name, _)| name)
    }

    /// Class code of the first common-device pattern contained in `name`
    pub fn usb_class_from_name(&self, name: &str) -> Option<&str> {
        let lowered = name.to_lowercase();
        self.usb_common_devices
            .as_ref()?
            .iter()
            .find(|(pattern, _)| lowered.contains(pattern.as_str()))
            .map(|(_, class)| class.as_str())
    }

    pub fn chipsets(&self) -> Option<&ChipsetCatalog> {
        self.chipsets.as_ref()
    }
}

fn required_table(doc: &Value, section: &str, path: &str) -> Result<DatasetTable, DatasetError> {
    doc.get(section)
        .and_then(Value::as_object)
        .map(DatasetTable::from_json_object)
        .ok_or_else(|| DatasetError::MissingSection {
            path: path.to_string(),
            section: section.to_string(),
        })
}

fn optional_table(doc: &Value, section: &str) -> Option<DatasetTable> {
    doc.get(section)
        .and_then(Value::as_object)
        .map(DatasetTable::from_json_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn documents() -> Vec<(DatasetDomain, Result<Vec<Value>, DatasetError>)> {
        vec![
            (
                DatasetDomain::Manufacturers,
                Ok(vec![json!({"manufacturers": {"80CE": "Samsung", "0x802C": "Micron"}})]),
            ),
            (
                DatasetDomain::Memory,
                Ok(vec![json!({
                    "memoryTypes": {"26": "DDR4", "34": "DDR5", "0": "Unknown"},
                    "formFactors": {"8": "DIMM", "12": "SODIMM"}
                })]),
            ),
            (
                DatasetDomain::Chassis,
                Err(DatasetError::NotFound("chassis_types.json".to_string())),
            ),
            (
                DatasetDomain::UsbClasses,
                Ok(vec![json!({
                    "deviceClasses": {"03": "HID (Human Interface Device)", "0E": "Video"},
                    "commonDevices": {"webcam": {"class": "0E"}, "keyboard": {"class": "03"}}
                })]),
            ),
            (DatasetDomain::Chipsets, Ok(vec![json!({"chipsets": "not a list"})])),
        ]
    }

    #[test]
    fn test_domains_load_independently() {
        let registry = DatasetRegistry::from_documents(documents());
        assert!(registry.is_loaded(DatasetDomain::Manufacturers));
        assert!(registry.is_loaded(DatasetDomain::Memory));
        assert!(!registry.is_loaded(DatasetDomain::Chassis));
        assert!(registry.is_loaded(DatasetDomain::UsbClasses));
        assert!(!registry.is_loaded(DatasetDomain::Chipsets));
        assert!(!registry.is_fully_loaded());
    }

    #[test]
    fn test_statistics_report_failures() {
        let registry = DatasetRegistry::from_documents(documents());
        let stats = registry.statistics();
        assert_eq!(stats.len(), DatasetDomain::ALL.len());

        let chassis = stats
            .iter()
            .find(|s| s.domain == DatasetDomain::Chassis)
            .unwrap();
        assert!(!chassis.loaded);
        assert!(chassis.error.as_ref().unwrap().contains("not found"));

        let memory = stats.iter().find(|s| s.domain == DatasetDomain::Memory).unwrap();
        assert_eq!(memory.entries["MemoryTypes"], 3);
        assert_eq!(memory.entries["FormFactors"], 2);
        assert_eq!(memory.entries["MemoryTypeMappings"], 0);
    }

    #[test]
    fn test_lookups() {
        let registry = DatasetRegistry::from_documents(documents());
        assert_eq!(registry.manufacturer_name("0x80CE").unwrap().0, "Samsung");
        assert_eq!(registry.manufacturer_name("802C").unwrap().0, "Micron");
        assert!(registry.is_known_manufacturer("samsung"));
        assert_eq!(registry.memory_type_name(26), Some("DDR4"));
        assert_eq!(registry.form_factor_name(12), Some("SODIMM"));
        assert_eq!(registry.chassis_type_name(10), None);
        assert_eq!(registry.usb_class_name("0x0e"), Some("Video"));
        assert_eq!(registry.usb_class_from_name("Logitech HD WebCam C270"), Some("0E"));
    }

    #[test]
    fn test_missing_section_is_a_failure() {
        let registry = DatasetRegistry::from_documents(vec![(
            DatasetDomain::Manufacturers,
            Ok(vec![json!({"vendors": {}})]),
        )]);
        assert!(!registry.is_loaded(DatasetDomain::Manufacturers));
        let stats = registry.statistics();
        assert!(stats[0].error.as_ref().unwrap().contains("'manufacturers'"));
    }
}
