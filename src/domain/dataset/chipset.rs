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

//! Chipset catalog: chipset model → PCIe generation, slots, release year

use serde::{Deserialize, Serialize};

/// PCIe generation reported when no chipset matches
pub const DEFAULT_PCIE_VERSION: &str = "PCIe 3.0+";

/// One expansion slot descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PciSlot {
    #[serde(rename = "type", default)]
    pub slot_type: Option<String>,
    #[serde(default)]
    pub speed_per_lane: Option<String>,
    #[serde(default)]
    pub total_bandwidth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipsetEntry {
    pub model: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default, alias = "pcieVersion")]
    pub pci_version: Option<String>,
    #[serde(default)]
    pub slots: Vec<PciSlot>,
}

/// Contents of one vendor chipset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipsetDataset {
    #[serde(default)]
    pub manufacturer: Option<String>,
    pub chipsets: Vec<ChipsetEntry>,
}

/// Result of splitting a baseboard product string around its chipset
#[derive(Debug, Clone, PartialEq)]
pub struct BoardIdentity<'a> {
    /// Product text preceding the chipset model
    pub board_model: Option<String>,
    pub chipset: Option<&'a ChipsetEntry>,
}

/// Vendor chipset datasets searched in load order
#[derive(Debug, Clone, Default)]
pub struct ChipsetCatalog {
    datasets: Vec<ChipsetDataset>,
}

impl ChipsetCatalog {
    pub fn new(datasets: Vec<ChipsetDataset>) -> Self {
        Self { datasets }
    }

    fn entries(&self) -> impl Iterator<Item = &ChipsetEntry> {
        self.datasets
            .iter()
            .flat_map(|dataset| dataset.chipsets.iter())
            .filter(|entry| !entry.model.trim().is_empty())
    }

    /// First entry whose model occurs (case-insensitively) in `text`
    pub fn find_by_model(&self, text: &str) -> Option<&ChipsetEntry> {
        if text.trim().is_empty() {
            return None;
        }
        let haystack = text.to_ascii_lowercase();
        self.entries()
            .find(|entry| haystack.contains(&entry.model.to_ascii_lowercase()))
    }

    /// Split a product string into board model and chipset.
    ///
    /// "ASUS X570-E" with an `X570` entry yields board model "ASUS" and the
    /// X570 entry. When the chipset opens the string the whole trimmed product
    /// is the board model.
    pub fn extract_model_and_chipset(&self, product: &str) -> BoardIdentity<'_> {
        let trimmed = product.trim();
        if trimmed.is_empty() {
            return BoardIdentity {
                board_model: None,
                chipset: None,
            };
        }

        // ASCII lowering keeps byte offsets aligned with the original string
        let haystack = trimmed.to_ascii_lowercase();
        for entry in self.entries() {
            if let Some(index) = haystack.find(&entry.model.to_ascii_lowercase()) {
                let board_model = if index > 0 {
                    trimmed[..index].trim()
                } else {
                    trimmed
                };
                return BoardIdentity {
                    board_model: Some(board_model.to_string()),
                    chipset: Some(entry),
                };
            }
        }

        BoardIdentity {
            board_model: Some(trimmed.to_string()),
            chipset: None,
        }
    }

    pub fn pcie_version(&self, chipset_model: &str) -> String {
        self.find_by_model(chipset_model)
            .and_then(|entry| entry.pci_version.clone())
            .unwrap_or_else(|| DEFAULT_PCIE_VERSION.to_string())
    }

    pub fn slots(&self, chipset_model: &str) -> Option<&[PciSlot]> {
        self.find_by_model(chipset_model)
            .map(|entry| entry.slots.as_slice())
    }

    pub fn release_year(&self, chipset_model: &str) -> Option<i32> {
        self.find_by_model(chipset_model)
            .and_then(|entry| entry.release_year)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
