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

//! Display adapter parsing functions

use crate::domain::RawAttributeRecord;

/// PCI vendor ids of display adapter vendors
fn vendor_name(vendor_id: &str) -> Option<&'static str> {
    match vendor_id.to_lowercase().as_str() {
        "10de" => Some("NVIDIA"),
        "1002" | "1022" => Some("AMD"),
        "8086" => Some("Intel"),
        "1a03" => Some("ASPEED"),
        "15ad" => Some("VMware"),
        "1af4" => Some("Red Hat"),
        _ => None,
    }
}

/// One row of nvidia-smi output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvidiaSmiRow {
    /// PCI slot in lspci form ("01:00.0")
    pub slot: String,
    pub memory_mb: Option<u64>,
    pub driver_version: Option<String>,
}

/// Parse lspci output into VideoController records
///
/// Expected command: `lspci -nn`
///
/// # Arguments
///
/// * `output` - Output from lspci -nn
/// * `nvidia` - Rows from [`parse_nvidia_smi_output`] adding memory and driver details
pub fn parse_lspci_gpu_output(output: &str, nvidia: &[NvidiaSmiRow]) -> Vec<RawAttributeRecord> {
    output
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("vga compatible controller")
                || lower.contains("3d controller")
                || lower.contains("display controller")
        })
        .map(|line| {
            let pci_id = extract_pci_id(line);
            let slot = line.split_whitespace().next().unwrap_or_default();

            // Everything after the class, minus the trailing id and revision
            let description = line
                .split_once("]: ")
                .map(|(_, rest)| rest)
                .or_else(|| line.split_once(": ").map(|(_, rest)| rest))
                .unwrap_or(line);
            let name = description
                .split(" (rev")
                .next()
                .unwrap_or(description)
                .trim_end();
            let name = match &pci_id {
                Some(id) => name.trim_end_matches(&format!("[{}]", id)).trim_end(),
                None => name,
            };

            let manufacturer = pci_id
                .as_deref()
                .and_then(|id| id.split(':').next())
                .and_then(vendor_name);
            let smi = nvidia.iter().find(|row| row.slot == slot.to_lowercase());

            RawAttributeRecord::new()
                .with("name", name)
                .with_opt("manufacturer", manufacturer)
                .with(
                    "device_id",
                    match &pci_id {
                        Some(id) => format!("PCI\\{}\\{}", slot, id.to_uppercase()),
                        None => format!("PCI\\{}", slot),
                    },
                )
                .with("status", "OK")
                .with_opt(
                    "adapter_ram",
                    smi.and_then(|row| row.memory_mb).map(|mb| mb * 1024 * 1024),
                )
                .with_opt("driver_version", smi.and_then(|row| row.driver_version.clone()))
        })
        .collect()
}

/// Parse `nvidia-smi --query-gpu=pci.bus_id,memory.total,driver_version --format=csv,noheader,nounits`
///
/// Rows are used to enrich the matching lspci records.
pub fn parse_nvidia_smi_output(output: &str) -> Vec<NvidiaSmiRow> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let bus_id = parts.first().filter(|p| !p.is_empty())?;
            // "00000000:01:00.0" → "01:00.0" to match lspci slot names
            let slot = bus_id.splitn(2, ':').nth(1).unwrap_or(*bus_id).to_lowercase();
            Some(NvidiaSmiRow {
                slot,
                memory_mb: parts.get(1).and_then(|m| m.parse::<u64>().ok()),
                driver_version: parts
                    .get(2)
                    .filter(|d| !d.is_empty())
                    .map(|d| d.to_string()),
            })
        })
        .collect()
}

/// Extract PCI vendor:device ID from lspci output line
///
/// Looks for pattern like [10de:2204] - must be 4 hex chars : 4 hex chars
pub fn extract_pci_id(line: &str) -> Option<String> {
    let mut search_start = 0;
    while let Some(start) = line[search_start..].find('[') {
        let abs_start = search_start + start;
        let end = line[abs_start..].find(']')?;
        let bracket_content = &line[abs_start + 1..abs_start + end];

        if let Some((vendor, device)) = bracket_content.split_once(':') {
            let is_hex4 = |s: &str| s.len() == 4 && s.chars().all(|c| c.is_ascii_hexdigit());
            if is_hex4(vendor) && is_hex4(device) {
                return Some(bracket_content.to_string());
            }
        }
        search_start = abs_start + end + 1;
    }
    None
}
