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

//! Memory information parsing functions

use super::common::{parse_key_value, parse_leading_number, parse_size_to_bytes, split_dmidecode_blocks};
use crate::domain::RawAttributeRecord;
use std::collections::BTreeMap;

const EMPTY_SLOT_MARKERS: &[&str] = &["No Module Installed", "Not Installed", "0", "0 MB"];

fn speed_mts(value: &str) -> Option<u64> {
    parse_leading_number(value).map(|v| v as u64).filter(|v| *v > 0)
}

/// "1.2 V" → 1200 (millivolts)
fn voltage_mv(value: &str) -> Option<u64> {
    parse_leading_number(value)
        .filter(|v| *v > 0.0)
        .map(|v| (v * 1000.0).round() as u64)
}

fn block_value<'a>(block: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    block
        .get(key)
        .map(String::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse PhysicalMemory records from `dmidecode -t 17`
///
/// Empty slots are skipped, so the record count equals the number of
/// installed modules.
///
/// # Arguments
/// * `dmidecode_output` - Raw output from dmidecode -t 17
pub fn parse_dmidecode_memory_devices(dmidecode_output: &str) -> Vec<RawAttributeRecord> {
    split_dmidecode_blocks(dmidecode_output, "Memory Device")
        .into_iter()
        .filter(|block| {
            block_value(block, "Size").is_some_and(|size| !EMPTY_SLOT_MARKERS.contains(&size))
        })
        .map(|block| {
            let value = |key: &str| block_value(&block, key).map(str::to_string);
            let configured_speed = block_value(&block, "Configured Memory Speed")
                .or_else(|| block_value(&block, "Configured Clock Speed"))
                .and_then(speed_mts);

            RawAttributeRecord::new()
                .with_opt("device_locator", value("Locator"))
                .with_opt("bank_label", value("Bank Locator"))
                .with_opt(
                    "capacity",
                    block_value(&block, "Size").and_then(|s| parse_size_to_bytes(s).ok()),
                )
                .with_opt("raw_type", value("Type"))
                .with_opt("form_factor_name", value("Form Factor"))
                .with_opt("speed", block_value(&block, "Speed").and_then(speed_mts))
                .with_opt("configured_clock_speed", configured_speed)
                .with_opt(
                    "configured_voltage",
                    block_value(&block, "Configured Voltage").and_then(voltage_mv),
                )
                .with_opt("min_voltage", block_value(&block, "Minimum Voltage").and_then(voltage_mv))
                .with_opt("max_voltage", block_value(&block, "Maximum Voltage").and_then(voltage_mv))
                .with_opt("manufacturer", value("Manufacturer"))
                .with_opt("part_number", value("Part Number"))
                .with_opt("serial_number", value("Serial Number"))
        })
        .collect()
}

/// Parse PhysicalMemoryArray records from `dmidecode -t 16`
///
/// Only arrays used as system memory are reported.
pub fn parse_dmidecode_memory_arrays(dmidecode_output: &str) -> Vec<RawAttributeRecord> {
    split_dmidecode_blocks(dmidecode_output, "Physical Memory Array")
        .into_iter()
        .filter(|block| block_value(block, "Use").map_or(true, |u| u == "System Memory"))
        .map(|block| {
            RawAttributeRecord::new()
                .with_opt(
                    "max_capacity_kb",
                    block_value(&block, "Maximum Capacity")
                        .and_then(|s| parse_size_to_bytes(s).ok())
                        .map(|bytes| bytes / 1024),
                )
                .with_opt(
                    "memory_devices",
                    block_value(&block, "Number Of Devices").and_then(|n| n.parse::<u64>().ok()),
                )
                .with_opt("location", block_value(&block, "Location"))
        })
        .collect()
}

/// Parse `/proc/meminfo` into the OS-visible memory counters (KB)
///
/// # Returns
/// * `Ok(RawAttributeRecord)` - Counters for the OperatingSystem record
/// * `Err(String)` - MemTotal missing
pub fn parse_meminfo(content: &str) -> Result<RawAttributeRecord, String> {
    let counters: BTreeMap<String, u64> = content
        .lines()
        .filter_map(|line| parse_key_value(line, ':').ok())
        .filter_map(|(key, value)| parse_leading_number(&value).map(|v| (key, v as u64)))
        .collect();

    let total = *counters
        .get("MemTotal")
        .ok_or_else(|| "MemTotal not found in meminfo".to_string())?;
    let free = counters
        .get("MemAvailable")
        .or_else(|| counters.get("MemFree"))
        .copied();
    let swap_total = counters.get("SwapTotal").copied().unwrap_or(0);
    let swap_free = counters.get("SwapFree").copied().unwrap_or(0);

    Ok(RawAttributeRecord::new()
        .with("total_visible_memory_kb", total)
        .with_opt("free_physical_memory_kb", free)
        .with("total_virtual_memory_kb", total + swap_total)
        .with_opt("free_virtual_memory_kb", free.map(|f| f + swap_free)))
}
