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

//! Physical memory sections

use super::{bytes_to_mb, NormalizationContext};
use crate::domain::classification::{
    classify_form_factor, classify_memory_manufacturer, classify_memory_type,
};
use crate::domain::parsers::round_to;
use crate::domain::{BasicMemoryInfo, DetailedMemoryInfo, MemoryModule, RawAttributeRecord};

/// Boards with more populated modules than this are assumed to have eight slots
const FOUR_SLOT_LIMIT: u64 = 4;

/// Build one memory module.
///
/// PhysicalMemory fields: `device_locator`, `bank_label`, `capacity` (bytes),
/// `memory_type` (SMBIOS code), `raw_type`, `form_factor` (code),
/// `form_factor_name`, `speed`, `configured_clock_speed`,
/// `configured_voltage`, `min_voltage`, `max_voltage` (mV), `manufacturer`,
/// `part_number`, `serial_number`.
pub fn normalize_memory_module(
    ctx: &NormalizationContext<'_>,
    module: &RawAttributeRecord,
) -> MemoryModule {
    let r = ctx.reader(module);
    let device_locator = r.text("device_locator");
    let raw_type = r.text("raw_type");
    let form_factor_name = r.text("form_factor_name");
    let manufacturer = r.text("manufacturer");

    MemoryModule {
        memory_type: classify_memory_type(
            ctx.registry,
            r.unsigned("memory_type"),
            raw_type.as_deref(),
            device_locator.as_deref(),
        )
        .value,
        form_factor: classify_form_factor(
            ctx.registry,
            r.unsigned("form_factor"),
            form_factor_name.as_deref(),
        )
        .value,
        manufacturer: classify_memory_manufacturer(ctx.registry, manufacturer.as_deref()).value,
        device_locator,
        bank_label: r.text("bank_label"),
        capacity_mb: r.unsigned("capacity").map(bytes_to_mb),
        speed: r.unsigned("speed"),
        configured_speed: r.unsigned("configured_clock_speed"),
        configured_voltage: r.unsigned("configured_voltage"),
        min_voltage: r.unsigned("min_voltage"),
        max_voltage: r.unsigned("max_voltage"),
        part_number: r.text("part_number"),
        serial_number: r.text("serial_number"),
    }
}

/// Best-effort slot count for boards that do not report one
fn estimate_total_slots(used: u64) -> u64 {
    if used <= FOUR_SLOT_LIMIT {
        4
    } else {
        8
    }
}

/// Aggregate modules and memory arrays into the detailed memory section.
///
/// PhysicalMemoryArray fields: `max_capacity_kb`, `memory_devices`.
/// ComputerSystem supplies `total_physical_memory` (bytes); without it the
/// installed size is the sum of module capacities.
pub fn summarize_memory(
    ctx: &NormalizationContext<'_>,
    modules: Vec<MemoryModule>,
    arrays: &[RawAttributeRecord],
    system: Option<&RawAttributeRecord>,
) -> DetailedMemoryInfo {
    let installed_memory_mb = ctx
        .reader_opt(system)
        .unsigned("total_physical_memory")
        .map(bytes_to_mb)
        .or_else(|| {
            let sum: u64 = modules.iter().filter_map(|m| m.capacity_mb).sum();
            (sum > 0).then_some(sum)
        });

    let max_memory_capacity_mb = arrays
        .iter()
        .filter_map(|a| ctx.reader(a).unsigned("max_capacity_kb"))
        .map(|kb| kb / 1024)
        .reduce(|a, b| a + b);
    let reported_slots = arrays
        .iter()
        .filter_map(|a| ctx.reader(a).unsigned("memory_devices"))
        .reduce(|a, b| a + b)
        .filter(|slots| *slots > 0);

    let used_memory_slots = modules.len() as u64;
    let total_memory_slots = match reported_slots {
        Some(slots) => Some(slots),
        None if used_memory_slots > 0 => Some(estimate_total_slots(used_memory_slots)),
        None => None,
    };

    let memory_speed = modules
        .iter()
        .filter_map(|m| m.speed)
        .filter(|speed| *speed > 0)
        .min();

    let mut architectures: Vec<&str> = Vec::new();
    for module in &modules {
        let kind = module.memory_type.as_str();
        if !architectures.contains(&kind) {
            architectures.push(kind);
        }
    }
    let memory_architecture = (!architectures.is_empty()).then(|| architectures.join(", "));

    DetailedMemoryInfo {
        installed_memory_mb,
        max_memory_capacity_mb,
        total_memory_slots,
        used_memory_slots,
        memory_architecture,
        memory_speed,
        memory_modules: modules,
    }
}

/// OS-visible memory counters.
///
/// OperatingSystem fields: `total_visible_memory_kb`,
/// `free_physical_memory_kb`, `total_virtual_memory_kb`,
/// `free_virtual_memory_kb`.
pub fn normalize_basic_memory(
    ctx: &NormalizationContext<'_>,
    os: Option<&RawAttributeRecord>,
) -> BasicMemoryInfo {
    let r = ctx.reader_opt(os);
    let total = r.unsigned("total_visible_memory_kb");
    let free = r.unsigned("free_physical_memory_kb");
    let memory_usage_percentage = match (total, free) {
        (Some(total), Some(free)) if total > 0 && free <= total => {
            Some(round_to((total - free) as f64 / total as f64 * 100.0, 2))
        }
        _ => None,
    };

    BasicMemoryInfo {
        total_visible_memory_kb: total,
        free_physical_memory_kb: free,
        total_virtual_memory_kb: r.unsigned("total_virtual_memory_kb"),
        free_virtual_memory_kb: r.unsigned("free_virtual_memory_kb"),
        memory_usage_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetDomain, DatasetRegistry, PlaceholderFilter};
    use serde_json::json;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn registry() -> DatasetRegistry {
        DatasetRegistry::from_documents(vec![
            (
                DatasetDomain::Memory,
                Ok(vec![json!({
                    "memoryTypes": {"26": "DDR4", "34": "DDR5"},
                    "formFactors": {"8": "DIMM", "12": "SODIMM"}
                })]),
            ),
            (
                DatasetDomain::Manufacturers,
                Ok(vec![json!({"manufacturers": {"80CE": "Samsung", "04CD": "G.Skill"}})]),
            ),
        ])
    }

    fn module(speed: u64, memory_type: u64, vendor: &str) -> RawAttributeRecord {
        RawAttributeRecord::new()
            .with("device_locator", "DIMM_A1")
            .with("capacity", 16 * GIB)
            .with("memory_type", memory_type)
            .with("form_factor", 8)
            .with("speed", speed)
            .with("manufacturer", vendor)
    }

    #[test]
    fn test_module_classification() {
        let registry = registry();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);

        let m = normalize_memory_module(&ctx, &module(3200, 26, "80CE"));
        assert_eq!(m.memory_type, "DDR4");
        assert_eq!(m.form_factor, "DIMM");
        assert_eq!(m.manufacturer, "Samsung");
        assert_eq!(m.capacity_mb, Some(16384));
    }

    #[test]
    fn test_summary_uses_slowest_module_and_distinct_types() {
        let registry = registry();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let modules = vec![
            normalize_memory_module(&ctx, &module(3200, 26, "80CE")),
            normalize_memory_module(&ctx, &module(2933, 26, "04CD")),
            normalize_memory_module(&ctx, &module(0, 34, "04CD")),
        ];
        let arrays = vec![RawAttributeRecord::new()
            .with("max_capacity_kb", 134217728_u64)
            .with("memory_devices", 4)];
        let system = RawAttributeRecord::new().with("total_physical_memory", 48 * GIB);

        let summary = summarize_memory(&ctx, modules, &arrays, Some(&system));
        assert_eq!(summary.memory_speed, Some(2933));
        assert_eq!(summary.memory_architecture.as_deref(), Some("DDR4, DDR5"));
        assert_eq!(summary.installed_memory_mb, Some(49152));
        assert_eq!(summary.max_memory_capacity_mb, Some(131072));
        assert_eq!(summary.total_memory_slots, Some(4));
        assert_eq!(summary.used_memory_slots, 3);
    }

    #[test]
    fn test_slot_estimate_without_reported_count() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let modules: Vec<MemoryModule> = (0..6)
            .map(|_| normalize_memory_module(&ctx, &module(4800, 34, "Kingston")))
            .collect();
        let arrays = vec![RawAttributeRecord::new().with("memory_devices", 0)];

        let summary = summarize_memory(&ctx, modules, &arrays, None);
        assert_eq!(summary.total_memory_slots, Some(8));
        assert_eq!(summary.installed_memory_mb, Some(6 * 16384));
        assert_eq!(summary.memory_architecture.as_deref(), Some("DDR5"));

        let two: Vec<MemoryModule> = (0..2)
            .map(|_| normalize_memory_module(&ctx, &module(4800, 34, "Kingston")))
            .collect();
        assert_eq!(summarize_memory(&ctx, two, &[], None).total_memory_slots, Some(4));
        assert_eq!(summarize_memory(&ctx, Vec::new(), &[], None).total_memory_slots, None);
    }

    #[test]
    fn test_basic_memory_usage() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let os = RawAttributeRecord::new()
            .with("total_visible_memory_kb", 16_000_000_u64)
            .with("free_physical_memory_kb", 4_000_000_u64);

        let basic = normalize_basic_memory(&ctx, Some(&os));
        assert_eq!(basic.memory_usage_percentage, Some(75.0));
        assert_eq!(normalize_basic_memory(&ctx, None).memory_usage_percentage, None);
    }
}
