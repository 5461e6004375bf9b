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

//! OS, baseboard, chassis, vendor and identifier sections

use super::NormalizationContext;
use crate::domain::classification::{
    chassis_state_is_safe, classify_chassis_type, classify_os_product_type, is_oem_manufacturer,
    service_pack_label, UNKNOWN,
};
use crate::domain::{
    BaseboardInfo, BuildInfo, ChassisInfo, InstallationInfo, ManufacturerInfo, MemoryModule,
    OsInfo, PciSlotInfo, ProcessInfo, RawAttributeRecord, UuidInfo,
};
use chrono::{DateTime, Utc};

/// Build the OS section.
///
/// OperatingSystem fields: `caption`, `version`, `build_number`,
/// `os_architecture`, `service_pack_major`, `service_pack_minor`,
/// `registered_user`, `organization`, `serial_number`, `system_directory`,
/// `windows_directory`, `locale`, `time_zone`, `install_date`,
/// `last_boot_up_time`, `number_of_processes`, `number_of_users`,
/// `product_type`, `kernel_version`, `hostname`. ComputerSystem supplies
/// `hypervisor_present`.
pub fn normalize_os(
    ctx: &NormalizationContext<'_>,
    os: Option<&RawAttributeRecord>,
    system: Option<&RawAttributeRecord>,
    now: DateTime<Utc>,
) -> OsInfo {
    let r = ctx.reader_opt(os);
    let last_boot_up_time = r.date("last_boot_up_time");
    let uptime_seconds = last_boot_up_time
        .map(|boot| (now - boot).num_seconds())
        .filter(|secs| *secs >= 0)
        .map(|secs| secs as u64);

    OsInfo {
        name: r.text_any(&["caption", "name"]),
        version: r.text("version"),
        build: BuildInfo {
            number: r.text("build_number"),
            architecture: r.text("os_architecture"),
            service_pack: service_pack_label(
                r.unsigned("service_pack_major"),
                r.unsigned("service_pack_minor"),
            ),
        },
        installation: InstallationInfo {
            install_date: r.date("install_date"),
            last_boot_up_time,
            uptime_seconds,
        },
        registered_user: r.text("registered_user"),
        organization: r.text("organization"),
        serial_number: r.text("serial_number"),
        system_directory: r.text("system_directory"),
        windows_directory: r.text("windows_directory"),
        locale: r.text("locale"),
        time_zone: r.text("time_zone"),
        processes: ProcessInfo {
            number_of_processes: r.unsigned("number_of_processes"),
            number_of_users: r.unsigned("number_of_users"),
        },
        is_hypervisor_present: ctx.reader_opt(system).boolean("hypervisor_present"),
        product_type: classify_os_product_type(r.unsigned("product_type")).value,
        kernel_version: r.text("kernel_version"),
        hostname: r.text("hostname"),
    }
}

/// Build the baseboard section and resolve its chipset.
///
/// Baseboard fields: `manufacturer`, `product`, `serial_number`, `version`,
/// `model`. `usb_version` is the highest controller version, computed after
/// the USB lists are merged.
pub fn normalize_baseboard(
    ctx: &NormalizationContext<'_>,
    board: Option<&RawAttributeRecord>,
    usb_version: Option<String>,
) -> BaseboardInfo {
    let r = ctx.reader_opt(board);
    let product = r.text("product");

    BaseboardInfo {
        manufacturer: r.text("manufacturer"),
        serial_number: r.text("serial_number"),
        version: r.text("version"),
        model: r.text("model"),
        pci_slot_info: pci_slot_info(ctx, product.as_deref()),
        product,
        usb_version: usb_version.unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

fn pci_slot_info(ctx: &NormalizationContext<'_>, product: Option<&str>) -> PciSlotInfo {
    let (Some(catalog), Some(product)) = (ctx.registry.chipsets(), product) else {
        return PciSlotInfo::default();
    };

    let identity = catalog.extract_model_and_chipset(product);
    // Without a chipset hit the product string itself is searched
    let key = identity.chipset.map_or(product, |entry| entry.model.as_str());

    PciSlotInfo {
        model: identity
            .chipset
            .map_or_else(|| UNKNOWN.to_string(), |entry| entry.model.clone()),
        version: catalog.pcie_version(key),
        available_slots: catalog.slots(key).map(<[_]>::to_vec),
        release_year: catalog.release_year(key),
    }
}

/// Build the chassis section.
///
/// Chassis fields: `manufacturer`, `serial_number`, `chassis_type` (SMBIOS
/// code), `description`, `model`, `asset_tag`, `sku`, `bootup_state`,
/// `power_supply_state`, `thermal_state` (state codes, 3 = safe),
/// `number_of_power_cords`.
pub fn normalize_chassis(
    ctx: &NormalizationContext<'_>,
    chassis: Option<&RawAttributeRecord>,
) -> ChassisInfo {
    let r = ctx.reader_opt(chassis);
    let code = r.unsigned("chassis_type");
    let classified = classify_chassis_type(ctx.registry, code, r.text("description").as_deref());
    let description = if classified.is_fallback() {
        UNKNOWN.to_string()
    } else {
        classified.value.clone()
    };

    ChassisInfo {
        manufacturer: r.text("manufacturer").unwrap_or_else(|| UNKNOWN.to_string()),
        serial_number: r.text("serial_number").unwrap_or_else(|| UNKNOWN.to_string()),
        chassis_type: classified.value,
        chassis_type_description: description,
        chassis_type_code: code,
        model: r.text("model"),
        asset_tag: r.text_any(&["asset_tag", "tag"]),
        sku: r.text("sku"),
        bootup_state: chassis_state_is_safe(r.unsigned("bootup_state")),
        power_supply_state: chassis_state_is_safe(r.unsigned("power_supply_state")),
        thermal_state: chassis_state_is_safe(r.unsigned("thermal_state")),
        number_of_power_cords: r.unsigned("number_of_power_cords"),
    }
}

/// Vendor identity across components, computed after the merge.
///
/// Memory vendors are the distinct resolved module manufacturers in
/// discovery order.
pub fn normalize_manufacturers(
    ctx: &NormalizationContext<'_>,
    system: Option<&RawAttributeRecord>,
    baseboard_manufacturer: Option<String>,
    chassis_manufacturer: &str,
    modules: &[MemoryModule],
) -> ManufacturerInfo {
    let system_manufacturer = ctx.reader_opt(system).text("manufacturer");

    let mut memory_vendors: Vec<&str> = Vec::new();
    for module in modules {
        let vendor = module.manufacturer.as_str();
        if vendor != UNKNOWN && !memory_vendors.contains(&vendor) {
            memory_vendors.push(vendor);
        }
    }

    let is_oem = is_oem_manufacturer(system_manufacturer.as_deref());
    ManufacturerInfo {
        system_manufacturer,
        baseboard_manufacturer,
        chassis_manufacturer: chassis_manufacturer.to_string(),
        memory_manufacturers: memory_vendors.join(", "),
        is_oem,
        is_custom_build: !is_oem,
        system_integrator: (!is_oem).then(|| "Custom Build".to_string()),
    }
}

/// Hardware identifiers.
///
/// ComputerSystem `uuid`; sentinel UUIDs (all F or all zero) are "Unknown".
/// Baseboard and chassis serials stand in for their identifiers.
pub fn normalize_uuids(
    ctx: &NormalizationContext<'_>,
    system: Option<&RawAttributeRecord>,
    board: Option<&RawAttributeRecord>,
    chassis: Option<&RawAttributeRecord>,
) -> UuidInfo {
    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());
    UuidInfo {
        system_uuid: or_unknown(ctx.reader_opt(system).text("uuid")),
        baseboard_uuid: or_unknown(ctx.reader_opt(board).text("serial_number")),
        chassis_uuid: or_unknown(ctx.reader_opt(chassis).text("serial_number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetDomain, DatasetRegistry, PlaceholderFilter};
    use chrono::TimeZone;
    use serde_json::json;

    fn registry() -> DatasetRegistry {
        DatasetRegistry::from_documents(vec![
            (
                DatasetDomain::Chassis,
                Ok(vec![json!({"chassisTypes": {"3": "Desktop", "10": "Notebook"}})]),
            ),
            (
                DatasetDomain::Chipsets,
                Ok(vec![json!({
                    "manufacturer": "AMD",
                    "chipsets": [{
                        "model": "X570", "releaseYear": 2019, "pciVersion": "PCIe 4.0",
                        "slots": [{"type": "PCIe x16", "speedPerLane": "16 GT/s", "totalBandwidth": "32 GB/s"}]
                    }]
                })]),
            ),
        ])
    }

    #[test]
    fn test_os_section() {
        let registry = registry();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let boot = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let os = RawAttributeRecord::new()
            .with("caption", "Microsoft Windows 11 Pro")
            .with("version", "10.0.22631")
            .with("service_pack_major", 0)
            .with("organization", "Default string")
            .with("product_type", 1)
            .with("last_boot_up_time", boot);
        let system = RawAttributeRecord::new().with("hypervisor_present", true);

        let info = normalize_os(&ctx, Some(&os), Some(&system), boot + chrono::Duration::hours(2));
        assert_eq!(info.name.as_deref(), Some("Microsoft Windows 11 Pro"));
        assert_eq!(info.build.service_pack, "0");
        assert_eq!(info.organization, None);
        assert_eq!(info.product_type, "Workstation");
        assert_eq!(info.installation.uptime_seconds, Some(7200));
        assert_eq!(info.is_hypervisor_present, Some(true));
    }

    #[test]
    fn test_missing_os_record_yields_defaults() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let info = normalize_os(&ctx, None, None, Utc::now());
        assert_eq!(info.name, None);
        assert_eq!(info.product_type, UNKNOWN);
    }

    #[test]
    fn test_baseboard_chipset_resolution() {
        let registry = registry();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let board = RawAttributeRecord::new()
            .with("manufacturer", "ASUSTeK COMPUTER INC.")
            .with("product", "ROG STRIX X570-E GAMING");

        let info = normalize_baseboard(&ctx, Some(&board), Some("USB 3.1".to_string()));
        assert_eq!(info.pci_slot_info.model, "X570");
        assert_eq!(info.pci_slot_info.version, "PCIe 4.0");
        assert_eq!(info.pci_slot_info.release_year, Some(2019));
        assert_eq!(info.pci_slot_info.available_slots.unwrap().len(), 1);
        assert_eq!(info.usb_version, "USB 3.1");

        let unknown = normalize_baseboard(&ctx, None, None);
        assert_eq!(unknown.pci_slot_info.model, UNKNOWN);
        assert_eq!(unknown.pci_slot_info.version, "PCIe 3.0+");
        assert_eq!(unknown.usb_version, UNKNOWN);
    }

    #[test]
    fn test_chassis_section() {
        let registry = registry();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let chassis = RawAttributeRecord::new()
            .with("manufacturer", "Default string")
            .with("chassis_type", 10)
            .with("bootup_state", 3)
            .with("thermal_state", 4);

        let info = normalize_chassis(&ctx, Some(&chassis));
        assert_eq!(info.manufacturer, UNKNOWN);
        assert_eq!(info.serial_number, UNKNOWN);
        assert_eq!(info.chassis_type, "Notebook");
        assert_eq!(info.chassis_type_description, "Notebook");
        assert_eq!(info.bootup_state, Some(true));
        assert_eq!(info.thermal_state, Some(false));
        assert_eq!(info.power_supply_state, None);

        let odd = RawAttributeRecord::new().with("chassis_type", 99);
        let info = normalize_chassis(&ctx, Some(&odd));
        assert_eq!(info.chassis_type, "Chassis Type 99");
        assert_eq!(info.chassis_type_description, UNKNOWN);
    }

    #[test]
    fn test_manufacturers_and_uuids() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let system = RawAttributeRecord::new()
            .with("manufacturer", "Micro-Star International Co., Ltd.")
            .with("uuid", "FFFFFFFF-FFFF-FFFF-FFFF-FFFFFFFFFFFF");
        let modules = vec![
            MemoryModule { manufacturer: "Kingston".into(), ..Default::default() },
            MemoryModule { manufacturer: UNKNOWN.into(), ..Default::default() },
            MemoryModule { manufacturer: "Kingston".into(), ..Default::default() },
            MemoryModule { manufacturer: "Samsung".into(), ..Default::default() },
        ];

        let info = normalize_manufacturers(&ctx, Some(&system), None, UNKNOWN, &modules);
        assert!(!info.is_oem);
        assert!(info.is_custom_build);
        assert_eq!(info.system_integrator.as_deref(), Some("Custom Build"));
        assert_eq!(info.memory_manufacturers, "Kingston, Samsung");

        let uuids = normalize_uuids(&ctx, Some(&system), None, None);
        assert_eq!(uuids.system_uuid, UNKNOWN);
        assert_eq!(uuids.baseboard_uuid, UNKNOWN);
    }
}
