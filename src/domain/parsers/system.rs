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

//! System, baseboard, chassis and OS release parsing functions

use super::common::{extract_dmidecode_value, parse_env_style};
use crate::domain::RawAttributeRecord;

/// SMBIOS enclosure state names, indexed from code 1
const ENCLOSURE_STATES: &[&str] = &[
    "Other",
    "Unknown",
    "Safe",
    "Warning",
    "Critical",
    "Non-recoverable",
];

/// "Safe" → 3
pub fn enclosure_state_code(state: &str) -> Option<u64> {
    ENCLOSURE_STATES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(state.trim()))
        .map(|index| index as u64 + 1)
}

/// Reads one `/sys/class/dmi/id/<name>` attribute
pub type DmiAttributeReader<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Build the ComputerSystem record from sysfs DMI attributes
pub fn parse_dmi_system(read: &DmiAttributeReader<'_>) -> RawAttributeRecord {
    RawAttributeRecord::new()
        .with_opt("manufacturer", read("sys_vendor"))
        .with_opt("model", read("product_name"))
        .with_opt("version", read("product_version"))
        .with_opt("sku", read("product_sku"))
        .with_opt("serial_number", read("product_serial"))
        .with_opt("uuid", read("product_uuid"))
}

/// Build the Baseboard record from sysfs DMI attributes
pub fn parse_dmi_baseboard(read: &DmiAttributeReader<'_>) -> RawAttributeRecord {
    let product = read("board_name");
    RawAttributeRecord::new()
        .with_opt("manufacturer", read("board_vendor"))
        .with_opt("product", product.clone())
        .with_opt("model", product)
        .with_opt("serial_number", read("board_serial"))
        .with_opt("version", read("board_version"))
}

/// Build the Chassis record from sysfs DMI attributes
pub fn parse_dmi_chassis(read: &DmiAttributeReader<'_>) -> RawAttributeRecord {
    RawAttributeRecord::new()
        .with_opt("manufacturer", read("chassis_vendor"))
        .with_opt(
            "chassis_type",
            read("chassis_type").and_then(|code| code.trim().parse::<u64>().ok()),
        )
        .with_opt("serial_number", read("chassis_serial"))
        .with_opt("asset_tag", read("chassis_asset_tag"))
        .with_opt("model", read("chassis_version"))
}

/// Parse the chassis fields only `dmidecode -t chassis` reports
///
/// # Arguments
/// * `dmidecode_output` - Raw output from dmidecode -t 3
pub fn parse_dmidecode_chassis(dmidecode_output: &str) -> RawAttributeRecord {
    let value = |key: &str| extract_dmidecode_value(dmidecode_output, key).ok();
    let state = |key: &str| value(key).and_then(|s| enclosure_state_code(&s));

    RawAttributeRecord::new()
        .with_opt("description", value("Type"))
        .with_opt("sku", value("SKU Number"))
        .with_opt("bootup_state", state("Boot-up State"))
        .with_opt("power_supply_state", state("Power Supply State"))
        .with_opt("thermal_state", state("Thermal State"))
        .with_opt(
            "number_of_power_cords",
            value("Number Of Power Cords").and_then(|n| n.parse::<u64>().ok()),
        )
}

/// Parse `/etc/os-release` into OperatingSystem fields
///
/// # Returns
/// * `Ok(RawAttributeRecord)` - name, version and build number
/// * `Err(String)` - No NAME or PRETTY_NAME present
pub fn parse_os_release(content: &str) -> Result<RawAttributeRecord, String> {
    let fields = parse_env_style(content);
    let name = fields
        .get("PRETTY_NAME")
        .or_else(|| fields.get("NAME"))
        .cloned()
        .ok_or_else(|| "os-release has no NAME".to_string())?;
    let version = fields
        .get("VERSION_ID")
        .or_else(|| fields.get("VERSION"))
        .cloned();
    let build = fields
        .get("BUILD_ID")
        .or_else(|| fields.get("VERSION_ID"))
        .cloned();

    Ok(RawAttributeRecord::new()
        .with("caption", name)
        .with_opt("version", version)
        .with_opt("build_number", build))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_enclosure_state_code() {
        assert_eq!(enclosure_state_code("Safe"), Some(3));
        assert_eq!(enclosure_state_code(" warning "), Some(4));
        assert_eq!(enclosure_state_code("Melting"), None);
    }

    #[test]
    fn test_parse_dmi_attributes() {
        let files: HashMap<&str, &str> = [
            ("sys_vendor", "Dell Inc."),
            ("product_name", "Precision 3660"),
            ("product_uuid", "4c4c4544-0042-3510-8052-b4c04f4e3933"),
            ("board_name", "0PRR48"),
            ("chassis_type", "3\n"),
        ]
        .into_iter()
        .collect();
        let read = |name: &str| files.get(name).map(|v| v.to_string());

        let system = parse_dmi_system(&read);
        assert_eq!(system.get("manufacturer").unwrap().as_text().unwrap(), "Dell Inc.");
        assert!(system.contains("uuid"));
        assert!(!system.contains("serial_number"));

        let board = parse_dmi_baseboard(&read);
        assert_eq!(board.get("product").unwrap().as_text().unwrap(), "0PRR48");

        let chassis = parse_dmi_chassis(&read);
        assert_eq!(chassis.get("chassis_type").unwrap().as_unsigned(), Some(3));
    }

    #[test]
    fn test_parse_dmidecode_chassis() {
        let output = "Chassis Information\n\tManufacturer: Dell Inc.\n\tType: Tower\n\tBoot-up State: Safe\n\tPower Supply State: Safe\n\tThermal State: Warning\n\tNumber Of Power Cords: 1\n\tSKU Number: Precision\n";
        let record = parse_dmidecode_chassis(output);
        assert_eq!(record.get("description").unwrap().as_text().unwrap(), "Tower");
        assert_eq!(record.get("bootup_state").unwrap().as_unsigned(), Some(3));
        assert_eq!(record.get("thermal_state").unwrap().as_unsigned(), Some(4));
        assert_eq!(record.get("number_of_power_cords").unwrap().as_unsigned(), Some(1));
    }

    #[test]
    fn test_parse_os_release() {
        let content = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nPRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\n";
        let record = parse_os_release(content).unwrap();
        assert_eq!(record.get("caption").unwrap().as_text().unwrap(), "Ubuntu 22.04.4 LTS");
        assert_eq!(record.get("version").unwrap().as_text().unwrap(), "22.04");
        assert!(parse_os_release("ID=unknown").is_err());
    }
}
