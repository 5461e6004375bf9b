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

//! USB parsing functions for `/sys/bus/usb/devices`

use crate::domain::{ComponentKind, RawAttributeRecord};
use std::collections::BTreeMap;

/// Device classes that defer to the interface descriptors
const INTERFACE_DEFINED_CLASSES: &[&str] = &["00", "EF"];

/// Attributes of one `/sys/bus/usb/devices/<port>` entry
#[derive(Debug, Clone, Default)]
pub struct SysfsUsbEntry {
    /// Directory name, e.g. "usb1" or "1-4.2"
    pub port: String,
    /// Attribute file name → trimmed content
    pub attributes: BTreeMap<String, String>,
    /// `bInterfaceClass` of each interface, in interface order
    pub interface_classes: Vec<String>,
}

impl SysfsUsbEntry {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Root hubs are named "usbN" and stand for the host controller
    pub fn is_root_hub(&self) -> bool {
        self.port.starts_with("usb")
    }
}

/// bcdUSB "3.20" → "USB 3.2", "2.00" → "USB 2.0"
pub fn usb_version_from_bcd(bcd: &str) -> Option<String> {
    let (major, minor) = bcd.trim().split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor = minor.chars().next()?.to_digit(10)?;
    Some(format!("USB {}.{}", major, minor))
}

/// Class code reported for the device; interface-defined devices report
/// their first interface class
fn reported_class(entry: &SysfsUsbEntry) -> Option<String> {
    let device_class = entry.attr("bDeviceClass").map(str::to_uppercase);
    match device_class {
        Some(class) if INTERFACE_DEFINED_CLASSES.contains(&class.as_str()) => entry
            .interface_classes
            .first()
            .map(|c| c.trim().to_uppercase())
            .or(Some(class)),
        other => other,
    }
}

/// Convert one sysfs USB entry into a UsbDevice or UsbController record
///
/// The device id follows the `USB\VID_xxxx&PID_yyyy\<serial or port>` form
/// so vendor and product ids can be recovered from it.
pub fn parse_sysfs_usb_entry(entry: &SysfsUsbEntry) -> (ComponentKind, RawAttributeRecord) {
    let vendor = entry.attr("idVendor").map(str::to_uppercase).unwrap_or_else(|| "0000".into());
    let product = entry.attr("idProduct").map(str::to_uppercase).unwrap_or_else(|| "0000".into());
    let instance = entry.attr("serial").unwrap_or(entry.port.as_str());
    let device_id = format!("USB\\VID_{}&PID_{}\\{}", vendor, product, instance);
    let version = entry.attr("version").and_then(usb_version_from_bcd);

    if entry.is_root_hub() {
        let record = RawAttributeRecord::new()
            .with("device_id", device_id)
            .with_opt("name", entry.attr("product"))
            .with_opt("manufacturer", entry.attr("manufacturer"))
            .with_opt("version", version);
        return (ComponentKind::UsbController, record);
    }

    let name = entry.attr("product");
    let record = RawAttributeRecord::new()
        .with("device_id", device_id)
        .with_opt("name", name)
        .with_opt("description", name)
        .with_opt("manufacturer", entry.attr("manufacturer"))
        .with_opt("class_code", reported_class(entry))
        .with_opt("version", version)
        .with_opt("serial_number", entry.attr("serial"))
        // Present in sysfs means attached
        .with("is_connected", true);
    (ComponentKind::UsbDevice, record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(port: &str, attrs: &[(&str, &str)], interfaces: &[&str]) -> SysfsUsbEntry {
        SysfsUsbEntry {
            port: port.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            interface_classes: interfaces.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_usb_version_from_bcd() {
        assert_eq!(usb_version_from_bcd(" 3.20"), Some("USB 3.2".to_string()));
        assert_eq!(usb_version_from_bcd("2.00\n"), Some("USB 2.0".to_string()));
        assert_eq!(usb_version_from_bcd("garbage"), None);
    }

    #[test]
    fn test_device_entry_uses_interface_class() {
        let webcam = entry(
            "1-4",
            &[
                ("idVendor", "046d"),
                ("idProduct", "085e"),
                ("bDeviceClass", "ef"),
                ("product", "BRIO Ultra HD Webcam"),
                ("version", " 3.20"),
            ],
            &["0e", "0e", "01"],
        );
        let (kind, record) = parse_sysfs_usb_entry(&webcam);
        assert_eq!(kind, ComponentKind::UsbDevice);
        assert_eq!(
            record.get("device_id").unwrap().as_text().unwrap(),
            "USB\\VID_046D&PID_085E\\1-4"
        );
        assert_eq!(record.get("class_code").unwrap().as_text().unwrap(), "0E");
        assert_eq!(record.get("version").unwrap().as_text().unwrap(), "USB 3.2");
        assert_eq!(record.get("is_connected").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_root_hub_becomes_controller() {
        let hub = entry(
            "usb2",
            &[
                ("idVendor", "1d6b"),
                ("idProduct", "0003"),
                ("bDeviceClass", "09"),
                ("product", "xHCI Host Controller"),
                ("serial", "0000:00:14.0"),
                ("version", " 3.10"),
            ],
            &["09"],
        );
        let (kind, record) = parse_sysfs_usb_entry(&hub);
        assert_eq!(kind, ComponentKind::UsbController);
        assert_eq!(record.get("version").unwrap().as_text().unwrap(), "USB 3.1");
        assert!(!record.contains("class_code"));
    }
}
