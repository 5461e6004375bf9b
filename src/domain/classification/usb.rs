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

//! USB device class, bus version and identifier extraction

use super::rules::{first_match, Field, Matcher, Rule, RuleInput};
use super::{Category, ClassifiedAttribute, SourceTier};
use crate::domain::dataset::normalize_key;
use crate::domain::DatasetRegistry;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VID_PID_RE: Regex =
        Regex::new(r"(?i)VID_([0-9A-F]{4})&PID_([0-9A-F]{4})").unwrap();
}

/// Vendor and product ids parsed from a device instance path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsbIdentity {
    /// "0xVVVV"
    pub vendor_id: Option<String>,
    /// "0xPPPP"
    pub product_id: Option<String>,
}

/// Locate `VID_xxxx&PID_yyyy` in a device id.
///
/// A device id without the pattern yields an empty identity, not an error.
pub fn extract_vid_pid(device_id: &str) -> UsbIdentity {
    match VID_PID_RE.captures(device_id) {
        Some(caps) => UsbIdentity {
            vendor_id: Some(format!("0x{}", caps[1].to_uppercase())),
            product_id: Some(format!("0x{}", caps[2].to_uppercase())),
        },
        None => UsbIdentity::default(),
    }
}

/// Class code plus classified description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbClassification {
    /// Two-digit uppercase class code ("0E")
    pub class_code: String,
    pub description: ClassifiedAttribute,
}

/// Standard class names, used when the class dataset lacks a code
const STANDARD_CLASSES: &[(&str, &str)] = &[
    ("00", "Use class information in the Interface Descriptors"),
    ("01", "Audio"),
    ("02", "Communications and CDC Control"),
    ("03", "HID (Human Interface Device)"),
    ("05", "Physical"),
    ("06", "Image"),
    ("07", "Printer"),
    ("08", "Mass Storage"),
    ("09", "Hub"),
    ("0A", "CDC-Data"),
    ("0B", "Smart Card"),
    ("0D", "Content Security"),
    ("0E", "Video"),
    ("0F", "Personal Healthcare"),
    ("10", "Audio/Video Devices"),
    ("11", "Billboard Device Class"),
    ("12", "USB Type-C Bridge Class"),
    ("DC", "Diagnostic Device"),
    ("E0", "Wireless Controller"),
    ("EF", "Miscellaneous"),
    ("FE", "Application Specific"),
    ("FF", "Vendor Specific"),
];

const VENDOR_SPECIFIC: &str = "FF";

/// Device heuristics; camera markers are tested before generic input markers
/// and the `mi_00` interface marker only counts together with an "hd" name.
static USB_CLASS_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::AnyOf(&[
            Matcher::Contains(Field::Name, &["webcam", "camera", "c960"]),
            Matcher::AllOf(&[
                Matcher::Contains(Field::DeviceId, &["mi_00"]),
                Matcher::Contains(Field::Name, &["hd"]),
            ]),
        ]),
        then: "0E",
    },
    Rule {
        when: Matcher::AnyOf(&[
            Matcher::Contains(Field::Name, &["audio"]),
            Matcher::Contains(Field::DeviceId, &["mi_02"]),
        ]),
        then: "01",
    },
    Rule {
        when: Matcher::AnyOf(&[
            Matcher::Contains(Field::Name, &["input", "keyboard", "mouse"]),
            Matcher::Equals(Field::VendorId, &["0x04f3", "0x30fa", "0x048d"]),
        ]),
        then: "03",
    },
    Rule {
        when: Matcher::AnyOf(&[
            Matcher::Contains(Field::Name, &["bluetooth"]),
            Matcher::Equals(Field::VendorId, &["0x8087"]),
        ]),
        then: "02",
    },
    Rule {
        when: Matcher::AnyOf(&[
            Matcher::Contains(Field::Name, &["hub", "root hub"]),
            Matcher::Equals(Field::VendorId, &["0x05e3", "0x0bda"]),
        ]),
        then: "09",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["composite"]),
        then: "00",
    },
];

fn normalize_class_code(code: &str) -> String {
    let normalized = normalize_key(code);
    if normalized.len() == 1 {
        format!("0{}", normalized)
    } else {
        normalized
    }
}

fn class_description(registry: &DatasetRegistry, code: &str) -> Option<(String, SourceTier)> {
    if let Some(name) = registry.usb_class_name(code) {
        return Some((name.to_string(), SourceTier::DatasetExact));
    }
    STANDARD_CLASSES
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, name)| (name.to_string(), SourceTier::Heuristic))
}

fn classified(
    registry: &DatasetRegistry,
    code: String,
    tier: SourceTier,
) -> UsbClassification {
    let description = match class_description(registry, &code) {
        // Keep the tier of the step that chose the code
        Some((name, _)) => ClassifiedAttribute::new(Category::UsbDeviceClass, name, tier),
        None => ClassifiedAttribute::new(Category::UsbDeviceClass, format!("Class {}", code), tier),
    };
    UsbClassification {
        class_code: code,
        description,
    }
}

/// Classify a USB device.
///
/// Tiers: dataset common-device pattern on name then description, the
/// probe-reported class code, the heuristic rule table, and finally
/// "FF" Vendor Specific.
pub fn classify_usb_device(
    registry: &DatasetRegistry,
    name: Option<&str>,
    description: Option<&str>,
    device_id: Option<&str>,
    vendor_id: Option<&str>,
    reported_class: Option<&str>,
) -> UsbClassification {
    let by_pattern = name
        .and_then(|n| registry.usb_class_from_name(n))
        .or_else(|| description.and_then(|d| registry.usb_class_from_name(d)));
    if let Some(code) = by_pattern {
        return classified(registry, normalize_class_code(code), SourceTier::DatasetPartial);
    }

    if let Some(code) = reported_class
        .map(normalize_class_code)
        .filter(|c| !c.is_empty())
    {
        if let Some(name) = registry.usb_class_name(&code) {
            return UsbClassification {
                description: ClassifiedAttribute::new(
                    Category::UsbDeviceClass,
                    name,
                    SourceTier::DatasetExact,
                ),
                class_code: code,
            };
        }
    }

    let input = RuleInput::new()
        .with(Field::Name, name.or(description))
        .with(Field::DeviceId, device_id)
        .with(Field::VendorId, vendor_id);
    if let Some(code) = first_match(USB_CLASS_RULES, &input) {
        return classified(registry, code.to_string(), SourceTier::Heuristic);
    }

    if let Some(code) = reported_class
        .map(normalize_class_code)
        .filter(|c| STANDARD_CLASSES.iter().any(|(k, _)| *k == c.as_str()))
    {
        return classified(registry, code, SourceTier::Heuristic);
    }

    UsbClassification {
        class_code: VENDOR_SPECIFIC.to_string(),
        description: ClassifiedAttribute::fallback(Category::UsbDeviceClass, "Vendor Specific"),
    }
}

/// Bus versions in ascending order
const USB_VERSIONS: &[&str] = &["USB 1.1", "USB 2.0", "USB 2.0+", "USB 3.0", "USB 3.1", "USB 3.2"];

static USB_VERSION_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::Contains(Field::Name, &["usb 3.2", "3.20"]),
        then: "USB 3.2",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["usb 3.1", "3.10"]),
        then: "USB 3.1",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["usb 3.0", "3.0", "xhci"]),
        then: "USB 3.0",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["usb 2.0", "2.0", "ehci"]),
        then: "USB 2.0",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["usb 1.1", "1.1", "ohci", "uhci"]),
        then: "USB 1.1",
    },
];

/// Bus version implied by a host controller name, default "USB 2.0+"
pub fn classify_usb_version(controller_name: Option<&str>) -> ClassifiedAttribute {
    let input = RuleInput::new().with(Field::Name, controller_name);
    match first_match(USB_VERSION_RULES, &input) {
        Some(version) => ClassifiedAttribute::new(Category::UsbVersion, *version, SourceTier::Heuristic),
        None => ClassifiedAttribute::fallback(Category::UsbVersion, "USB 2.0+"),
    }
}

/// Highest known bus version in `versions`
pub fn highest_usb_version<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(|v| USB_VERSIONS.iter().position(|known| *known == v))
        .max()
        .map(|index| USB_VERSIONS[index].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetDomain;
    use serde_json::json;

    fn registry() -> DatasetRegistry {
        DatasetRegistry::from_documents(vec![(
            DatasetDomain::UsbClasses,
            Ok(vec![json!({
                "deviceClasses": {"03": "HID (Human Interface Device)", "08": "Mass Storage", "0E": "Video"},
                "commonDevices": {"flash drive": {"class": "08"}}
            })]),
        )])
    }

    #[test]
    fn test_extract_vid_pid() {
        let id = extract_vid_pid(r"USB\VID_046d&PID_0825\5&2A3B&0&1");
        assert_eq!(id.vendor_id.as_deref(), Some("0x046D"));
        assert_eq!(id.product_id.as_deref(), Some("0x0825"));
        assert_eq!(extract_vid_pid(r"PCI\VEN_8086&DEV_A36D"), UsbIdentity::default());
    }

    #[test]
    fn test_dataset_pattern_wins() {
        let result = classify_usb_device(&registry(), Some("SanDisk Flash Drive"), None, None, None, Some("00"));
        assert_eq!(result.class_code, "08");
        assert_eq!(result.description.value, "Mass Storage");
        assert_eq!(result.description.tier, SourceTier::DatasetPartial);
    }

    #[test]
    fn test_camera_before_input() {
        let result = classify_usb_device(
            &DatasetRegistry::empty(),
            Some("Integrated Camera input"),
            None,
            None,
            None,
            None,
        );
        assert_eq!(result.class_code, "0E");
        assert_eq!(result.description.value, "Video");
    }

    #[test]
    fn test_interface_marker_needs_hd_name() {
        let empty = DatasetRegistry::empty();
        let hd = classify_usb_device(&empty, Some("HD USB Device"), None, Some(r"USB\VID_1234&PID_5678&MI_00\x"), None, None);
        assert_eq!(hd.class_code, "0E");
        let plain = classify_usb_device(&empty, Some("USB Device"), None, Some(r"USB\VID_1234&PID_5678&MI_00\x"), None, None);
        assert_eq!(plain.class_code, "FF");
    }

    #[test]
    fn test_vendor_id_rules() {
        let empty = DatasetRegistry::empty();
        let bt = classify_usb_device(&empty, Some("Wireless"), None, None, Some("0x8087"), None);
        assert_eq!(bt.class_code, "02");
        assert_eq!(bt.description.value, "Communications and CDC Control");
    }

    #[test]
    fn test_reported_class_code() {
        let registry = registry();
        let hid = classify_usb_device(&registry, Some("Gadget"), None, None, None, Some("0x3"));
        assert_eq!(hid.class_code, "03");
        assert_eq!(hid.description.tier, SourceTier::DatasetExact);

        let printer = classify_usb_device(&DatasetRegistry::empty(), Some("Gadget"), None, None, None, Some("07"));
        assert_eq!(printer.description.value, "Printer");
    }

    #[test]
    fn test_fallback_vendor_specific() {
        let result = classify_usb_device(&DatasetRegistry::empty(), None, None, None, None, None);
        assert_eq!(result.class_code, "FF");
        assert_eq!(result.description.value, "Vendor Specific");
        assert!(result.description.is_fallback());
    }

    #[test]
    fn test_usb_versions() {
        assert_eq!(classify_usb_version(Some("Intel(R) USB 3.20 eXtensible Host Controller")).value, "USB 3.2");
        assert_eq!(classify_usb_version(Some("xHCI Host Controller")).value, "USB 3.0");
        assert_eq!(classify_usb_version(Some("EHCI Host Controller")).value, "USB 2.0");
        assert_eq!(classify_usb_version(Some("Generic Controller")).value, "USB 2.0+");
        assert_eq!(
            highest_usb_version(["USB 2.0", "USB 3.1", "USB 2.0+"]),
            Some("USB 3.1".to_string())
        );
        assert_eq!(highest_usb_version(Vec::<&str>::new()), None);
    }
}
