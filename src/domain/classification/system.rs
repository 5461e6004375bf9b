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

use super::{Category, ClassifiedAttribute, SourceTier, UNKNOWN};

/// System vendors that ship complete machines
const OEM_VENDORS: &[&str] = &[
    "dell", "hp", "lenovo", "asus", "acer", "msi", "sony", "toshiba", "samsung", "apple",
];

/// Whether the system manufacturer is a known OEM
pub fn is_oem_manufacturer(system_manufacturer: Option<&str>) -> bool {
    system_manufacturer
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .is_some_and(|m| OEM_VENDORS.iter().any(|oem| m.contains(oem)))
}

/// OS product type code: 1 Workstation, 2 Domain Controller, 3 Server
pub fn classify_os_product_type(code: Option<u64>) -> ClassifiedAttribute {
    let name = match code {
        Some(1) => "Workstation",
        Some(2) => "Domain Controller",
        Some(3) => "Server",
        _ => return ClassifiedAttribute::fallback(Category::OsProductType, UNKNOWN),
    };
    ClassifiedAttribute::new(Category::OsProductType, name, SourceTier::Heuristic)
}

/// "Service Pack M[.m]" when a major version is reported, otherwise "0"
pub fn service_pack_label(major: Option<u64>, minor: Option<u64>) -> String {
    match (major, minor) {
        (Some(major), Some(minor)) if major > 0 && minor > 0 => {
            format!("Service Pack {}.{}", major, minor)
        }
        (Some(major), _) if major > 0 => format!("Service Pack {}", major),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oem_detection() {
        assert!(is_oem_manufacturer(Some("Dell Inc.")));
        assert!(is_oem_manufacturer(Some("LENOVO")));
        assert!(!is_oem_manufacturer(Some("Gigabyte Technology Co., Ltd.")));
        assert!(!is_oem_manufacturer(None));
        assert!(!is_oem_manufacturer(Some("  ")));
    }

    #[test]
    fn test_product_type() {
        assert_eq!(classify_os_product_type(Some(1)).value, "Workstation");
        assert_eq!(classify_os_product_type(Some(3)).value, "Server");
        assert_eq!(classify_os_product_type(Some(0)).value, UNKNOWN);
        assert_eq!(classify_os_product_type(None).value, UNKNOWN);
    }

    #[test]
    fn test_service_pack_label() {
        assert_eq!(service_pack_label(Some(2), Some(0)), "Service Pack 2");
        assert_eq!(service_pack_label(Some(1), Some(1)), "Service Pack 1.1");
        assert_eq!(service_pack_label(Some(0), Some(3)), "0");
        assert_eq!(service_pack_label(None, None), "0");
    }
}
