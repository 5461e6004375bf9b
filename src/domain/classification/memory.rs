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

//! Memory technology, form factor and module vendor classifiers

use super::rules::{first_match, Field, Matcher, Rule, RuleInput};
use super::{Category, ClassifiedAttribute, SourceTier, UNKNOWN};
use crate::domain::DatasetRegistry;

/// Generation markers checked against locators and raw type names, newest first
static GENERATION_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::StartsWith(Field::Name, &["ddr5"]),
        then: "DDR5",
    },
    Rule {
        when: Matcher::StartsWith(Field::Name, &["ddr4"]),
        then: "DDR4",
    },
    Rule {
        when: Matcher::StartsWith(Field::Name, &["ddr3"]),
        then: "DDR3",
    },
    Rule {
        when: Matcher::StartsWith(Field::Name, &["ddr2"]),
        then: "DDR2",
    },
    Rule {
        when: Matcher::StartsWith(Field::Name, &["ddr"]),
        then: "DDR",
    },
];

/// SMBIOS 3.x memory device type codes
const BUILTIN_MEMORY_CODES: &[(u64, &str)] = &[
    (18, "DDR"),
    (19, "DDR2"),
    (20, "DDR"),
    (21, "DDR2"),
    (24, "DDR3"),
    (26, "DDR4"),
    (27, "LPDDR"),
    (28, "LPDDR2"),
    (29, "LPDDR3"),
    (30, "LPDDR4"),
    (34, "DDR5"),
    (35, "LPDDR5"),
];

fn generation_prefix(text: Option<&str>) -> Option<&'static str> {
    let input = RuleInput::new().with(Field::Name, text);
    first_match(GENERATION_RULES, &input).copied()
}

/// Classify a memory module's technology.
///
/// Order: dataset code table, dataset raw-name mapping, locator and raw-name
/// generation prefix, built-in SMBIOS codes, then "Type N" (or "Unknown"
/// when no code was reported).
pub fn classify_memory_type(
    registry: &DatasetRegistry,
    code: Option<u64>,
    raw_type: Option<&str>,
    locator: Option<&str>,
) -> ClassifiedAttribute {
    let category = Category::MemoryType;

    if let Some(name) = code
        .and_then(|c| registry.memory_type_name(c))
        .filter(|name| !name.eq_ignore_ascii_case(UNKNOWN))
    {
        return ClassifiedAttribute::new(category, name, SourceTier::DatasetExact);
    }

    if let Some((name, tier)) = raw_type.and_then(|raw| registry.map_memory_type(raw)) {
        return ClassifiedAttribute::new(category, name, tier);
    }

    if let Some(generation) = generation_prefix(locator).or_else(|| generation_prefix(raw_type)) {
        return ClassifiedAttribute::new(category, generation, SourceTier::Heuristic);
    }

    if let Some(builtin) = code.and_then(|c| {
        BUILTIN_MEMORY_CODES
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, v)| *v)
    }) {
        return ClassifiedAttribute::new(category, builtin, SourceTier::Heuristic);
    }

    match code {
        Some(c) => ClassifiedAttribute::fallback(category, format!("Type {}", c)),
        None => ClassifiedAttribute::fallback(category, UNKNOWN),
    }
}

/// Classify a module form factor from its code or its reported name
pub fn classify_form_factor(
    registry: &DatasetRegistry,
    code: Option<u64>,
    raw_name: Option<&str>,
) -> ClassifiedAttribute {
    let category = Category::MemoryFormFactor;

    if let Some(name) = code.and_then(|c| registry.form_factor_name(c)) {
        return ClassifiedAttribute::new(category, name, SourceTier::DatasetExact);
    }

    if let Some(name) = raw_name.map(str::trim).filter(|n| !n.is_empty()) {
        return ClassifiedAttribute::new(category, name, SourceTier::Heuristic);
    }

    match code {
        Some(c) => ClassifiedAttribute::fallback(category, format!("Form Factor {}", c)),
        None => ClassifiedAttribute::fallback(category, UNKNOWN),
    }
}

/// Resolve a module vendor id (JEDEC code or name) to a vendor name.
///
/// Without a dataset hit the raw value passes through; absent input is
/// "Unknown".
pub fn classify_memory_manufacturer(
    registry: &DatasetRegistry,
    raw: Option<&str>,
) -> ClassifiedAttribute {
    let category = Category::MemoryManufacturer;
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return ClassifiedAttribute::fallback(category, UNKNOWN);
    };

    match registry.manufacturer_name(raw) {
        Some((name, tier)) => ClassifiedAttribute::new(category, name, tier),
        None => ClassifiedAttribute::fallback(category, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetDomain;
    use serde_json::json;

    fn registry() -> DatasetRegistry {
        DatasetRegistry::from_documents(vec![
            (
                DatasetDomain::Memory,
                Ok(vec![json!({
                    "memoryTypes": {"0": "Unknown", "26": "DDR4", "34": "DDR5"},
                    "formFactors": {"8": "DIMM", "12": "SODIMM"},
                    "memoryTypeMappings": {"DDR4 SDRAM": "DDR4"}
                })]),
            ),
            (
                DatasetDomain::Manufacturers,
                Ok(vec![json!({"manufacturers": {"80CE": "Samsung", "Kingston": "Kingston"}})]),
            ),
        ])
    }

    #[test]
    fn test_dataset_code_wins() {
        let attr = classify_memory_type(&registry(), Some(26), None, Some("DDR5_A1"));
        assert_eq!(attr.value, "DDR4");
        assert_eq!(attr.tier, SourceTier::DatasetExact);
    }

    #[test]
    fn test_unknown_dataset_entry_falls_through_to_locator() {
        let attr = classify_memory_type(&registry(), Some(0), None, Some("ddr5 dimm b2"));
        assert_eq!(attr.value, "DDR5");
        assert_eq!(attr.tier, SourceTier::Heuristic);
    }

    #[test]
    fn test_raw_name_mapping() {
        let attr = classify_memory_type(&registry(), None, Some("DDR4 SDRAM"), None);
        assert_eq!(attr.value, "DDR4");
        assert_eq!(attr.tier, SourceTier::DatasetExact);
    }

    #[test]
    fn test_heuristic_only_without_dataset() {
        let empty = DatasetRegistry::empty();
        assert_eq!(classify_memory_type(&empty, Some(34), None, None).value, "DDR5");
        assert_eq!(classify_memory_type(&empty, None, Some("DDR3"), Some("ChannelA")).value, "DDR3");
        assert_eq!(classify_memory_type(&empty, Some(99), None, None).value, "Type 99");
        assert_eq!(classify_memory_type(&empty, None, None, None).value, UNKNOWN);
    }

    #[test]
    fn test_form_factor() {
        let registry = registry();
        assert_eq!(classify_form_factor(&registry, Some(12), None).value, "SODIMM");
        assert_eq!(classify_form_factor(&registry, None, Some("DIMM")).value, "DIMM");
        assert_eq!(classify_form_factor(&registry, Some(3), None).value, "Form Factor 3");
    }

    #[test]
    fn test_memory_manufacturer() {
        let registry = registry();
        assert_eq!(classify_memory_manufacturer(&registry, Some("80CE")).value, "Samsung");
        assert_eq!(
            classify_memory_manufacturer(&registry, Some("Unbranded Co")).value,
            "Unbranded Co"
        );
        assert_eq!(classify_memory_manufacturer(&registry, None).value, UNKNOWN);
    }
}
