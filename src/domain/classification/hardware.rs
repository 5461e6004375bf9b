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

//! CPU architecture, GPU type and storage drive type classifiers

use super::rules::{first_match, Field, Matcher, Rule, RuleInput};
use super::{Category, ClassifiedAttribute, SourceTier, UNKNOWN};

/// Processor architecture codes reported by firmware management interfaces
const ARCHITECTURE_CODES: &[(u64, &str)] = &[
    (0, "x86"),
    (1, "MIPS"),
    (2, "Alpha"),
    (3, "PowerPC"),
    (5, "ARM"),
    (6, "Itanium"),
    (9, "x64"),
    (12, "ARM64"),
];

static ARCHITECTURE_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::Contains(Field::Name, &["x86_64", "amd64", "x64"]),
        then: "x64",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["aarch64", "arm64", "armv8"]),
        then: "ARM64",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["i386", "i486", "i586", "i686", "x86"]),
        then: "x86",
    },
    Rule {
        when: Matcher::StartsWith(Field::Name, &["arm"]),
        then: "ARM",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["ppc", "powerpc"]),
        then: "PowerPC",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["mips"]),
        then: "MIPS",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["ia64", "itanium"]),
        then: "Itanium",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["riscv"]),
        then: "RISC-V",
    },
];

/// Classify a processor architecture from its numeric code or its name.
///
/// Unknown codes fall back to "Architecture N".
pub fn classify_cpu_architecture(code: Option<u64>, name: Option<&str>) -> ClassifiedAttribute {
    if let Some(known) = code.and_then(|c| {
        ARCHITECTURE_CODES
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, v)| *v)
    }) {
        return ClassifiedAttribute::new(Category::CpuArchitecture, known, SourceTier::Heuristic);
    }

    let input = RuleInput::new().with(Field::Name, name);
    if let Some(arch) = first_match(ARCHITECTURE_RULES, &input) {
        return ClassifiedAttribute::new(Category::CpuArchitecture, *arch, SourceTier::Heuristic);
    }

    match code {
        Some(c) => ClassifiedAttribute::fallback(Category::CpuArchitecture, format!("Architecture {}", c)),
        None => ClassifiedAttribute::fallback(Category::CpuArchitecture, UNKNOWN),
    }
}

static GPU_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::AllOf(&[
            Matcher::Contains(Field::Name, &["intel"]),
            Matcher::Contains(Field::Name, &["uhd", "iris", "hd graphics"]),
        ]),
        then: "Integrated",
    },
    Rule {
        when: Matcher::AllOf(&[
            Matcher::Contains(Field::Name, &["amd"]),
            Matcher::AnyOf(&[
                Matcher::Contains(Field::Name, &["vega"]),
                Matcher::AllOf(&[
                    Matcher::Contains(Field::Name, &["radeon"]),
                    Matcher::Contains(Field::Name, &["graphics"]),
                ]),
            ]),
        ]),
        then: "Integrated",
    },
    Rule {
        when: Matcher::Contains(Field::Name, &["nvidia", "geforce", "quadro", "titan"]),
        then: "Dedicated",
    },
    Rule {
        when: Matcher::AllOf(&[
            Matcher::Contains(Field::Name, &["radeon"]),
            Matcher::Not(&Matcher::Contains(Field::Name, &["graphics"])),
        ]),
        then: "Dedicated",
    },
    Rule {
        when: Matcher::Word(Field::Manufacturer, &["nvidia", "amd", "ati"]),
        then: "Dedicated",
    },
];

/// Integrated / Dedicated / Unknown
pub fn classify_gpu_type(name: Option<&str>, manufacturer: Option<&str>) -> ClassifiedAttribute {
    let input = RuleInput::new()
        .with(Field::Name, name)
        .with(Field::Manufacturer, manufacturer);
    match first_match(GPU_RULES, &input) {
        Some(kind) => ClassifiedAttribute::new(Category::GpuType, *kind, SourceTier::Heuristic),
        None => ClassifiedAttribute::fallback(Category::GpuType, UNKNOWN),
    }
}

const SOLID_STATE: Matcher = Matcher::AnyOf(&[
    Matcher::Contains(Field::Model, &["ssd", "nvme", "solid state"]),
    Matcher::Contains(Field::Interface, &["nvme"]),
    Matcher::Contains(Field::MediaType, &["ssd", "solid state"]),
]);

static STORAGE_RULES: &[Rule<&str>] = &[
    Rule {
        when: Matcher::AllOf(&[
            SOLID_STATE,
            Matcher::AnyOf(&[
                Matcher::Contains(Field::Interface, &["nvme"]),
                Matcher::Contains(Field::Model, &["nvme"]),
            ]),
        ]),
        then: "NVMe SSD",
    },
    Rule {
        when: SOLID_STATE,
        then: "SATA SSD",
    },
    Rule {
        when: Matcher::AnyOf(&[
            Matcher::Contains(Field::MediaType, &["fixed hard disk"]),
            Matcher::Contains(Field::Model, &["hdd", "hard disk"]),
        ]),
        then: "HDD",
    },
    Rule {
        when: Matcher::Contains(Field::Interface, &["usb"]),
        then: "USB Drive",
    },
];

/// NVMe SSD / SATA SSD / HDD / USB Drive / Unknown
pub fn classify_storage_drive_type(
    model: Option<&str>,
    interface: Option<&str>,
    media_type: Option<&str>,
) -> ClassifiedAttribute {
    let input = RuleInput::new()
        .with(Field::Model, model)
        .with(Field::Interface, interface)
        .with(Field::MediaType, media_type);
    match first_match(STORAGE_RULES, &input) {
        Some(kind) => {
            ClassifiedAttribute::new(Category::StorageDriveType, *kind, SourceTier::Heuristic)
        }
        None => ClassifiedAttribute::fallback(Category::StorageDriveType, UNKNOWN),
    }
}

/// Replace trademark markers with symbols and collapse runs of whitespace.
///
/// `(C)` is only replaced when `copyright` is set; CPU brand strings never
/// carry it but GPU driver names do.
pub fn clean_device_name(name: &str, copyright: bool) -> String {
    let mut cleaned = name
        .replace("(R)", "®")
        .replace("(r)", "®")
        .replace("(TM)", "™")
        .replace("(tm)", "™");
    if copyright {
        cleaned = cleaned.replace("(C)", "©").replace("(c)", "©");
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
