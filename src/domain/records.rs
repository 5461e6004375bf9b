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

//! Raw probe output: component kinds and immutable attribute records

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Component queried by a single probe invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    OperatingSystem,
    ComputerSystem,
    Baseboard,
    Chassis,
    Processor,
    VideoController,
    DiskDrive,
    DiskPartition,
    PhysicalMemory,
    PhysicalMemoryArray,
    UsbDevice,
    UsbController,
    UserAccount,
    ActiveUser,
    Security,
}

impl ComponentKind {
    /// Every component, in dispatch order
    pub const ALL: [ComponentKind; 15] = [
        ComponentKind::OperatingSystem,
        ComponentKind::ComputerSystem,
        ComponentKind::Baseboard,
        ComponentKind::Chassis,
        ComponentKind::Processor,
        ComponentKind::VideoController,
        ComponentKind::DiskDrive,
        ComponentKind::DiskPartition,
        ComponentKind::PhysicalMemory,
        ComponentKind::PhysicalMemoryArray,
        ComponentKind::UsbDevice,
        ComponentKind::UsbController,
        ComponentKind::UserAccount,
        ComponentKind::ActiveUser,
        ComponentKind::Security,
    ];

    /// Stable name used in fixtures and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::OperatingSystem => "OperatingSystem",
            ComponentKind::ComputerSystem => "ComputerSystem",
            ComponentKind::Baseboard => "Baseboard",
            ComponentKind::Chassis => "Chassis",
            ComponentKind::Processor => "Processor",
            ComponentKind::VideoController => "VideoController",
            ComponentKind::DiskDrive => "DiskDrive",
            ComponentKind::DiskPartition => "DiskPartition",
            ComponentKind::PhysicalMemory => "PhysicalMemory",
            ComponentKind::PhysicalMemoryArray => "PhysicalMemoryArray",
            ComponentKind::UsbDevice => "UsbDevice",
            ComponentKind::UsbController => "UsbController",
            ComponentKind::UserAccount => "UserAccount",
            ComponentKind::ActiveUser => "ActiveUser",
            ComponentKind::Security => "Security",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single attribute value as delivered by a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Date(DateTime<Utc>),
    Text(String),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Render the value as text; lists are not representable and yield `None`
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Text(s) => Some(s.clone()),
            AttributeValue::Integer(i) => Some(i.to_string()),
            AttributeValue::Float(f) => Some(f.to_string()),
            AttributeValue::Boolean(b) => Some(b.to_string()),
            AttributeValue::Date(d) => Some(d.to_rfc3339()),
            AttributeValue::List(_) => None,
        }
    }

    /// Interpret the value as an unsigned integer, parsing text leniently
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            AttributeValue::Integer(i) if *i >= 0 => Some(*i as u64),
            AttributeValue::Float(f) if *f >= 0.0 && f.is_finite() => Some(*f as u64),
            AttributeValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.parse::<u64>().ok().or_else(|| {
                    trimmed
                        .strip_prefix("0x")
                        .or_else(|| trimmed.strip_prefix("0X"))
                        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
                })
            }
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Interpret the value as a boolean ("true", "yes", "1", "running", ...)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            AttributeValue::Integer(i) => Some(*i != 0),
            AttributeValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" | "enabled" | "active" | "running" => Some(true),
                "false" | "no" | "0" | "off" | "disabled" | "inactive" | "stopped" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interpret the value as a timestamp.
    ///
    /// Accepts RFC 3339, CIM datetime (`yyyymmddHHMMSS.ffffff+zzz`) and bare
    /// `yyyymmdd` / `yyyy-mm-dd` dates.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            AttributeValue::Integer(secs) => Utc.timestamp_opt(*secs, 0).single(),
            AttributeValue::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if raw.len() >= 14 && raw[..14].chars().all(|c| c.is_ascii_digit()) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw[..14], "%Y%m%d%H%M%S") {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = if raw.len() >= 8 && raw[..8].chars().all(|c| c.is_ascii_digit()) {
        NaiveDate::parse_from_str(&raw[..8], "%Y%m%d").ok()
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }?;
    date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Integer(value.min(i64::MAX as u64) as i64)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Integer(value as i64)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(value as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::Date(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        AttributeValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Opaque field-name → value mapping produced by one probe invocation.
///
/// Records are assembled with [`RawAttributeRecord::with`] and are read-only
/// afterwards; there are no mutating accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAttributeRecord {
    fields: BTreeMap<String, AttributeValue>,
}

impl RawAttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, consuming and returning the record
    pub fn with(mut self, field: &str, value: impl Into<AttributeValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Add a field only when a value is present
    pub fn with_opt<V: Into<AttributeValue>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(field, v),
            None => self,
        }
    }

    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Combine two records built from different sources; fields of `other`
    /// are only taken where `self` has none
    pub fn merged(mut self, other: RawAttributeRecord) -> Self {
        for (field, value) in other.fields {
            self.fields.entry(field).or_insert(value);
        }
        self
    }
}

impl FromIterator<(String, AttributeValue)> for RawAttributeRecord {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_untagged_deserialization() {
        let json = r#"{"name": "DIMM A1", "capacity": 17179869184, "present": true,
                       "voltage": 1.2, "types": [3, 9], "installed": "2023-04-01T10:00:00Z"}"#;
        let record: RawAttributeRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.get("name").unwrap().as_text().unwrap(), "DIMM A1");
        assert_eq!(record.get("capacity").unwrap().as_unsigned(), Some(17179869184));
        assert_eq!(record.get("present").unwrap().as_bool(), Some(true));
        assert_eq!(record.get("voltage").unwrap().as_float(), Some(1.2));
        assert!(matches!(record.get("types"), Some(AttributeValue::List(items)) if items.len() == 2));
        assert!(matches!(record.get("installed"), Some(AttributeValue::Date(_))));
    }

    #[test]
    fn test_lenient_numeric_text() {
        assert_eq!(AttributeValue::from(" 3200 ").as_unsigned(), Some(3200));
        assert_eq!(AttributeValue::from("0x1A").as_unsigned(), Some(26));
        assert_eq!(AttributeValue::from("fast").as_unsigned(), None);
        assert_eq!(AttributeValue::Integer(-4).as_unsigned(), None);
    }

    #[test]
    fn test_cim_datetime_parsing() {
        let date = AttributeValue::from("20230915000000.000000-000").as_date().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2023, 9, 15));

        let short = AttributeValue::from("20210102").as_date().unwrap();
        assert_eq!((short.year(), short.month(), short.day()), (2021, 1, 2));

        assert!(AttributeValue::from("yesterday").as_date().is_none());
    }

    #[test]
    fn test_builder_skips_absent_values() {
        let record = RawAttributeRecord::new()
            .with("name", "Intel UHD Graphics")
            .with_opt::<u64>("adapter_ram", None);
        assert_eq!(record.len(), 1);
        assert!(!record.contains("adapter_ram"));
    }

    #[test]
    fn test_merged_keeps_existing_fields() {
        let record = RawAttributeRecord::new()
            .with("name", "lscpu")
            .merged(RawAttributeRecord::new().with("name", "dmidecode").with("processor_id", "A7 06"));
        assert_eq!(record.get("name").unwrap().as_text().unwrap(), "lscpu");
        assert!(record.contains("processor_id"));
    }

    #[test]
    fn test_component_names_round_trip_through_serde() {
        for kind in ComponentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }
}
