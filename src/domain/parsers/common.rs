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

//! Common parsing utilities and helper functions

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    pub static ref STORAGE_SIZE_RE: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*(B|K|M|G|T)(?:I?B)?").unwrap();
    pub static ref DMIDECODE_VALUE_RE: Regex = Regex::new(r"^\s*([^:]+):\s*(.*)$").unwrap();
    pub static ref NUMBER_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
}

/// Parse a size string (e.g., "16 GB", "512 MB", "2.5TiB") to bytes
///
/// # Arguments
/// * `size_str` - Size string to parse
///
/// # Returns
/// * `Ok(u64)` - Size in bytes
/// * `Err(String)` - Parse error description
pub fn parse_size_to_bytes(size_str: &str) -> Result<u64, String> {
    let size_str = size_str.replace(' ', "").to_uppercase();
    if size_str.is_empty() {
        return Err("Empty size string".to_string());
    }

    let captures = STORAGE_SIZE_RE
        .captures(&size_str)
        .ok_or_else(|| format!("Unable to parse size: {size_str}"))?;
    let number: f64 = captures[1]
        .parse()
        .map_err(|_| format!("Invalid number in size: {}", &captures[1]))?;

    let multiplier: u64 = match &captures[2] {
        "B" => 1,
        "K" => 1024,
        "M" => 1024 * 1024,
        "G" => 1024 * 1024 * 1024,
        "T" => 1024_u64.pow(4),
        unit => return Err(format!("Unknown unit: {unit}")),
    };

    Ok((number * multiplier as f64) as u64)
}

/// First number in a string such as "3200 MT/s" or "1.2 V"
pub fn parse_leading_number(value: &str) -> Option<f64> {
    NUMBER_RE
        .captures(value)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Extract a value from dmidecode-style output
///
/// # Arguments
/// * `output` - Raw dmidecode output
/// * `key` - Key to search for (e.g., "Vendor", "Version")
///
/// # Returns
/// * `Ok(String)` - Extracted value
/// * `Err(String)` - Key not found
pub fn extract_dmidecode_value(output: &str, key: &str) -> Result<String, String> {
    output
        .lines()
        .filter_map(|line| DMIDECODE_VALUE_RE.captures(line))
        .find(|caps| caps[1].trim().eq_ignore_ascii_case(key))
        .map(|caps| caps[2].trim().to_string())
        .ok_or_else(|| format!("Key '{key}' not found in dmidecode output"))
}

/// Split dmidecode output into the key/value maps of each "Handle" block
/// whose title matches `title` (e.g., "Memory Device").
pub fn split_dmidecode_blocks(output: &str, title: &str) -> Vec<BTreeMap<String, String>> {
    let mut blocks = Vec::new();
    let mut current: Option<BTreeMap<String, String>> = None;

    for line in output.lines() {
        if line.starts_with("Handle ") {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        if line.trim() == title && !line.starts_with('\t') {
            current = Some(BTreeMap::new());
            continue;
        }
        if let Some(block) = current.as_mut() {
            // Nested list items are indented twice; only keep direct keys
            if line.starts_with("\t\t") {
                continue;
            }
            if let Ok((key, value)) = parse_key_value(line, ':') {
                block.insert(key, value);
            }
        }
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

/// Parse a key-value pair from system output
///
/// # Arguments
/// * `line` - Line to parse (e.g., "CPU Model: Intel Core i7")
/// * `separator` - Separator character (usually ':')
///
/// # Returns
/// * `Ok((String, String))` - Key-value pair
/// * `Err(String)` - Parse error
pub fn parse_key_value(line: &str, separator: char) -> Result<(String, String), String> {
    line.split_once(separator)
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("No separator '{separator}' found in line: {line}"))
}

/// Parse `KEY=value` lines, stripping optional quotes (os-release style)
pub fn parse_env_style(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| parse_key_value(line, '=').ok())
        .map(|(key, value)| (key, value.trim_matches('"').trim_matches('\'').to_string()))
        .collect()
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Bytes to GB (1024^3), two decimals
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_to(bytes as f64 / 1024_f64.powi(3), 2)
}
