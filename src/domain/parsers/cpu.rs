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

//! Processor parsing functions

use super::common::{extract_dmidecode_value, parse_key_value, parse_leading_number, parse_size_to_bytes};
use crate::domain::RawAttributeRecord;

/// Parse a cache size as printed by lscpu ("32 MiB (1 instance)", "256K") into KB
fn parse_cache_kb(value: &str) -> Option<u64> {
    parse_size_to_bytes(value).ok().map(|bytes| bytes / 1024)
}

/// Parse a Processor record from Linux lscpu output
///
/// # Arguments
/// * `lscpu_output` - Raw output from lscpu command
///
/// # Returns
/// * `Ok(RawAttributeRecord)` - Processor record
/// * `Err(String)` - Output did not describe a processor
pub fn parse_lscpu_output(lscpu_output: &str) -> Result<RawAttributeRecord, String> {
    let mut record = RawAttributeRecord::new();
    let mut cores_per_socket: Option<u64> = None;
    let mut sockets: Option<u64> = None;

    for line in lscpu_output.lines() {
        let Ok((key, value)) = parse_key_value(line, ':') else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        record = match key.as_str() {
            "Model name" => record.with("name", value),
            "Vendor ID" => record.with("manufacturer", value),
            "Architecture" => record.with("architecture_name", value),
            "CPU(s)" => record.with_opt("number_of_logical_processors", value.parse::<u64>().ok()),
            "CPU max MHz" => record.with_opt("max_clock_speed", parse_leading_number(&value).map(|v| v as u64)),
            "CPU MHz" => record.with_opt("current_clock_speed", parse_leading_number(&value).map(|v| v as u64)),
            "CPU family" => record.with("family", value),
            "Model" => record.with("model", value),
            "Stepping" => record.with("stepping", value),
            "L2 cache" => record.with_opt("l2_cache_size", parse_cache_kb(&value)),
            "L3 cache" => record.with_opt("l3_cache_size", parse_cache_kb(&value)),
            "Core(s) per socket" => {
                cores_per_socket = value.parse().ok();
                record
            }
            "Socket(s)" => {
                sockets = value.parse().ok();
                record
            }
            _ => record,
        };
    }

    if !record.contains("name") && !record.contains("architecture_name") {
        return Err("lscpu output contained no processor fields".to_string());
    }

    let cores = cores_per_socket.map(|c| c * sockets.unwrap_or(1));
    Ok(record.with_opt("number_of_cores", cores))
}

/// Parse the fields of `dmidecode -t processor` that lscpu does not expose
///
/// # Arguments
/// * `dmidecode_output` - Raw output from dmidecode -t processor
pub fn parse_dmidecode_processor(dmidecode_output: &str) -> RawAttributeRecord {
    let value = |key: &str| extract_dmidecode_value(dmidecode_output, key).ok();
    let speed = |key: &str| value(key).and_then(|v| parse_leading_number(&v)).map(|v| v as u64);

    RawAttributeRecord::new()
        .with_opt("processor_id", value("ID"))
        .with_opt("name", value("Version"))
        .with_opt("manufacturer", value("Manufacturer"))
        .with_opt("max_clock_speed", speed("Max Speed"))
        .with_opt("current_clock_speed", speed("Current Speed"))
        .with_opt("number_of_cores", value("Core Count").and_then(|v| v.parse::<u64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSCPU: &str = "Architecture:            x86_64
  CPU op-mode(s):        32-bit, 64-bit
CPU(s):                  16
Vendor ID:               AuthenticAMD
  Model name:            AMD Ryzen 7 5800X 8-Core Processor
    CPU family:          25
    Model:               33
    Thread(s) per core:  2
    Core(s) per socket:  8
    Socket(s):           1
    Stepping:            0
    CPU max MHz:         4850.1948
Caches (sum of all):
  L2:                    4 MiB (8 instances)
L2 cache:                4 MiB (8 instances)
L3 cache:                32 MiB (1 instance)";

    #[test]
    fn test_parse_lscpu_output() {
        let record = parse_lscpu_output(LSCPU).unwrap();
        let text = |f: &str| record.get(f).and_then(|v| v.as_text());
        let num = |f: &str| record.get(f).and_then(|v| v.as_unsigned());

        assert_eq!(text("name").unwrap(), "AMD Ryzen 7 5800X 8-Core Processor");
        assert_eq!(text("manufacturer").unwrap(), "AuthenticAMD");
        assert_eq!(text("architecture_name").unwrap(), "x86_64");
        assert_eq!(num("number_of_logical_processors"), Some(16));
        assert_eq!(num("number_of_cores"), Some(8));
        assert_eq!(num("max_clock_speed"), Some(4850));
        assert_eq!(num("l2_cache_size"), Some(4096));
        assert_eq!(num("l3_cache_size"), Some(32768));
        assert_eq!(text("family").unwrap(), "25");
    }

    #[test]
    fn test_parse_lscpu_rejects_empty_output() {
        assert!(parse_lscpu_output("").is_err());
    }

    #[test]
    fn test_parse_dmidecode_processor() {
        let output = "Processor Information\n\tSocket Designation: AM4\n\tManufacturer: Advanced Micro Devices, Inc.\n\tID: 10 0F A2 00 FF FB 8B 17\n\tMax Speed: 4850 MHz\n\tCurrent Speed: 3800 MHz\n\tCore Count: 8\n";
        let record = parse_dmidecode_processor(output);
        assert_eq!(
            record.get("processor_id").unwrap().as_text().unwrap(),
            "10 0F A2 00 FF FB 8B 17"
        );
        assert_eq!(record.get("current_clock_speed").unwrap().as_unsigned(), Some(3800));
        assert_eq!(record.get("number_of_cores").unwrap().as_unsigned(), Some(8));
    }
}
