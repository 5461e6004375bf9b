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

//! Storage information parsing functions

use crate::domain::RawAttributeRecord;
use serde_json::Value;

/// Columns requested from lsblk; [`parse_lsblk_json`] expects exactly these
pub const LSBLK_COLUMNS: &str =
    "NAME,SIZE,TYPE,MODEL,SERIAL,VENDOR,TRAN,ROTA,REV,FSTYPE,LABEL,MOUNTPOINT,FSSIZE,FSAVAIL,RM";

/// Disk and partition records from one lsblk run
#[derive(Debug, Default)]
pub struct BlockDeviceRecords {
    pub disks: Vec<RawAttributeRecord>,
    pub partitions: Vec<RawAttributeRecord>,
}

/// Check if device name indicates a virtual device
///
/// Virtual devices should be filtered from physical storage lists.
///
/// # Arguments
///
/// * `name` - Device name (e.g., "sda", "loop0", "dm-0")
pub fn is_virtual_device(name: &str) -> bool {
    ["loop", "ram", "dm-", "sr", "fd", "zram", "nbd"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Parse a rotational flag
///
/// # Arguments
///
/// * `content` - lsblk `rota` value, same format as `/sys/block/{dev}/queue/rotational`
pub fn parse_sysfs_rotational(content: &str) -> bool {
    content.trim() == "1"
}

fn text(device: &Value, key: &str) -> Option<String> {
    device
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Older lsblk releases print numbers and flags as strings
fn number(device: &Value, key: &str) -> Option<u64> {
    match device.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(device: &Value, key: &str) -> Option<bool> {
    match device.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(parse_sysfs_rotational(s)),
        Value::Number(n) => n.as_u64().map(|v| v == 1),
        _ => None,
    }
}

fn media_type(rotational: Option<bool>) -> Option<&'static str> {
    rotational.map(|rota| if rota { "Fixed hard disk media" } else { "SSD" })
}

/// Parse lsblk JSON output into DiskDrive and DiskPartition records
///
/// Partitions carry the `disk_id` of their parent disk.
///
/// # Arguments
///
/// * `output` - JSON output from `lsblk -J -b -o` with [`LSBLK_COLUMNS`]
pub fn parse_lsblk_json(output: &str) -> Result<BlockDeviceRecords, String> {
    let json: Value = serde_json::from_str(output)
        .map_err(|e| format!("Failed to parse lsblk JSON: {}", e))?;

    let blockdevices = json
        .get("blockdevices")
        .and_then(Value::as_array)
        .ok_or_else(|| "Missing blockdevices array in lsblk output".to_string())?;

    let mut records = BlockDeviceRecords::default();

    for device in blockdevices {
        let name = text(device, "name").unwrap_or_default();
        if name.is_empty() || is_virtual_device(&name) {
            continue;
        }
        if text(device, "type").as_deref() != Some("disk") {
            continue;
        }

        let device_id = format!("/dev/{}", name);
        let transport = text(device, "tran").map(|t| t.to_uppercase());
        let removable = flag(device, "rm").unwrap_or(false) || transport.as_deref() == Some("USB");

        records.disks.push(
            RawAttributeRecord::new()
                .with("device_id", device_id.as_str())
                .with_opt("model", text(device, "model"))
                .with_opt("manufacturer", text(device, "vendor"))
                .with_opt("serial_number", text(device, "serial"))
                .with_opt("interface_type", transport.clone())
                .with_opt("media_type", media_type(flag(device, "rota")))
                .with_opt("firmware_revision", text(device, "rev"))
                .with_opt("size", number(device, "size")),
        );

        let children = device
            .get("children")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for child in children {
            let Some(child_name) = text(child, "name") else {
                continue;
            };
            let mount_point = text(child, "mountpoint");
            records.partitions.push(
                RawAttributeRecord::new()
                    .with("disk_id", device_id.as_str())
                    .with("device_id", format!("/dev/{}", child_name))
                    .with_opt("mount_point", mount_point)
                    .with_opt("label", text(child, "label"))
                    .with_opt("file_system", text(child, "fstype"))
                    .with("drive_type", if removable { "Removable Disk" } else { "Local Disk" })
                    .with_opt("size", number(child, "fssize").or_else(|| number(child, "size")))
                    .with_opt("free_space", number(child, "fsavail")),
            );
        }
    }

    Ok(records)
}
