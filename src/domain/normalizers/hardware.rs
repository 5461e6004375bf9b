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

//! CPU, GPU and storage sections

use super::{bytes_to_mb, NormalizationContext};
use crate::domain::classification::{
    classify_cpu_architecture, classify_gpu_type, classify_storage_drive_type, clean_device_name,
};
use crate::domain::parsers::{bytes_to_gb, round_to};
use crate::domain::{CpuInfo, GpuDevice, Partition, RawAttributeRecord, StorageDevice};

/// Build the CPU section from the first Processor record.
///
/// Processor fields: `name`, `manufacturer`, `max_clock_speed`,
/// `current_clock_speed`, `number_of_cores`, `number_of_logical_processors`,
/// `architecture` (numeric code), `architecture_name`, `family`, `model`,
/// `stepping`, `processor_id`, `l2_cache_size`, `l3_cache_size`.
pub fn normalize_cpu(ctx: &NormalizationContext<'_>, processor: Option<&RawAttributeRecord>) -> CpuInfo {
    let r = ctx.reader_opt(processor);
    let architecture_name = r.text("architecture_name");

    CpuInfo {
        name: r.text("name").map(|name| clean_device_name(&name, false)),
        manufacturer: r.text("manufacturer"),
        max_clock_speed: r.unsigned("max_clock_speed"),
        current_clock_speed: r.unsigned("current_clock_speed"),
        number_of_cores: r.unsigned("number_of_cores"),
        number_of_logical_processors: r.unsigned("number_of_logical_processors"),
        architecture: classify_cpu_architecture(
            r.unsigned("architecture"),
            architecture_name.as_deref(),
        )
        .value,
        family: r.text("family"),
        model: r.text("model"),
        stepping: r.text("stepping"),
        processor_id: r.text("processor_id"),
        l2_cache_size: r.unsigned("l2_cache_size"),
        l3_cache_size: r.unsigned("l3_cache_size"),
    }
}

/// Build one GPU entry.
///
/// VideoController fields: `name`, `manufacturer` (or
/// `adapter_compatibility`), `adapter_ram` (bytes), `driver_version`,
/// `driver_date`, `video_processor`, `device_id`, `status`,
/// `horizontal_resolution`, `vertical_resolution`, `refresh_rate`.
pub fn normalize_gpu(ctx: &NormalizationContext<'_>, controller: &RawAttributeRecord) -> GpuDevice {
    let r = ctx.reader(controller);
    let name = r.text("name").map(|n| clean_device_name(&n, true));
    let manufacturer = r
        .text_any(&["manufacturer", "adapter_compatibility"])
        .map(|m| clean_device_name(&m, true));

    let memory_mb = r
        .unsigned("adapter_ram")
        .filter(|bytes| *bytes > 0)
        .map(bytes_to_mb);

    let current_resolution = match (
        r.unsigned("horizontal_resolution"),
        r.unsigned("vertical_resolution"),
    ) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(format!("{}x{}", w, h)),
        _ => None,
    };

    GpuDevice {
        gpu_type: classify_gpu_type(name.as_deref(), manufacturer.as_deref()).value,
        name,
        manufacturer,
        memory_mb,
        memory_gb: memory_mb.map(|mb| round_to(mb as f64 / 1024.0, 2)),
        driver_version: r.text("driver_version"),
        driver_date: r.date("driver_date"),
        video_processor: r.text("video_processor"),
        device_id: r.text("device_id"),
        status: r.text("status"),
        current_resolution,
        refresh_rate: r.unsigned("refresh_rate").filter(|hz| *hz > 0),
    }
}

/// Build one storage entry; partitions are attached by the aggregator.
///
/// DiskDrive fields: `device_id`, `model`, `manufacturer`, `serial_number`,
/// `interface_type`, `media_type`, `firmware_revision`, `size` (bytes).
pub fn normalize_disk(ctx: &NormalizationContext<'_>, disk: &RawAttributeRecord) -> StorageDevice {
    let r = ctx.reader(disk);
    let raw_model = r.text("model");
    let interface_type = r.text("interface_type");
    let media_type = r.text("media_type");
    let drive_type = classify_storage_drive_type(
        raw_model.as_deref(),
        interface_type.as_deref(),
        media_type.as_deref(),
    );
    let size_bytes = r.unsigned("size");

    StorageDevice {
        device_id: r.text("device_id"),
        model: raw_model
            .map(|m| m.replace('\\', "").trim().to_string())
            .filter(|m| !m.is_empty()),
        manufacturer: r.text("manufacturer"),
        serial_number: r.text("serial_number"),
        interface_type,
        media_type,
        firmware_revision: r.text("firmware_revision"),
        drive_type: drive_type.value,
        size_bytes,
        size_gb: size_bytes.map(bytes_to_gb),
        partitions: Vec::new(),
    }
}

/// Build one partition and return the id of the disk it belongs to.
///
/// DiskPartition fields: `disk_id`, `drive_letter` (or `mount_point`),
/// `label`, `file_system`, `drive_type`, `size`, `free_space` (bytes).
pub fn normalize_partition(
    ctx: &NormalizationContext<'_>,
    partition: &RawAttributeRecord,
) -> (Option<String>, Partition) {
    let r = ctx.reader(partition);
    let total_size_gb = r.unsigned("size").map(bytes_to_gb);
    let free_size_gb = r.unsigned("free_space").map(bytes_to_gb);
    let usage_percentage = match (total_size_gb, free_size_gb) {
        (Some(total), Some(free)) if total > 0.0 => Some(round_to((total - free) / total * 100.0, 1)),
        _ => None,
    };

    let entry = Partition {
        drive_letter: r.text_any(&["drive_letter", "mount_point"]),
        label: r.text("label"),
        file_system: r.text("file_system"),
        drive_type: r.text("drive_type"),
        total_size_gb,
        free_size_gb,
        usage_percentage,
    };
    (r.text("disk_id"), entry)
}
