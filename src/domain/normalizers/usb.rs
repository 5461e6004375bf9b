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

//! USB devices and host controllers

use super::NormalizationContext;
use crate::domain::classification::{classify_usb_device, classify_usb_version, extract_vid_pid};
use crate::domain::{RawAttributeRecord, UsbDevice};

const HUB_CLASS: &str = "09";

/// Build one USB device entry.
///
/// UsbDevice fields: `device_id`, `name`, `description`, `manufacturer`,
/// `class_code` (as reported), `version`, `serial_number`, `is_connected`.
pub fn normalize_usb_device(ctx: &NormalizationContext<'_>, device: &RawAttributeRecord) -> UsbDevice {
    let r = ctx.reader(device);
    let device_id = r.text("device_id");
    let name = r.text("name");
    let description = r.text("description");
    let identity = device_id.as_deref().map(extract_vid_pid).unwrap_or_default();

    let class = classify_usb_device(
        ctx.registry,
        name.as_deref(),
        description.as_deref(),
        device_id.as_deref(),
        identity.vendor_id.as_deref(),
        r.text("class_code").as_deref(),
    );

    UsbDevice {
        device_id,
        name,
        description,
        manufacturer: r.text("manufacturer"),
        device_class: class.class_code,
        device_class_description: class.description.value,
        vendor_id: identity.vendor_id,
        product_id: identity.product_id,
        version: r.text("version"),
        serial_number: r.text("serial_number"),
        is_connected: r.boolean("is_connected").unwrap_or(false),
        is_controller: false,
    }
}

/// Build one host controller entry; controllers are always hubs and always
/// connected.
///
/// UsbController fields: `device_id`, `name`, `description`, `manufacturer`,
/// `version`.
pub fn normalize_usb_controller(
    ctx: &NormalizationContext<'_>,
    controller: &RawAttributeRecord,
) -> UsbDevice {
    let r = ctx.reader(controller);
    let device_id = r.text("device_id");
    let name = r.text("name");
    let identity = device_id.as_deref().map(extract_vid_pid).unwrap_or_default();

    let hint = [name.as_deref(), r.text("version").as_deref()]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let version = classify_usb_version(Some(&hint)).value;

    UsbDevice {
        description: r.text("description").or_else(|| name.clone()),
        device_id,
        name,
        manufacturer: r.text("manufacturer"),
        device_class: HUB_CLASS.to_string(),
        device_class_description: ctx
            .registry
            .usb_class_name(HUB_CLASS)
            .unwrap_or("Hub")
            .to_string(),
        vendor_id: identity.vendor_id,
        product_id: identity.product_id,
        version: Some(version),
        serial_number: None,
        is_connected: true,
        is_controller: true,
    }
}
