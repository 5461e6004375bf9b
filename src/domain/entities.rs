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

use crate::domain::dataset::{DatasetStatus, PciSlot};
use crate::domain::records::ComponentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Consolidated inventory for one aggregation run (root aggregate)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Snapshot {
    /// When aggregation finished
    pub collected_at: DateTime<Utc>,
    /// Operating system section
    pub os: OsInfo,
    /// System-level hardware facts and memory
    pub hardware: HardwareInfo,
    pub baseboard: BaseboardInfo,
    pub chassis: ChassisInfo,
    pub manufacturer: ManufacturerInfo,
    pub cpu: CpuInfo,
    /// Unique by device id
    pub gpus: Vec<GpuDevice>,
    /// Unique by disk identity
    pub storage: Vec<StorageDevice>,
    /// Unique by device id; devices first, then host controllers
    pub usb_devices: Vec<UsbDevice>,
    pub users: Vec<UserAccount>,
    pub active_user: Option<ActiveUser>,
    pub uuids: UuidInfo,
    pub security: SecurityPosture,
    /// Probe outcomes and dataset load status
    pub diagnostics: Diagnostics,
}

/// Operating system information
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OsInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub build: BuildInfo,
    pub installation: InstallationInfo,
    pub registered_user: Option<String>,
    /// Placeholder-filtered organization
    pub organization: Option<String>,
    pub serial_number: Option<String>,
    pub system_directory: Option<String>,
    pub windows_directory: Option<String>,
    pub locale: Option<String>,
    pub time_zone: Option<String>,
    pub processes: ProcessInfo,
    pub is_hypervisor_present: Option<bool>,
    /// Workstation / Domain Controller / Server / Unknown
    pub product_type: String,
    pub kernel_version: Option<String>,
    pub hostname: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BuildInfo {
    pub number: Option<String>,
    pub architecture: Option<String>,
    /// "Service Pack N" or "0"
    pub service_pack: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct InstallationInfo {
    pub install_date: Option<DateTime<Utc>>,
    pub last_boot_up_time: Option<DateTime<Utc>>,
    /// Seconds since last boot
    pub uptime_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProcessInfo {
    pub number_of_processes: Option<u64>,
    pub number_of_users: Option<u64>,
}

/// System-level hardware facts
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct HardwareInfo {
    /// System manufacturer
    pub manufacturer: Option<String>,
    /// System model
    pub model: Option<String>,
    /// Laptop / Desktop / Server / ... derived from the chassis description
    pub system_type: String,
    pub memory: DetailedMemoryInfo,
    pub basic_memory: BasicMemoryInfo,
}

/// Physical memory with per-module detail
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DetailedMemoryInfo {
    pub installed_memory_mb: Option<u64>,
    pub max_memory_capacity_mb: Option<u64>,
    /// Reported slot count, or a best-effort estimate
    pub total_memory_slots: Option<u64>,
    /// Number of discovered modules
    pub used_memory_slots: u64,
    pub memory_modules: Vec<MemoryModule>,
    /// Distinct module technologies, comma-joined in discovery order
    pub memory_architecture: Option<String>,
    /// Slowest non-zero module speed in MT/s
    pub memory_speed: Option<u64>,
}

/// One installed memory module
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MemoryModule {
    pub device_locator: Option<String>,
    pub bank_label: Option<String>,
    /// Capacity in MB
    pub capacity_mb: Option<u64>,
    pub memory_type: String,
    pub form_factor: String,
    pub speed: Option<u64>,
    pub configured_speed: Option<u64>,
    /// Millivolts
    pub configured_voltage: Option<u64>,
    pub min_voltage: Option<u64>,
    pub max_voltage: Option<u64>,
    pub manufacturer: String,
    pub part_number: Option<String>,
    pub serial_number: Option<String>,
}

/// OS-visible memory counters
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BasicMemoryInfo {
    pub total_visible_memory_kb: Option<u64>,
    pub free_physical_memory_kb: Option<u64>,
    pub total_virtual_memory_kb: Option<u64>,
    pub free_virtual_memory_kb: Option<u64>,
    /// (visible - free) / visible, percent, two decimals
    pub memory_usage_percentage: Option<f64>,
}

/// Motherboard information
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BaseboardInfo {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub version: Option<String>,
    pub model: Option<String>,
    pub pci_slot_info: PciSlotInfo,
    /// Highest host controller bus version
    pub usb_version: String,
}

/// Chipset facts resolved from the baseboard product string
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PciSlotInfo {
    /// Chipset model or "Unknown"
    pub model: String,
    pub version: String,
    pub available_slots: Option<Vec<PciSlot>>,
    pub release_year: Option<i32>,
}

impl Default for PciSlotInfo {
    fn default() -> Self {
        Self {
            model: "Unknown".to_string(),
            version: crate::domain::dataset::chipset::DEFAULT_PCIE_VERSION.to_string(),
            available_slots: None,
            release_year: None,
        }
    }
}

/// System enclosure information
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ChassisInfo {
    pub manufacturer: String,
    pub serial_number: String,
    /// Dataset name or "Chassis Type N"
    pub chassis_type: String,
    pub chassis_type_description: String,
    pub chassis_type_code: Option<u64>,
    pub model: Option<String>,
    pub asset_tag: Option<String>,
    pub sku: Option<String>,
    /// `true` when the state code is 3 (Safe)
    pub bootup_state: Option<bool>,
    pub power_supply_state: Option<bool>,
    pub thermal_state: Option<bool>,
    pub number_of_power_cords: Option<u64>,
}

/// Vendor identity across components
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ManufacturerInfo {
    pub system_manufacturer: Option<String>,
    pub baseboard_manufacturer: Option<String>,
    pub chassis_manufacturer: String,
    /// Distinct module vendors, comma-joined in discovery order
    pub memory_manufacturers: String,
    pub is_oem: bool,
    pub is_custom_build: bool,
    pub system_integrator: Option<String>,
}

/// Processor information
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CpuInfo {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    /// MHz
    pub max_clock_speed: Option<u64>,
    pub current_clock_speed: Option<u64>,
    pub number_of_cores: Option<u64>,
    pub number_of_logical_processors: Option<u64>,
    pub architecture: String,
    pub family: Option<String>,
    pub model: Option<String>,
    pub stepping: Option<String>,
    pub processor_id: Option<String>,
    /// KB
    pub l2_cache_size: Option<u64>,
    pub l3_cache_size: Option<u64>,
}

/// One display adapter
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GpuDevice {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    /// Integrated / Dedicated / Unknown
    pub gpu_type: String,
    pub memory_mb: Option<u64>,
    pub memory_gb: Option<f64>,
    pub driver_version: Option<String>,
    pub driver_date: Option<DateTime<Utc>>,
    pub video_processor: Option<String>,
    pub device_id: Option<String>,
    pub status: Option<String>,
    /// "WxH"
    pub current_resolution: Option<String>,
    pub refresh_rate: Option<u64>,
}

/// One physical disk
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StorageDevice {
    pub device_id: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub interface_type: Option<String>,
    pub media_type: Option<String>,
    pub firmware_revision: Option<String>,
    /// NVMe SSD / SATA SSD / HDD / USB Drive / Unknown
    pub drive_type: String,
    pub size_bytes: Option<u64>,
    pub size_gb: Option<f64>,
    pub partitions: Vec<Partition>,
}

/// One partition or mounted volume
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Partition {
    /// Drive letter or mount point
    pub drive_letter: Option<String>,
    pub label: Option<String>,
    pub file_system: Option<String>,
    pub drive_type: Option<String>,
    pub total_size_gb: Option<f64>,
    pub free_size_gb: Option<f64>,
    /// One decimal place
    pub usage_percentage: Option<f64>,
}

/// One USB device or host controller
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UsbDevice {
    pub device_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    /// Two-digit class code
    pub device_class: String,
    pub device_class_description: String,
    /// "0xVVVV"
    pub vendor_id: Option<String>,
    pub product_id: Option<String>,
    pub version: Option<String>,
    pub serial_number: Option<String>,
    pub is_connected: bool,
    /// Host controllers are listed alongside devices
    pub is_controller: bool,
}

/// Local user account
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UserAccount {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_locked: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
    pub home_directory: Option<String>,
}

/// The user owning the current session
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ActiveUser {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub domain: Option<String>,
    pub login_time: Option<DateTime<Utc>>,
    pub session_type: Option<String>,
    pub home_directory: Option<String>,
}

/// Hardware identifiers
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UuidInfo {
    /// "Unknown" for missing or sentinel UUIDs
    pub system_uuid: String,
    /// Baseboard serial
    pub baseboard_uuid: String,
    /// Chassis serial
    pub chassis_uuid: String,
}

impl Default for UuidInfo {
    fn default() -> Self {
        Self {
            system_uuid: "Unknown".to_string(),
            baseboard_uuid: "Unknown".to_string(),
            chassis_uuid: "Unknown".to_string(),
        }
    }
}

/// Host protection settings
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SecurityPosture {
    pub firewall_enabled: Option<bool>,
    pub antivirus_enabled: Option<bool>,
    pub disk_encryption_enabled: Option<bool>,
    /// UAC on Windows, sudo/polkit elsewhere
    pub privilege_elevation_enabled: Option<bool>,
    pub security_center: Option<String>,
}

/// How one probe ended
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Succeeded,
    Failed,
    TimedOut,
}

/// Outcome of one probe dispatch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProbeStatus {
    pub component: ComponentKind,
    pub state: ProbeState,
    /// Records returned before deduplication
    pub record_count: usize,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

/// Collection diagnostics
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub probes: Vec<ProbeStatus>,
    pub datasets: Vec<DatasetStatus>,
}

/// Flat overview derived from a [`Snapshot`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub system_manufacturer: String,
    pub system_model: String,
    pub system_type: String,
    pub chassis_type: String,
    /// "name version"
    pub operating_system: String,
    /// Installed memory in GB, one decimal
    pub total_memory_gb: f64,
    pub memory_modules: usize,
    /// "used/total"
    pub memory_slots: String,
    pub chipset_model: String,
    pub pcie_version: String,
    pub usb_version: String,
    pub connected_usb_devices: usize,
    pub system_uuid: String,
    pub is_oem: bool,
    /// Every dataset domain loaded
    pub dataset_enhanced: bool,
}

/// Configuration for snapshot collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Per-probe budget in seconds
    pub probe_timeout: u64,
    /// Skip privilege escalation
    pub skip_sudo: bool,
    /// Include serials and UUIDs; masked otherwise
    pub include_sensitive: bool,
    /// Additional placeholder sentinels
    pub extra_placeholders: Vec<String>,
    /// Enable verbose output
    pub verbose: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            probe_timeout: 10,
            skip_sudo: false,
            include_sensitive: false,
            extra_placeholders: Vec::new(),
            verbose: false,
        }
    }
}
