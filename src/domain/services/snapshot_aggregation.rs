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

use crate::domain::classification::{derive_system_type, highest_usb_version, UNKNOWN};
use crate::domain::normalizers::{
    normalize_active_user, normalize_baseboard, normalize_basic_memory, normalize_chassis,
    normalize_cpu, normalize_disk, normalize_gpu, normalize_manufacturers,
    normalize_memory_module, normalize_os, normalize_partition, normalize_security,
    normalize_usb_controller, normalize_usb_device, normalize_user, normalize_uuids,
    summarize_memory, NormalizationContext,
};
use crate::domain::parsers::round_to;
use crate::domain::{
    ComponentKind, DatasetRegistry, DatasetStatus, Diagnostics, HardwareInfo, InventoryConfig,
    InventoryError, Partition, PlaceholderFilter, ProbeError, ProbeState, ProbeStatus,
    RawAttributeRecord, Snapshot, SnapshotSummary, StorageDevice, UsbDevice,
};
use crate::ports::{InventoryService, ProbeProvider};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Replacement for serials and identifiers when sensitive output is off
const MASKED: &str = "[masked]";

/// Records of every probe that succeeded, keyed by component
type ProbeRecords = BTreeMap<ComponentKind, Vec<RawAttributeRecord>>;

/// Domain service that implements snapshot aggregation
///
/// Every component probe is dispatched concurrently with its own timeout.
/// Failed or timed-out probes leave their sections at defaults; only a run
/// in which every probe fails is reported as an error.
pub struct SnapshotAggregationService {
    /// Probe collaborator (platform-specific or fixture)
    probe_provider: Arc<dyn ProbeProvider>,
    /// Reference tables, loaded once
    registry: Arc<DatasetRegistry>,
}

impl SnapshotAggregationService {
    /// Create a new aggregation service
    ///
    /// # Arguments
    /// * `probe_provider` - Source of raw component records
    /// * `registry` - Immutable reference tables shared by all classifiers
    pub fn new(probe_provider: Arc<dyn ProbeProvider>, registry: Arc<DatasetRegistry>) -> Self {
        Self {
            probe_provider,
            registry,
        }
    }

    /// Run one probe under its budget
    async fn run_probe(
        &self,
        kind: ComponentKind,
        budget: Duration,
    ) -> (ProbeStatus, Option<Vec<RawAttributeRecord>>) {
        debug!("Dispatching probe {}", kind);
        let started = Instant::now();
        let outcome = match tokio::time::timeout(budget, self.probe_provider.probe(kind)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(format!(
                "{} probe exceeded {:?}",
                kind, budget
            ))),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(records) => {
                debug!("Probe {} returned {} records in {} ms", kind, records.len(), elapsed_ms);
                let status = ProbeStatus {
                    component: kind,
                    state: ProbeState::Succeeded,
                    record_count: records.len(),
                    elapsed_ms,
                    error: None,
                };
                (status, Some(records))
            }
            Err(e) => {
                warn!("Probe {} failed, using defaults: {}", kind, e);
                let state = match e {
                    ProbeError::Timeout(_) => ProbeState::TimedOut,
                    _ => ProbeState::Failed,
                };
                let status = ProbeStatus {
                    component: kind,
                    state,
                    record_count: 0,
                    elapsed_ms,
                    error: Some(e.to_string()),
                };
                (status, None)
            }
        }
    }

    /// Fan out every probe and join before merging
    async fn dispatch(&self, config: &InventoryConfig) -> (ProbeRecords, Vec<ProbeStatus>) {
        let budget = Duration::from_secs(config.probe_timeout.max(1));
        let outcomes = join_all(
            ComponentKind::ALL
                .iter()
                .map(|kind| self.run_probe(*kind, budget)),
        )
        .await;

        let mut records = ProbeRecords::new();
        let mut statuses = Vec::with_capacity(outcomes.len());
        for (status, found) in outcomes {
            if let Some(found) = found {
                records.insert(status.component, found);
            }
            statuses.push(status);
        }
        (records, statuses)
    }

    /// Merge probe records into a snapshot
    fn assemble(
        &self,
        records: &ProbeRecords,
        probes: Vec<ProbeStatus>,
        filter: &PlaceholderFilter,
    ) -> Snapshot {
        let ctx = NormalizationContext::new(&self.registry, filter);
        let all = |kind: ComponentKind| records.get(&kind).map_or(&[][..], Vec::as_slice);
        let first = |kind: ComponentKind| all(kind).first();
        let now = Utc::now();

        let system = first(ComponentKind::ComputerSystem);
        let os_record = first(ComponentKind::OperatingSystem);

        let gpus = dedup_by_identity(
            all(ComponentKind::VideoController)
                .iter()
                .map(|r| normalize_gpu(&ctx, r))
                .collect::<Vec<_>>(),
            |gpu| gpu.device_id.clone(),
        );

        let storage = attach_partitions(
            dedup_by_identity(
                all(ComponentKind::DiskDrive)
                    .iter()
                    .map(|r| normalize_disk(&ctx, r))
                    .collect::<Vec<_>>(),
                disk_identity,
            ),
            all(ComponentKind::DiskPartition)
                .iter()
                .map(|r| normalize_partition(&ctx, r))
                .collect(),
        );

        let modules = all(ComponentKind::PhysicalMemory)
            .iter()
            .map(|r| normalize_memory_module(&ctx, r))
            .collect();
        let memory = summarize_memory(
            &ctx,
            modules,
            all(ComponentKind::PhysicalMemoryArray),
            system,
        );

        let controllers: Vec<UsbDevice> = all(ComponentKind::UsbController)
            .iter()
            .map(|r| normalize_usb_controller(&ctx, r))
            .collect();
        let usb_version = highest_usb_version(
            controllers.iter().filter_map(|c| c.version.as_deref()),
        );
        let usb_devices = dedup_by_identity(
            all(ComponentKind::UsbDevice)
                .iter()
                .map(|r| normalize_usb_device(&ctx, r))
                .chain(controllers)
                .collect::<Vec<_>>(),
            |device| device.device_id.clone(),
        );

        let baseboard_record = first(ComponentKind::Baseboard);
        let chassis_record = first(ComponentKind::Chassis);
        let baseboard = normalize_baseboard(&ctx, baseboard_record, usb_version);
        let chassis = normalize_chassis(&ctx, chassis_record);
        let manufacturer = normalize_manufacturers(
            &ctx,
            system,
            baseboard.manufacturer.clone(),
            &chassis.manufacturer,
            &memory.memory_modules,
        );

        let hardware = HardwareInfo {
            manufacturer: manufacturer.system_manufacturer.clone(),
            model: baseboard
                .product
                .clone()
                .or_else(|| ctx.reader_opt(system).text("model")),
            system_type: derive_system_type(Some(&chassis.chassis_type_description)).value,
            memory,
            basic_memory: normalize_basic_memory(&ctx, os_record),
        };

        let users: Vec<_> = all(ComponentKind::UserAccount)
            .iter()
            .map(|r| normalize_user(&ctx, r))
            .collect();
        let active_user = first(ComponentKind::ActiveUser).map(|r| normalize_active_user(&ctx, r, &users));

        Snapshot {
            collected_at: now,
            os: normalize_os(&ctx, os_record, system, now),
            hardware,
            uuids: normalize_uuids(&ctx, system, baseboard_record, chassis_record),
            baseboard,
            chassis,
            manufacturer,
            cpu: normalize_cpu(&ctx, first(ComponentKind::Processor)),
            gpus,
            storage,
            usb_devices,
            users,
            active_user,
            security: normalize_security(&ctx, first(ComponentKind::Security)),
            diagnostics: Diagnostics {
                probes,
                datasets: self.registry.statistics(),
            },
        }
    }
}

/// Keep the first item per identity key; items without a key are always kept
fn dedup_by_identity<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> Option<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match key(item) {
            Some(identity) => seen.insert(identity.to_lowercase()),
            None => true,
        })
        .collect()
}

/// Disks are identified by device id, else serial
fn disk_identity(disk: &StorageDevice) -> Option<String> {
    disk.device_id.clone().or_else(|| disk.serial_number.clone())
}

/// Attach partitions to their parent disk.
///
/// A partition without a parent id goes to the only disk when there is
/// exactly one; otherwise unmatched partitions are dropped.
fn attach_partitions(
    mut disks: Vec<StorageDevice>,
    partitions: Vec<(Option<String>, Partition)>,
) -> Vec<StorageDevice> {
    let single = disks.len() == 1;
    for (disk_id, partition) in partitions {
        let parent = match disk_id {
            Some(id) => disks
                .iter_mut()
                .find(|d| d.device_id.as_deref().is_some_and(|own| own.eq_ignore_ascii_case(&id))),
            None if single => disks.first_mut(),
            None => None,
        };
        match parent {
            Some(disk) => disk.partitions.push(partition),
            None => debug!("Dropping partition {:?} without a parent disk", partition.drive_letter),
        }
    }
    disks
}

fn mask(value: &mut Option<String>) {
    if value.is_some() {
        *value = Some(MASKED.to_string());
    }
}

fn mask_known(value: &mut String) {
    if value != UNKNOWN {
        *value = MASKED.to_string();
    }
}

/// Replace serial numbers and hardware identifiers
fn mask_sensitive(snapshot: &mut Snapshot) {
    mask(&mut snapshot.os.serial_number);
    mask(&mut snapshot.baseboard.serial_number);
    mask_known(&mut snapshot.chassis.serial_number);
    mask_known(&mut snapshot.uuids.system_uuid);
    mask_known(&mut snapshot.uuids.baseboard_uuid);
    mask_known(&mut snapshot.uuids.chassis_uuid);
    for disk in &mut snapshot.storage {
        mask(&mut disk.serial_number);
    }
    for module in &mut snapshot.hardware.memory.memory_modules {
        mask(&mut module.serial_number);
    }
    for device in &mut snapshot.usb_devices {
        mask(&mut device.serial_number);
    }
}

/// Reduce a snapshot to its flat summary
pub fn summarize(snapshot: &Snapshot) -> SnapshotSummary {
    let unknown = || UNKNOWN.to_string();
    let memory = &snapshot.hardware.memory;
    let os = format!(
        "{} {}",
        snapshot.os.name.as_deref().unwrap_or(""),
        snapshot.os.version.as_deref().unwrap_or("")
    );

    SnapshotSummary {
        system_manufacturer: snapshot
            .manufacturer
            .system_manufacturer
            .clone()
            .unwrap_or_else(unknown),
        system_model: snapshot.hardware.model.clone().unwrap_or_else(unknown),
        system_type: snapshot.hardware.system_type.clone(),
        chassis_type: snapshot.chassis.chassis_type_description.clone(),
        operating_system: os.trim().to_string(),
        total_memory_gb: round_to(memory.installed_memory_mb.unwrap_or(0) as f64 / 1024.0, 1),
        memory_modules: memory.memory_modules.len(),
        memory_slots: format!(
            "{}/{}",
            memory.used_memory_slots,
            memory.total_memory_slots.unwrap_or(0)
        ),
        chipset_model: snapshot.baseboard.pci_slot_info.model.clone(),
        pcie_version: snapshot.baseboard.pci_slot_info.version.clone(),
        usb_version: snapshot.baseboard.usb_version.clone(),
        connected_usb_devices: snapshot.usb_devices.iter().filter(|d| d.is_connected).count(),
        system_uuid: snapshot.uuids.system_uuid.clone(),
        is_oem: snapshot.manufacturer.is_oem,
        dataset_enhanced: !snapshot.diagnostics.datasets.is_empty()
            && snapshot.diagnostics.datasets.iter().all(|d| d.loaded),
    }
}

#[async_trait]
impl InventoryService for SnapshotAggregationService {
    async fn collect_snapshot(&self, config: InventoryConfig) -> Result<Snapshot, InventoryError> {
        let filter = PlaceholderFilter::with_extra(&config.extra_placeholders);
        let (records, probes) = self.dispatch(&config).await;

        if records.is_empty() {
            return Err(InventoryError::AllProbesFailed {
                attempted: probes.len(),
            });
        }
        let failed = probes
            .iter()
            .filter(|p| p.state != ProbeState::Succeeded)
            .count();

        let mut snapshot = self.assemble(&records, probes, &filter);
        if !config.include_sensitive {
            mask_sensitive(&mut snapshot);
        }

        info!(
            "Collected snapshot: {} GPUs, {} disks, {} USB devices, {} memory modules ({} probes failed)",
            snapshot.gpus.len(),
            snapshot.storage.len(),
            snapshot.usb_devices.len(),
            snapshot.hardware.memory.memory_modules.len(),
            failed
        );
        Ok(snapshot)
    }

    async fn collect_summary(
        &self,
        config: InventoryConfig,
    ) -> Result<SnapshotSummary, InventoryError> {
        let snapshot = self.collect_snapshot(config).await?;
        Ok(summarize(&snapshot))
    }

    fn dataset_status(&self) -> Vec<DatasetStatus> {
        self.registry.statistics()
    }

    async fn validate_dependencies(&self) -> Result<Vec<String>, InventoryError> {
        self.probe_provider
            .get_missing_dependencies()
            .await
            .map_err(|e| InventoryError::Domain(e.into()))
    }

    async fn check_privileges(&self) -> Result<bool, InventoryError> {
        self.probe_provider
            .has_required_privileges()
            .await
            .map_err(|e| InventoryError::Domain(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetDomain, DatasetRegistry};
    use serde_json::json;
    use std::collections::HashMap;

    /// In-process probe fake; kinds without an entry fail
    struct FakeProbes {
        records: HashMap<ComponentKind, Vec<RawAttributeRecord>>,
        slow: Option<ComponentKind>,
    }

    impl FakeProbes {
        fn new() -> Self {
            Self {
                records: HashMap::new(),
                slow: None,
            }
        }

        fn with(mut self, kind: ComponentKind, records: Vec<RawAttributeRecord>) -> Self {
            self.records.insert(kind, records);
            self
        }
    }

    #[async_trait]
    impl ProbeProvider for FakeProbes {
        async fn probe(&self, kind: ComponentKind) -> Result<Vec<RawAttributeRecord>, ProbeError> {
            if self.slow == Some(kind) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.records
                .get(&kind)
                .cloned()
                .ok_or_else(|| ProbeError::Unsupported(kind.to_string()))
        }

        async fn has_required_privileges(&self) -> Result<bool, ProbeError> {
            Ok(true)
        }

        async fn get_missing_dependencies(&self) -> Result<Vec<String>, ProbeError> {
            Ok(vec!["dmidecode".to_string()])
        }
    }

    fn registry() -> Arc<DatasetRegistry> {
        Arc::new(DatasetRegistry::from_documents(vec![(
            DatasetDomain::Chassis,
            Ok(vec![json!({"chassisTypes": {"3": "Desktop", "10": "Notebook"}})]),
        )]))
    }

    fn usb(device_id: &str, name: &str) -> RawAttributeRecord {
        RawAttributeRecord::new()
            .with("device_id", device_id)
            .with("name", name)
            .with("is_connected", true)
    }

    #[tokio::test]
    async fn test_usb_duplicates_keep_first_seen() {
        let probes = FakeProbes::new().with(
            ComponentKind::UsbDevice,
            vec![
                usb("USB\\VID_046D&PID_085E\\1", "BRIO Webcam"),
                usb("USB\\VID_046D&PID_085E\\1", "Duplicate Entry"),
                usb("USB\\VID_0781&PID_5581\\2", "SanDisk Flash Drive"),
            ],
        );
        let service = SnapshotAggregationService::new(Arc::new(probes), registry());

        let snapshot = service
            .collect_snapshot(InventoryConfig::default())
            .await
            .unwrap();
        assert_eq!(snapshot.usb_devices.len(), 2);
        assert_eq!(snapshot.usb_devices[0].name.as_deref(), Some("BRIO Webcam"));
    }

    #[tokio::test]
    async fn test_failed_probe_leaves_default_section() {
        let chassis = RawAttributeRecord::new().with("chassis_type", 10);
        let probes = FakeProbes::new().with(ComponentKind::Chassis, vec![chassis]);
        let service = SnapshotAggregationService::new(Arc::new(probes), registry());

        let snapshot = service
            .collect_snapshot(InventoryConfig::default())
            .await
            .unwrap();
        assert!(snapshot.usb_devices.is_empty());
        assert_eq!(snapshot.hardware.system_type, "Laptop");
        assert_eq!(snapshot.cpu.architecture, "Unknown");

        let usb_status = snapshot
            .diagnostics
            .probes
            .iter()
            .find(|p| p.component == ComponentKind::UsbDevice)
            .unwrap();
        assert_eq!(usb_status.state, ProbeState::Failed);
        assert!(usb_status.error.is_some());
    }

    #[tokio::test]
    async fn test_all_probes_failing_is_an_error() {
        let service = SnapshotAggregationService::new(Arc::new(FakeProbes::new()), registry());
        let err = service
            .collect_snapshot(InventoryConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::AllProbesFailed { attempted: 15 }));
    }

    #[tokio::test]
    async fn test_slow_probe_times_out() {
        let mut probes = FakeProbes::new()
            .with(ComponentKind::Chassis, vec![RawAttributeRecord::new().with("chassis_type", 3)])
            .with(ComponentKind::Processor, vec![RawAttributeRecord::new().with("name", "CPU")]);
        probes.slow = Some(ComponentKind::Processor);
        let service = SnapshotAggregationService::new(Arc::new(probes), registry());
        let config = InventoryConfig {
            probe_timeout: 1,
            ..Default::default()
        };

        let snapshot = service.collect_snapshot(config).await.unwrap();
        let cpu_status = snapshot
            .diagnostics
            .probes
            .iter()
            .find(|p| p.component == ComponentKind::Processor)
            .unwrap();
        assert_eq!(cpu_status.state, ProbeState::TimedOut);
        assert_eq!(snapshot.cpu.name, None);
        assert_eq!(snapshot.hardware.system_type, "Desktop");
    }

    #[tokio::test]
    async fn test_partitions_attach_and_disks_dedup() {
        let disk = |id: &str, serial: &str| {
            RawAttributeRecord::new()
                .with("device_id", id)
                .with("serial_number", serial)
                .with("model", "WDC WD40EFRX")
                .with("media_type", "Fixed hard disk media")
        };
        let probes = FakeProbes::new()
            .with(
                ComponentKind::DiskDrive,
                vec![disk("/dev/sda", "WD-1"), disk("/dev/sdb", "WD-2"), disk("/dev/sda", "WD-1")],
            )
            .with(
                ComponentKind::DiskPartition,
                vec![
                    RawAttributeRecord::new()
                        .with("disk_id", "/dev/sdb")
                        .with("mount_point", "/data"),
                    RawAttributeRecord::new().with("mount_point", "/orphan"),
                ],
            );
        let service = SnapshotAggregationService::new(Arc::new(probes), registry());
        let config = InventoryConfig {
            include_sensitive: true,
            ..Default::default()
        };

        let snapshot = service.collect_snapshot(config).await.unwrap();
        assert_eq!(snapshot.storage.len(), 2);
        assert_eq!(snapshot.storage[0].drive_type, "HDD");
        assert!(snapshot.storage[0].partitions.is_empty());
        assert_eq!(snapshot.storage[1].partitions[0].drive_letter.as_deref(), Some("/data"));
        assert_eq!(snapshot.storage[1].serial_number.as_deref(), Some("WD-2"));
    }

    #[tokio::test]
    async fn test_sensitive_values_masked_by_default() {
        let probes = FakeProbes::new()
            .with(
                ComponentKind::ComputerSystem,
                vec![RawAttributeRecord::new()
                    .with("uuid", "4C4C4544-0042-3510-8052-B7C04F4E4332")
                    .with("manufacturer", "Dell Inc.")],
            )
            .with(
                ComponentKind::Chassis,
                vec![RawAttributeRecord::new().with("serial_number", "7XK2Q13")],
            );
        let service = SnapshotAggregationService::new(Arc::new(probes), registry());

        let snapshot = service
            .collect_snapshot(InventoryConfig::default())
            .await
            .unwrap();
        assert_eq!(snapshot.uuids.system_uuid, MASKED);
        assert_eq!(snapshot.chassis.serial_number, MASKED);
        assert_eq!(snapshot.uuids.baseboard_uuid, UNKNOWN);

        let summary = summarize(&snapshot);
        assert!(summary.is_oem);
        assert!(!summary.dataset_enhanced);
        assert_eq!(summary.memory_slots, "0/0");
    }

    #[tokio::test]
    async fn test_controllers_set_bus_version_and_count_as_connected() {
        let probes = FakeProbes::new()
            .with(ComponentKind::UsbDevice, vec![usb("USB\\VID_046D&PID_C52B\\3", "USB Receiver")])
            .with(
                ComponentKind::UsbController,
                vec![
                    RawAttributeRecord::new()
                        .with("device_id", "USB\\VID_1D6B&PID_0002\\0000:00:14.0")
                        .with("name", "EHCI Host Controller"),
                    RawAttributeRecord::new()
                        .with("device_id", "USB\\VID_1D6B&PID_0003\\0000:00:14.0")
                        .with("name", "xHCI Host Controller")
                        .with("version", "USB 3.1"),
                ],
            );
        let service = SnapshotAggregationService::new(Arc::new(probes), registry());

        let summary = service
            .collect_summary(InventoryConfig::default())
            .await
            .unwrap();
        assert_eq!(summary.usb_version, "USB 3.1");
        assert_eq!(summary.connected_usb_devices, 3);
        assert_eq!(
            service.validate_dependencies().await.unwrap(),
            vec!["dmidecode".to_string()]
        );
    }
}
