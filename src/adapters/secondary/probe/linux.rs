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

//! Linux probe provider

use crate::domain::parsers::{
    parse_dmi_baseboard, parse_dmi_chassis, parse_dmi_system, parse_dmidecode_chassis,
    parse_dmidecode_memory_arrays, parse_dmidecode_memory_devices, parse_dmidecode_processor,
    parse_lsblk_json, parse_lscpu_output, parse_lspci_gpu_output, parse_meminfo,
    parse_nvidia_smi_output, parse_os_release, parse_passwd, parse_shadow_locks,
    parse_sysfs_usb_entry, parse_who_output, SysfsUsbEntry, LSBLK_COLUMNS,
};
use crate::domain::{ComponentKind, ProbeError, RawAttributeRecord};
use crate::ports::{CommandExecutor, ProbeProvider, SystemCommand};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Attribute files read from each `/sys/bus/usb/devices/<port>` directory
const USB_ATTRIBUTES: &[&str] = &[
    "idVendor",
    "idProduct",
    "bDeviceClass",
    "manufacturer",
    "product",
    "serial",
    "version",
];

const FIREWALL_UNITS: &[&str] = &["ufw", "firewalld", "nftables"];
const ANTIVIRUS_UNITS: &[&str] = &["clamav-daemon", "clamd@scan", "falcon-sensor"];

/// Linux probe provider using sysfs, procfs and standard system commands
pub struct LinuxProbeProvider {
    command_executor: Arc<dyn CommandExecutor>,
    /// Filesystem root that `/sys`, `/proc` and `/etc` are resolved against
    root: PathBuf,
}

impl LinuxProbeProvider {
    /// Create a new Linux probe provider reading the live system
    pub fn new(command_executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_root(command_executor, "/")
    }

    /// Create a provider that resolves system files below `root`
    pub fn with_root(command_executor: Arc<dyn CommandExecutor>, root: impl Into<PathBuf>) -> Self {
        Self {
            command_executor,
            root: root.into(),
        }
    }

    fn path(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    /// Check if required commands are available
    pub async fn check_required_commands(&self) -> Vec<String> {
        let required_commands = ["lscpu", "dmidecode", "lsblk", "lspci", "who"];

        let mut missing = Vec::new();
        for cmd in &required_commands {
            if let Ok(false) = self.command_executor.is_command_available(cmd).await {
                missing.push(cmd.to_string());
            }
        }
        missing
    }

    async fn read_file(&self, absolute: &str) -> Result<String, ProbeError> {
        let path = self.path(absolute);
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => {
                ProbeError::PermissionDenied(path.display().to_string())
            }
            _ => ProbeError::Io(format!("{}: {}", path.display(), e)),
        })
    }

    async fn read_optional(&self, absolute: &str) -> Option<String> {
        match self.read_file(absolute).await {
            Ok(content) => Some(content),
            Err(e) => {
                trace!("{}", e);
                None
            }
        }
    }

    async fn run(&self, command: SystemCommand) -> Result<String, ProbeError> {
        let command = command.timeout(COMMAND_TIMEOUT);
        let output = if command.use_sudo {
            self.command_executor.execute_with_privileges(&command).await?
        } else {
            self.command_executor.execute(&command).await?
        };
        if !output.success {
            return Err(ProbeError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Run a command whose output only enriches a record
    async fn run_optional(&self, command: SystemCommand) -> Option<String> {
        let rendered = command.to_string();
        match self.run(command).await {
            Ok(stdout) => Some(stdout),
            Err(e) => {
                debug!("Optional source '{}' unavailable: {}", rendered, e);
                None
            }
        }
    }

    async fn blocking<T, F>(&self, task: F) -> Result<T, ProbeError>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> io::Result<T> + Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || task(root))
            .await
            .map_err(|e| ProbeError::Io(format!("blocking probe task failed: {}", e)))?
            .map_err(ProbeError::from)
    }

    async fn dmi_attributes(&self) -> Result<BTreeMap<String, String>, ProbeError> {
        self.blocking(|root| read_attribute_dir(&root.join("sys/class/dmi/id")))
            .await
    }

    async fn probe_operating_system(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let release = match self.read_file("/etc/os-release").await {
            Ok(content) => parse_os_release(&content).map_err(ProbeError::Parse)?,
            Err(_) => parse_os_release(&self.read_file("/usr/lib/os-release").await?)
                .map_err(ProbeError::Parse)?,
        };
        let meminfo = match self.read_optional("/proc/meminfo").await {
            Some(content) => parse_meminfo(&content).unwrap_or_default(),
            None => RawAttributeRecord::new(),
        };
        let time_zone = match self.read_optional("/etc/timezone").await {
            Some(tz) => Some(tz.trim().to_string()),
            None => fs::read_link(self.path("/etc/localtime"))
                .ok()
                .and_then(|target| zone_from_localtime(&target)),
        };
        let machine_id = self
            .read_optional("/etc/machine-id")
            .await
            .map(|id| id.trim().to_string());
        let host = self.blocking(|_| Ok(host_snapshot())).await?;

        let record = release
            .merged(meminfo)
            .with("os_architecture", std::env::consts::ARCH)
            .with_opt("kernel_version", host.kernel_version)
            .with_opt("hostname", host.hostname)
            .with_opt("last_boot_up_time", host.boot_time)
            .with("number_of_processes", host.processes as u64)
            .with_opt("serial_number", machine_id.filter(|id| !id.is_empty()))
            .with_opt("time_zone", time_zone)
            .with_opt("locale", std::env::var("LANG").ok());
        Ok(vec![record])
    }

    async fn probe_computer_system(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let attrs = self.dmi_attributes().await?;
        let read = |name: &str| attrs.get(name).cloned();
        let hypervisor = self
            .read_optional("/proc/cpuinfo")
            .await
            .map(|cpuinfo| cpuinfo_has_flag(&cpuinfo, "hypervisor"));
        let host = self.blocking(|_| Ok(host_snapshot())).await?;

        let record = parse_dmi_system(&read)
            .with("total_physical_memory", host.total_memory)
            .with_opt("hypervisor_present", hypervisor);
        Ok(vec![record])
    }

    async fn probe_chassis(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let attrs = self.dmi_attributes().await?;
        let read = |name: &str| attrs.get(name).cloned();
        let mut record = parse_dmi_chassis(&read);

        if let Some(output) = self
            .run_optional(SystemCommand::new("dmidecode").args(&["-t", "3"]).with_sudo())
            .await
        {
            record = record.merged(parse_dmidecode_chassis(&output));
        }
        Ok(vec![record])
    }

    async fn probe_processor(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let lscpu = self
            .run(SystemCommand::new("lscpu"))
            .await
            .and_then(|out| parse_lscpu_output(&out).map_err(ProbeError::Parse));
        let dmidecode = self
            .run_optional(SystemCommand::new("dmidecode").args(&["-t", "4"]).with_sudo())
            .await
            .map(|out| parse_dmidecode_processor(&out))
            .filter(|record| !record.is_empty());

        // lscpu wins where both report a field; dmidecode fills in the rest
        match (lscpu, dmidecode) {
            (Ok(record), Some(extra)) => Ok(vec![record.merged(extra)]),
            (Ok(record), None) => Ok(vec![record]),
            (Err(e), Some(extra)) => {
                debug!("lscpu unavailable, using dmidecode only: {}", e);
                Ok(vec![extra])
            }
            (Err(e), None) => Err(e),
        }
    }

    async fn probe_video_controllers(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let lspci = self.run(SystemCommand::new("lspci").args(&["-nn"])).await?;
        let nvidia = if let Ok(true) = self.command_executor.is_command_available("nvidia-smi").await {
            self.run_optional(SystemCommand::new("nvidia-smi").args(&[
                "--query-gpu=pci.bus_id,memory.total,driver_version",
                "--format=csv,noheader,nounits",
            ]))
            .await
            .map(|out| parse_nvidia_smi_output(&out))
            .unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(parse_lspci_gpu_output(&lspci, &nvidia))
    }

    async fn probe_block_devices(&self, kind: ComponentKind) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let output = self
            .run(SystemCommand::new("lsblk").args(&["-J", "-b", "-o", LSBLK_COLUMNS]))
            .await?;
        let devices = parse_lsblk_json(&output).map_err(ProbeError::Parse)?;
        Ok(match kind {
            ComponentKind::DiskPartition => devices.partitions,
            _ => devices.disks,
        })
    }

    async fn probe_usb(&self, kind: ComponentKind) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let entries = self
            .blocking(|root| read_usb_entries(&root.join("sys/bus/usb/devices")))
            .await?;
        Ok(entries
            .iter()
            .map(parse_sysfs_usb_entry)
            .filter(|(entry_kind, _)| *entry_kind == kind)
            .map(|(_, record)| record)
            .collect())
    }

    async fn probe_user_accounts(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let passwd = self.read_file("/etc/passwd").await?;
        // Readable by root only; lock state is left unset otherwise
        let locked = self
            .read_optional("/etc/shadow")
            .await
            .map(|shadow| parse_shadow_locks(&shadow));
        Ok(parse_passwd(&passwd, locked.as_ref()))
    }

    async fn probe_active_user(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let output = self.run(SystemCommand::new("who")).await?;
        let user = std::env::var("SUDO_USER")
            .or_else(|_| std::env::var("USER"))
            .ok();
        Ok(parse_who_output(&output, user.as_deref()).into_iter().collect())
    }

    async fn unit_active(&self, unit: &str) -> Option<bool> {
        let command = SystemCommand::new("systemctl").args(&["is-active", unit]);
        match self.command_executor.execute(&command.timeout(COMMAND_TIMEOUT)).await {
            // is-active exits non-zero for inactive units; stdout still says why
            Ok(output) => Some(output.stdout.trim() == "active"),
            Err(e) => {
                trace!("systemctl unavailable: {}", e);
                None
            }
        }
    }

    async fn any_unit_active(&self, units: &[&str]) -> Option<bool> {
        let mut answered = false;
        for unit in units {
            match self.unit_active(unit).await {
                Some(true) => return Some(true),
                Some(false) => answered = true,
                None => {}
            }
        }
        answered.then_some(false)
    }

    async fn probe_security(&self) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        let firewall = self.any_unit_active(FIREWALL_UNITS).await;
        let antivirus = self.any_unit_active(ANTIVIRUS_UNITS).await;
        let encrypted = self
            .blocking(|root| has_crypt_mapping(&root.join("sys/block")))
            .await
            .ok();
        let sudo = self.command_executor.is_command_available("sudo").await.unwrap_or(false)
            || self.path("/etc/sudoers").exists();
        let lsm = self
            .read_optional("/sys/kernel/security/lsm")
            .await
            .and_then(|lsm| security_module_label(&lsm));

        Ok(vec![RawAttributeRecord::new()
            .with_opt("firewall_enabled", firewall)
            .with_opt("antivirus_enabled", antivirus)
            .with_opt("disk_encryption_enabled", encrypted)
            .with("privilege_elevation_enabled", sudo)
            .with_opt("security_center", lsm)])
    }
}

/// Host facts gathered through sysinfo
struct HostSnapshot {
    hostname: Option<String>,
    kernel_version: Option<String>,
    boot_time: Option<chrono::DateTime<Utc>>,
    processes: usize,
    total_memory: u64,
}

fn host_snapshot() -> HostSnapshot {
    let mut sys = System::new_all();
    sys.refresh_all();
    HostSnapshot {
        hostname: System::host_name(),
        kernel_version: System::kernel_version(),
        boot_time: Utc.timestamp_opt(System::boot_time() as i64, 0).single(),
        processes: sys.processes().len(),
        total_memory: sys.total_memory(),
    }
}

/// "/usr/share/zoneinfo/Europe/Berlin" → "Europe/Berlin"
fn zone_from_localtime(target: &Path) -> Option<String> {
    let target = target.to_string_lossy();
    target
        .split_once("zoneinfo/")
        .map(|(_, zone)| zone.to_string())
        .filter(|zone| !zone.is_empty())
}

fn cpuinfo_has_flag(cpuinfo: &str, flag: &str) -> bool {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("flags"))
        .any(|line| line.split_whitespace().any(|f| f == flag))
}

/// Active LSM names in `/sys/kernel/security/lsm` → display label
fn security_module_label(lsm: &str) -> Option<String> {
    let modules: Vec<&str> = lsm.trim().split(',').collect();
    [
        ("selinux", "SELinux"),
        ("apparmor", "AppArmor"),
        ("smack", "Smack"),
        ("tomoyo", "TOMOYO"),
    ]
    .iter()
    .find(|(name, _)| modules.contains(name))
    .map(|(_, label)| label.to_string())
}

/// Read every non-empty regular file in `dir`; unreadable files are skipped
fn read_attribute_dir(dir: &Path) -> io::Result<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Ok(content) = fs::read_to_string(entry.path()) {
            let value = content.trim();
            if !value.is_empty() {
                attributes.insert(entry.file_name().to_string_lossy().to_string(), value.to_string());
            }
        }
    }
    Ok(attributes)
}

/// Collect device entries from `/sys/bus/usb/devices`
///
/// Interface directories ("1-4:1.0") are folded into their device's
/// `interface_classes`. Entries are returned sorted by port.
fn read_usb_entries(dir: &Path) -> io::Result<Vec<SysfsUsbEntry>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();

    let read = |name: &str, attribute: &str| {
        fs::read_to_string(dir.join(name).join(attribute))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let mut entries = Vec::new();
    for port in names.iter().filter(|name| !name.contains(':')) {
        let attributes: BTreeMap<String, String> = USB_ATTRIBUTES
            .iter()
            .filter_map(|attr| read(port, attr).map(|v| (attr.to_string(), v)))
            .collect();
        if !attributes.contains_key("idVendor") {
            continue;
        }
        let prefix = format!("{}:", port);
        let interface_classes = names
            .iter()
            .filter(|name| name.starts_with(&prefix))
            .filter_map(|name| read(name, "bInterfaceClass"))
            .collect();
        entries.push(SysfsUsbEntry {
            port: port.clone(),
            attributes,
            interface_classes,
        });
    }
    Ok(entries)
}

/// dm-crypt mappings carry a "CRYPT-" prefixed uuid
fn has_crypt_mapping(sys_block: &Path) -> io::Result<bool> {
    for entry in fs::read_dir(sys_block)? {
        let entry = entry?;
        let uuid = fs::read_to_string(entry.path().join("dm/uuid")).unwrap_or_default();
        if uuid.starts_with("CRYPT-") {
            return Ok(true);
        }
    }
    Ok(false)
}

#[async_trait]
impl ProbeProvider for LinuxProbeProvider {
    async fn probe(&self, kind: ComponentKind) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        match kind {
            ComponentKind::OperatingSystem => self.probe_operating_system().await,
            ComponentKind::ComputerSystem => self.probe_computer_system().await,
            ComponentKind::Baseboard => {
                let attrs = self.dmi_attributes().await?;
                let read = |name: &str| attrs.get(name).cloned();
                Ok(vec![parse_dmi_baseboard(&read)])
            }
            ComponentKind::Chassis => self.probe_chassis().await,
            ComponentKind::Processor => self.probe_processor().await,
            ComponentKind::VideoController => self.probe_video_controllers().await,
            ComponentKind::DiskDrive | ComponentKind::DiskPartition => {
                self.probe_block_devices(kind).await
            }
            ComponentKind::PhysicalMemory => {
                let output = self
                    .run(SystemCommand::new("dmidecode").args(&["-t", "17"]).with_sudo())
                    .await?;
                Ok(parse_dmidecode_memory_devices(&output))
            }
            ComponentKind::PhysicalMemoryArray => {
                let output = self
                    .run(SystemCommand::new("dmidecode").args(&["-t", "16"]).with_sudo())
                    .await?;
                Ok(parse_dmidecode_memory_arrays(&output))
            }
            ComponentKind::UsbDevice | ComponentKind::UsbController => self.probe_usb(kind).await,
            ComponentKind::UserAccount => self.probe_user_accounts().await,
            ComponentKind::ActiveUser => self.probe_active_user().await,
            ComponentKind::Security => self.probe_security().await,
        }
    }

    async fn has_required_privileges(&self) -> Result<bool, ProbeError> {
        if self.command_executor.has_elevated_privileges().await? {
            return Ok(true);
        }
        // Passwordless sudo is as good as root for dmidecode
        let check = SystemCommand::new("true").with_sudo().timeout(COMMAND_TIMEOUT);
        Ok(self
            .command_executor
            .execute_with_privileges(&check)
            .await
            .map(|output| output.success)
            .unwrap_or(false))
    }

    async fn get_missing_dependencies(&self) -> Result<Vec<String>, ProbeError> {
        Ok(self.check_required_commands().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommandError;
    use crate::ports::CommandOutput;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Returns canned stdout per program; unknown programs are "not found"
    struct CannedExecutor {
        outputs: HashMap<&'static str, &'static str>,
    }

    impl CannedExecutor {
        fn new(outputs: &[(&'static str, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                outputs: outputs.iter().copied().collect(),
            })
        }
    }

    #[async_trait]
    impl CommandExecutor for CannedExecutor {
        async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
            match self.outputs.get(command.program.as_str()) {
                Some(stdout) => Ok(CommandOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                    success: true,
                }),
                None => Err(ProbeError::CommandNotFound(command.program.clone()).into()),
            }
        }

        async fn execute_with_privileges(
            &self,
            command: &SystemCommand,
        ) -> Result<CommandOutput, CommandError> {
            self.execute(command).await
        }

        async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError> {
            Ok(self.outputs.contains_key(command_name))
        }

        async fn get_command_path(&self, command_name: &str) -> Result<Option<String>, CommandError> {
            Ok(self
                .outputs
                .contains_key(command_name)
                .then(|| format!("/usr/bin/{}", command_name)))
        }

        async fn has_elevated_privileges(&self) -> Result<bool, CommandError> {
            Ok(false)
        }
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fake_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "sys/class/dmi/id/board_vendor", "ASUSTeK COMPUTER INC.\n");
        write(root, "sys/class/dmi/id/board_name", "PRIME X570-P\n");
        write(root, "sys/class/dmi/id/board_serial", "\n");
        write(root, "sys/class/dmi/id/chassis_type", "3\n");

        write(root, "sys/bus/usb/devices/usb1/idVendor", "1d6b\n");
        write(root, "sys/bus/usb/devices/usb1/idProduct", "0002\n");
        write(root, "sys/bus/usb/devices/usb1/product", "xHCI Host Controller\n");
        write(root, "sys/bus/usb/devices/usb1/version", " 2.00\n");
        write(root, "sys/bus/usb/devices/1-4/idVendor", "046d\n");
        write(root, "sys/bus/usb/devices/1-4/idProduct", "c52b\n");
        write(root, "sys/bus/usb/devices/1-4/bDeviceClass", "00\n");
        write(root, "sys/bus/usb/devices/1-4/product", "USB Receiver\n");
        write(root, "sys/bus/usb/devices/1-4:1.0/bInterfaceClass", "03\n");

        write(
            root,
            "etc/passwd",
            "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000:Alice Example:/home/alice:/bin/bash\n",
        );
        dir
    }

    #[tokio::test]
    async fn test_baseboard_from_sysfs() {
        let root = fake_root();
        let provider = LinuxProbeProvider::with_root(CannedExecutor::new(&[]), root.path());

        let records = provider.probe(ComponentKind::Baseboard).await.unwrap();
        assert_eq!(records.len(), 1);
        let board = &records[0];
        assert_eq!(board.get("product").unwrap().as_text().unwrap(), "PRIME X570-P");
        // Empty attribute files are treated as absent
        assert!(!board.contains("serial_number"));
    }

    #[tokio::test]
    async fn test_usb_entries_split_by_kind() {
        let root = fake_root();
        let provider = LinuxProbeProvider::with_root(CannedExecutor::new(&[]), root.path());

        let controllers = provider.probe(ComponentKind::UsbController).await.unwrap();
        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].get("version").unwrap().as_text().unwrap(), "USB 2.0");

        let devices = provider.probe(ComponentKind::UsbDevice).await.unwrap();
        assert_eq!(devices.len(), 1);
        // Interface-defined device reports its first interface class
        assert_eq!(devices[0].get("class_code").unwrap().as_text().unwrap(), "03");
    }

    #[tokio::test]
    async fn test_user_accounts_without_shadow() {
        let root = fake_root();
        let provider = LinuxProbeProvider::with_root(CannedExecutor::new(&[]), root.path());

        let users = provider.probe(ComponentKind::UserAccount).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].get("name").unwrap().as_text().unwrap(), "alice");
        assert!(!users[0].contains("lockout"));
    }

    #[tokio::test]
    async fn test_processor_falls_back_when_dmidecode_missing() {
        let root = fake_root();
        let executor = CannedExecutor::new(&[(
            "lscpu",
            "Architecture: x86_64\nModel name: AMD Ryzen 7 5800X 8-Core Processor\nCPU(s): 16\n",
        )]);
        let provider = LinuxProbeProvider::with_root(executor, root.path());

        let records = provider.probe(ComponentKind::Processor).await.unwrap();
        assert_eq!(
            records[0].get("number_of_logical_processors").unwrap().as_unsigned(),
            Some(16)
        );
        assert!(!records[0].contains("processor_id"));
    }

    #[tokio::test]
    async fn test_missing_command_fails_probe() {
        let root = fake_root();
        let provider = LinuxProbeProvider::with_root(CannedExecutor::new(&[]), root.path());

        let err = provider.probe(ComponentKind::PhysicalMemory).await.unwrap_err();
        assert!(matches!(err, ProbeError::CommandNotFound(ref cmd) if cmd == "dmidecode"));

        let missing = provider.get_missing_dependencies().await.unwrap();
        assert!(missing.contains(&"lspci".to_string()));
    }

    #[test]
    fn test_security_module_label() {
        assert_eq!(
            security_module_label("lockdown,capability,yama,apparmor\n").as_deref(),
            Some("AppArmor")
        );
        assert_eq!(security_module_label("capability"), None);
    }

    #[test]
    fn test_zone_from_localtime() {
        assert_eq!(
            zone_from_localtime(Path::new("/usr/share/zoneinfo/Europe/Berlin")).as_deref(),
            Some("Europe/Berlin")
        );
        assert_eq!(zone_from_localtime(Path::new("/etc/UTC")), None);
    }
}
