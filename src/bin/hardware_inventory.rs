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

use clap::Parser;
use hardware_inventory::domain::{InventoryConfig, Snapshot, SnapshotSummary};
use hardware_inventory::domain::services::summarize;
use hardware_inventory::{
    ConfigurationProvider, ContainerConfigBuilder, InventoryService, OutputFormat,
    ServiceContainer, SnapshotRepository, TomlConfigurationProvider,
};
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;

/// Collect a consolidated hardware and software inventory snapshot
#[derive(Debug, Parser)]
#[command(name = "hardware_inventory", version, about)]
struct Cli {
    /// Directory holding the reference dataset JSON files
    #[arg(long, env = "HARDWARE_INVENTORY_DATASET_DIR")]
    dataset_dir: Option<PathBuf>,

    /// Replay captured probe output instead of probing this host
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "HARDWARE_INVENTORY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json or toml)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Write the result to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Emit the flat summary instead of the full snapshot
    #[arg(long)]
    summary: bool,

    /// Per-probe timeout in seconds
    #[arg(long)]
    probe_timeout: Option<u64>,

    /// Never escalate privileged commands through sudo
    #[arg(long)]
    skip_sudo: bool,

    /// Include serial numbers and UUIDs in the output
    #[arg(long)]
    include_sensitive: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

/// Settings after merging the config file with command line flags
struct Settings {
    inventory: InventoryConfig,
    format: OutputFormat,
    dataset_dir: PathBuf,
}

async fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn Error>> {
    let (mut inventory, file_format, file_dataset_dir) = match &cli.config {
        Some(path) => {
            let provider = TomlConfigurationProvider::from_file(path).await?;
            (
                provider.get_inventory_config().await?,
                Some(provider.get_output_format().await?),
                provider.get_dataset_dir().await?,
            )
        }
        None => (InventoryConfig::default(), None, None),
    };

    // Command line flags win over the file
    if let Some(timeout) = cli.probe_timeout {
        inventory.probe_timeout = timeout;
    }
    inventory.skip_sudo |= cli.skip_sudo;
    inventory.include_sensitive |= cli.include_sensitive;
    inventory.verbose |= cli.verbose;

    let dataset_dir = cli
        .dataset_dir
        .clone()
        .or_else(|| file_dataset_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./dataset"));

    Ok(Settings {
        inventory,
        format: cli.format.or(file_format).unwrap_or_default(),
        dataset_dir,
    })
}

fn render<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<String, Box<dyn Error>> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Toml => toml::to_string_pretty(value)?,
    })
}

fn print_console_summary(summary: &SnapshotSummary) {
    println!("System Summary:");
    println!("==============");
    println!(
        "System: {} {} ({})",
        summary.system_manufacturer, summary.system_model, summary.system_type
    );
    println!("Chassis: {}", summary.chassis_type);
    println!("OS: {}", summary.operating_system);
    println!(
        "Memory: {:.1} GB in {} modules (slots {})",
        summary.total_memory_gb, summary.memory_modules, summary.memory_slots
    );
    println!("Chipset: {} ({})", summary.chipset_model, summary.pcie_version);
    println!(
        "USB: {} ({} connected)",
        summary.usb_version, summary.connected_usb_devices
    );
    println!("System UUID: {}", summary.system_uuid);
    println!(
        "OEM: {}  Dataset enhanced: {}",
        summary.is_oem, summary.dataset_enhanced
    );
}

fn report_probe_failures(snapshot: &Snapshot) {
    for status in snapshot
        .diagnostics
        .probes
        .iter()
        .filter(|status| status.error.is_some())
    {
        warn!(
            "{} probe {:?}: {}",
            status.component,
            status.state,
            status.error.as_deref().unwrap_or_default()
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = resolve_settings(&cli).await?;

    let container = ServiceContainer::new(
        ContainerConfigBuilder::new()
            .verbose(settings.inventory.verbose)
            .skip_sudo(settings.inventory.skip_sudo)
            .dataset_dir(&settings.dataset_dir)
            .fixture_path(cli.fixture.clone())
            .build(),
    );
    info!("Collecting inventory on {}", container.get_platform_name());

    let service = container.create_inventory_service().await?;

    let missing = service.validate_dependencies().await?;
    if !missing.is_empty() {
        warn!("Missing tools, some sections will be empty: {}", missing.join(", "));
    }
    if !settings.inventory.skip_sudo && !service.check_privileges().await? {
        warn!("Running without elevated privileges; memory and chassis details may be incomplete");
    }

    let snapshot = service.collect_snapshot(settings.inventory.clone()).await?;
    report_probe_failures(&snapshot);
    let summary = summarize(&snapshot);

    match (&cli.output, cli.summary) {
        (Some(path), false) => {
            let repository = container.create_snapshot_repository();
            match settings.format {
                OutputFormat::Json => repository.save_json(&snapshot, path).await?,
                OutputFormat::Toml => repository.save_toml(&snapshot, path).await?,
            }
            print_console_summary(&summary);
            println!("\nSnapshot written to {}", path.display());
        }
        (Some(path), true) => {
            tokio::fs::write(path, render(&summary, settings.format)?).await?;
            println!("Summary written to {}", path.display());
        }
        (None, true) => println!("{}", render(&summary, settings.format)?),
        (None, false) => println!("{}", render(&snapshot, settings.format)?),
    }

    Ok(())
}
