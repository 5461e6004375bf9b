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

//! Hardware Inventory Library
//!
//! This library collects consolidated hardware and software inventory
//! snapshots using a Ports and Adapters (Hexagonal) architecture. Raw probe
//! records are normalized through reference datasets with heuristic
//! fallbacks, so a missing dataset or a failed probe degrades a section
//! instead of failing the run.
//!
//! # Architecture
//!
//! - **Domain**: records, entities, classification, datasets and the
//!   snapshot aggregation service
//! - **Ports**: interfaces for probing, datasets, commands, configuration
//!   and snapshot storage
//! - **Adapters**: Linux and fixture probes, JSON dataset files, file
//!   repository, TOML configuration
//!
//! # Usage
//!
//! ```rust,no_run
//! use hardware_inventory::InventoryConfig;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = hardware_inventory::create_service(None).await?;
//!
//!     let snapshot = service.collect_snapshot(InventoryConfig::default()).await?;
//!     println!("CPU: {:?}", snapshot.cpu.name);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;

pub use adapters::{
    FileSnapshotRepository, FixtureProbeProvider, JsonFileDatasetSource, LinuxProbeProvider,
    TomlConfigurationProvider, UnixCommandExecutor,
};
pub use container::{
    ContainerConfig, ContainerConfigBuilder, ServiceContainer, SimpleConfigurationProvider,
};
pub use domain::{
    DatasetRegistry, DatasetStatus, InventoryConfig, InventoryError, Snapshot, SnapshotSummary,
};
pub use ports::{
    CommandExecutor, ConfigurationProvider, DatasetSource, InventoryService, OutputFormat,
    ProbeProvider, SnapshotRepository,
};

use std::error::Error;
use std::sync::Arc;

/// Create an inventory service with default container settings
///
/// # Arguments
/// * `container_config` - Optional container configuration
///
/// # Returns
/// * Configured inventory service backed by the platform probe (or fixture)
pub async fn create_service(
    container_config: Option<ContainerConfig>,
) -> Result<Arc<dyn InventoryService>, Box<dyn Error>> {
    let container = ServiceContainer::new(container_config.unwrap_or_default());
    container.create_inventory_service().await
}

/// Validate system dependencies and privileges
///
/// # Returns
/// * `Ok((missing_deps, has_privileges))` - Missing dependencies and privilege status
/// * `Err(Box<dyn Error>)` - Error occurred during validation
///
/// # Example
///
/// ```rust,no_run
/// use hardware_inventory::validate_system;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (missing, has_privs) = validate_system().await?;
///
///     if !missing.is_empty() {
///         println!("Missing dependencies: {:?}", missing);
///     }
///
///     if !has_privs {
///         println!("Warning: Running without elevated privileges");
///     }
///
///     Ok(())
/// }
/// ```
pub async fn validate_system() -> Result<(Vec<String>, bool), Box<dyn Error>> {
    let service = create_service(None).await?;
    let missing_deps = service.validate_dependencies().await?;
    let has_privileges = service.check_privileges().await?;
    Ok((missing_deps, has_privileges))
}
