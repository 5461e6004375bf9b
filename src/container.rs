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

//! Dependency injection container for inventory services

use crate::adapters::{
    FileSnapshotRepository, FixtureProbeProvider, JsonFileDatasetSource, LinuxProbeProvider,
    UnixCommandExecutor,
};
use crate::domain::{DatasetRegistry, DomainError, InventoryConfig, SnapshotAggregationService};
use crate::ports::{
    CommandExecutor, ConfigurationProvider, DatasetSource, InventoryService, OutputFormat,
    ProbeProvider, SnapshotRepository,
};
use log::debug;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the dependency injection container
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Command execution timeout
    pub command_timeout: Duration,
    /// Command retry count
    pub retry_count: u32,
    /// Enable verbose logging
    pub verbose: bool,
    /// Never escalate privileged commands through sudo
    pub skip_sudo: bool,
    /// Directory holding the reference dataset files
    pub dataset_dir: PathBuf,
    /// Replay captured probe output instead of probing the host
    pub fixture_path: Option<PathBuf>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            retry_count: 2,
            verbose: false,
            skip_sudo: false,
            dataset_dir: PathBuf::from("./dataset"),
            fixture_path: None,
        }
    }
}

/// Simple configuration provider implementation
pub struct SimpleConfigurationProvider {
    config: InventoryConfig,
    format: OutputFormat,
    dataset_dir: Option<String>,
}

impl SimpleConfigurationProvider {
    pub fn new(config: InventoryConfig) -> Self {
        Self {
            config,
            format: OutputFormat::default(),
            dataset_dir: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_dataset_dir(mut self, dir: impl Into<String>) -> Self {
        self.dataset_dir = Some(dir.into());
        self
    }
}

#[async_trait::async_trait]
impl ConfigurationProvider for SimpleConfigurationProvider {
    async fn get_inventory_config(&self) -> Result<InventoryConfig, DomainError> {
        Ok(self.config.clone())
    }

    async fn get_output_format(&self) -> Result<OutputFormat, DomainError> {
        Ok(self.format)
    }

    async fn get_dataset_dir(&self) -> Result<Option<String>, DomainError> {
        Ok(self.dataset_dir.clone())
    }
}

/// Dependency injection container
pub struct ServiceContainer {
    config: ContainerConfig,
}

impl ServiceContainer {
    /// Create a new service container with configuration
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Create the command executor
    pub fn create_command_executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::new(UnixCommandExecutor::new(
            self.config.command_timeout,
            self.config.retry_count,
            self.config.skip_sudo,
        ))
    }

    /// Create the probe provider: the fixture when configured, else the
    /// platform-specific provider
    pub async fn create_probe_provider(&self) -> Result<Arc<dyn ProbeProvider>, Box<dyn Error>> {
        if let Some(path) = &self.config.fixture_path {
            debug!("Replaying probe fixture {}", path.display());
            return Ok(Arc::new(FixtureProbeProvider::from_file(path).await?));
        }

        if cfg!(target_os = "linux") {
            Ok(Arc::new(LinuxProbeProvider::new(self.create_command_executor())))
        } else {
            Err("Unsupported operating system; use a probe fixture".into())
        }
    }

    /// Create the dataset source for the configured directory
    pub fn create_dataset_source(&self) -> Arc<dyn DatasetSource> {
        Arc::new(JsonFileDatasetSource::new(&self.config.dataset_dir))
    }

    /// Load every dataset domain once; failures degrade to heuristics
    pub async fn load_dataset_registry(&self) -> Arc<DatasetRegistry> {
        let source = self.create_dataset_source();
        debug!("Loading datasets from {}", source.location());
        Arc::new(DatasetRegistry::load(source.as_ref()).await)
    }

    /// Create the configuration provider
    pub fn create_configuration_provider(
        &self,
        inventory_config: InventoryConfig,
    ) -> Arc<dyn ConfigurationProvider> {
        Arc::new(
            SimpleConfigurationProvider::new(inventory_config)
                .with_dataset_dir(self.config.dataset_dir.display().to_string()),
        )
    }

    /// Create the snapshot repository
    pub fn create_snapshot_repository(&self) -> Arc<dyn SnapshotRepository> {
        Arc::new(FileSnapshotRepository::new())
    }

    /// Create the complete inventory service
    pub async fn create_inventory_service(
        &self,
    ) -> Result<Arc<dyn InventoryService>, Box<dyn Error>> {
        let probe_provider = self.create_probe_provider().await?;
        let registry = self.load_dataset_registry().await;

        Ok(Arc::new(SnapshotAggregationService::new(probe_provider, registry)))
    }

    /// Get platform name for logging
    pub fn get_platform_name(&self) -> &'static str {
        if self.config.fixture_path.is_some() {
            "Fixture"
        } else if cfg!(target_os = "linux") {
            "Linux"
        } else {
            "Unknown"
        }
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

/// Builder pattern for container configuration
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
        }
    }

    /// Set command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set retry count
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    /// Enable verbose logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Run privileged commands without sudo
    pub fn skip_sudo(mut self, skip: bool) -> Self {
        self.config.skip_sudo = skip;
        self
    }

    /// Set the dataset directory
    pub fn dataset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dataset_dir = dir.into();
        self
    }

    /// Replay a probe fixture file
    pub fn fixture_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.fixture_path = path;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_builder() {
        let config = ContainerConfigBuilder::new()
            .command_timeout(Duration::from_secs(60))
            .retry_count(3)
            .verbose(true)
            .dataset_dir("/opt/dataset")
            .build();

        assert_eq!(config.command_timeout, Duration::from_secs(60));
        assert_eq!(config.retry_count, 3);
        assert!(config.verbose);
        assert!(!config.skip_sudo);
        assert_eq!(config.dataset_dir, PathBuf::from("/opt/dataset"));
        assert!(config.fixture_path.is_none());
    }

    #[test]
    fn test_defaults() {
        let container = ServiceContainer::default();
        assert_eq!(container.config().command_timeout, Duration::from_secs(30));
        assert_eq!(container.config().retry_count, 2);
        assert_eq!(container.config().dataset_dir, PathBuf::from("./dataset"));
    }

    #[tokio::test]
    async fn test_missing_dataset_dir_degrades() {
        let dir = tempdir().unwrap();
        let container = ServiceContainer::new(
            ContainerConfigBuilder::new()
                .dataset_dir(dir.path().join("absent"))
                .build(),
        );

        let registry = container.load_dataset_registry().await;
        assert!(!registry.is_fully_loaded());
        assert!(registry.statistics().iter().all(|status| status.error.is_some()));
    }

    #[tokio::test]
    async fn test_fixture_provider_selected() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("probe.json");
        std::fs::write(&fixture, r#"{"Processor": [{"name": "Test CPU"}]}"#).unwrap();

        let container = ServiceContainer::new(
            ContainerConfigBuilder::new()
                .fixture_path(Some(fixture))
                .dataset_dir(dir.path())
                .build(),
        );
        assert_eq!(container.get_platform_name(), "Fixture");

        let service = container.create_inventory_service().await.unwrap();
        let snapshot = service
            .collect_snapshot(InventoryConfig::default())
            .await
            .unwrap();
        assert_eq!(snapshot.cpu.name.as_deref(), Some("Test CPU"));
    }

    #[tokio::test]
    async fn test_simple_configuration_provider() {
        let provider = SimpleConfigurationProvider::new(InventoryConfig::default())
            .with_format(OutputFormat::Toml);
        assert_eq!(provider.get_output_format().await.unwrap(), OutputFormat::Toml);
        assert_eq!(provider.get_dataset_dir().await.unwrap(), None);
    }
}
