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

//! Configuration provider reading a TOML file

use crate::domain::{DomainError, InventoryConfig};
use crate::ports::{ConfigurationProvider, OutputFormat};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

/// On-disk layout of the configuration file
///
/// ```toml
/// format = "toml"
/// dataset_dir = "/usr/share/hardware-inventory/dataset"
///
/// [inventory]
/// probe_timeout = 5
/// skip_sudo = true
/// extra_placeholders = ["Base Board Serial Number"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    format: OutputFormat,
    dataset_dir: Option<String>,
    inventory: InventoryConfig,
}

/// Configuration loaded once from a TOML document
pub struct TomlConfigurationProvider {
    file: ConfigFile,
}

impl TomlConfigurationProvider {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, DomainError> {
        let file = toml::from_str(contents)
            .map_err(|e| DomainError::InvalidConfiguration(format!("invalid config file: {}", e)))?;
        Ok(Self { file })
    }

    /// Read and parse a configuration file
    pub async fn from_file(path: &Path) -> Result<Self, DomainError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::InvalidConfiguration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }
}

#[async_trait]
impl ConfigurationProvider for TomlConfigurationProvider {
    async fn get_inventory_config(&self) -> Result<InventoryConfig, DomainError> {
        Ok(self.file.inventory.clone())
    }

    async fn get_output_format(&self) -> Result<OutputFormat, DomainError> {
        Ok(self.file.format)
    }

    async fn get_dataset_dir(&self) -> Result<Option<String>, DomainError> {
        Ok(self.file.dataset_dir.clone())
    }
}
