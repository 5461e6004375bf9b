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

//! File-based snapshot repository

use crate::domain::{RepositoryError, Snapshot};
use crate::ports::{OutputFormat, SnapshotRepository};
use async_trait::async_trait;
use log::debug;
use std::path::Path;
use tokio::fs;

/// Stores snapshots as JSON or TOML files on the local filesystem
pub struct FileSnapshotRepository;

impl FileSnapshotRepository {
    /// Create a new file snapshot repository
    pub fn new() -> Self {
        Self
    }

    /// Save in the given format
    pub async fn save(
        &self,
        snapshot: &Snapshot,
        path: &Path,
        format: OutputFormat,
    ) -> Result<(), RepositoryError> {
        match format {
            OutputFormat::Json => self.save_json(snapshot, path).await,
            OutputFormat::Toml => self.save_toml(snapshot, path).await,
        }
    }

    async fn write(&self, path: &Path, contents: String) -> Result<(), RepositoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                RepositoryError::StorageFailed(format!("Failed to create directory: {}", e))
            })?;
        }

        fs::write(path, contents).await.map_err(|e| {
            RepositoryError::StorageFailed(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<String, RepositoryError> {
        fs::read_to_string(path).await.map_err(|e| {
            RepositoryError::StorageFailed(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

impl Default for FileSnapshotRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn save_json(&self, snapshot: &Snapshot, path: &Path) -> Result<(), RepositoryError> {
        let json_string = serde_json::to_string_pretty(snapshot).map_err(|e| {
            RepositoryError::SerializationFailed(format!("JSON serialization failed: {}", e))
        })?;
        self.write(path, json_string).await
    }

    async fn save_toml(&self, snapshot: &Snapshot, path: &Path) -> Result<(), RepositoryError> {
        let toml_string = toml::to_string_pretty(snapshot).map_err(|e| {
            RepositoryError::SerializationFailed(format!("TOML serialization failed: {}", e))
        })?;
        self.write(path, toml_string).await
    }

    async fn load_json(&self, path: &Path) -> Result<Snapshot, RepositoryError> {
        let json_string = self.read(path).await?;
        serde_json::from_str(&json_string).map_err(|e| {
            RepositoryError::SerializationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    async fn load_toml(&self, path: &Path) -> Result<Snapshot, RepositoryError> {
        let toml_string = self.read(path).await?;
        toml::from_str(&toml_string).map_err(|e| {
            RepositoryError::SerializationFailed(format!("TOML deserialization failed: {}", e))
        })
    }

    async fn file_exists(&self, path: &Path) -> Result<bool, RepositoryError> {
        Ok(fs::try_exists(path).await.unwrap_or(false))
    }
}
