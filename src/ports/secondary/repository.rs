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

use crate::domain::{RepositoryError, Snapshot};
use async_trait::async_trait;
use std::path::Path;

/// Secondary port - Snapshot persistence
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Save snapshot as JSON
    async fn save_json(&self, snapshot: &Snapshot, path: &Path) -> Result<(), RepositoryError>;

    /// Save snapshot as TOML
    async fn save_toml(&self, snapshot: &Snapshot, path: &Path) -> Result<(), RepositoryError>;

    /// Load snapshot from JSON
    async fn load_json(&self, path: &Path) -> Result<Snapshot, RepositoryError>;

    /// Load snapshot from TOML
    async fn load_toml(&self, path: &Path) -> Result<Snapshot, RepositoryError>;

    /// Check if file exists
    async fn file_exists(&self, path: &Path) -> Result<bool, RepositoryError>;
}
