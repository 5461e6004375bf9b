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

use crate::domain::{DatasetStatus, InventoryConfig, InventoryError, Snapshot, SnapshotSummary};
use async_trait::async_trait;

/// Primary port - Main interface offered by the inventory domain
///
/// This is what external systems (CLI, library consumers) use to obtain
/// consolidated inventory snapshots.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Collect a complete snapshot of the current system
    ///
    /// # Arguments
    /// * `config` - Timeout, masking and placeholder options for this run
    ///
    /// # Returns
    /// * `Ok(Snapshot)` - Merged snapshot; failed probes leave default sections
    /// * `Err(InventoryError)` - Every probe failed
    async fn collect_snapshot(&self, config: InventoryConfig) -> Result<Snapshot, InventoryError>;

    /// Collect a snapshot and reduce it to the flat summary
    async fn collect_summary(
        &self,
        config: InventoryConfig,
    ) -> Result<SnapshotSummary, InventoryError>;

    /// Load status of every dataset domain
    fn dataset_status(&self) -> Vec<DatasetStatus>;

    /// Validate system dependencies and return missing requirements
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - List of missing dependencies (empty if all present)
    /// * `Err(InventoryError)` - Error occurred during validation
    async fn validate_dependencies(&self) -> Result<Vec<String>, InventoryError>;

    /// Check if the current user has sufficient privileges for full collection
    async fn check_privileges(&self) -> Result<bool, InventoryError>;
}
