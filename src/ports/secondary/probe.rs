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

use crate::domain::{ComponentKind, ProbeError, RawAttributeRecord};
use async_trait::async_trait;

/// Secondary port - Probe collaborator
///
/// Each call gathers the raw attributes of one component kind. How the data
/// is obtained (sysfs, commands, captured fixtures) is up to the adapter.
/// Implementations must be safe to call concurrently for different kinds.
#[async_trait]
pub trait ProbeProvider: Send + Sync {
    /// Probe one component kind
    ///
    /// # Returns
    /// * `Ok(Vec<RawAttributeRecord>)` - Zero or more records, in discovery order
    /// * `Err(ProbeError)` - The component could not be probed at all
    async fn probe(&self, kind: ComponentKind) -> Result<Vec<RawAttributeRecord>, ProbeError>;

    /// Check if the provider can read privileged sources (e.g. SMBIOS tables)
    async fn has_required_privileges(&self) -> Result<bool, ProbeError>;

    /// Tools the provider would use but cannot find
    async fn get_missing_dependencies(&self) -> Result<Vec<String>, ProbeError>;
}
