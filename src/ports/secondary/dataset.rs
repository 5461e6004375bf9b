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

use crate::domain::{DatasetDomain, DatasetError};
use async_trait::async_trait;
use serde_json::Value;

/// Secondary port - Reference dataset provider
///
/// Supplies the raw JSON documents behind one dataset domain. Parsing and
/// validation happen in [`DatasetRegistry`](crate::domain::DatasetRegistry).
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch every document of `domain`, in search order
    ///
    /// # Returns
    /// * `Ok(Vec<Value>)` - At least one document
    /// * `Err(DatasetError)` - No document could be read or parsed
    async fn load(&self, domain: DatasetDomain) -> Result<Vec<Value>, DatasetError>;

    /// Human-readable location, for diagnostics
    fn location(&self) -> String;
}
