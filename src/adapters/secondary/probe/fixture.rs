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

//! Probe provider replaying captured probe output

use crate::domain::{ComponentKind, ProbeError, RawAttributeRecord};
use crate::ports::ProbeProvider;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One component entry of a fixture file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FixtureEntry {
    Records(Vec<RawAttributeRecord>),
    /// `{"error": "..."}` replays a failed probe
    Failure { error: String },
}

/// Replays probe output captured as JSON.
///
/// The document maps component names to record arrays:
///
/// ```json
/// {
///   "Processor": [{"name": "Intel(R) Core(TM) i7-9700K CPU @ 3.60GHz"}],
///   "PhysicalMemory": {"error": "dmidecode: permission denied"}
/// }
/// ```
///
/// Components missing from the document report no records.
#[derive(Debug, Clone, Default)]
pub struct FixtureProbeProvider {
    entries: BTreeMap<ComponentKind, FixtureEntry>,
}

impl FixtureProbeProvider {
    /// Parse a fixture document
    pub fn from_json_str(json: &str) -> Result<Self, ProbeError> {
        let entries = serde_json::from_str(json)
            .map_err(|e| ProbeError::Parse(format!("invalid probe fixture: {}", e)))?;
        Ok(Self { entries })
    }

    /// Read and parse a fixture file
    pub async fn from_file(path: &Path) -> Result<Self, ProbeError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ProbeError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Components present in the fixture
    pub fn components(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.entries.keys().copied()
    }
}

#[async_trait]
impl ProbeProvider for FixtureProbeProvider {
    async fn probe(&self, kind: ComponentKind) -> Result<Vec<RawAttributeRecord>, ProbeError> {
        match self.entries.get(&kind) {
            Some(FixtureEntry::Records(records)) => Ok(records.clone()),
            Some(FixtureEntry::Failure { error }) => Err(ProbeError::CommandFailed {
                command: format!("fixture:{}", kind),
                exit_code: None,
                stderr: error.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn has_required_privileges(&self) -> Result<bool, ProbeError> {
        Ok(true)
    }

    async fn get_missing_dependencies(&self) -> Result<Vec<String>, ProbeError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "Processor": [{"name": "Intel(R) Core(TM) i7-9700K CPU @ 3.60GHz", "number_of_cores": 8}],
        "UsbDevice": [],
        "PhysicalMemory": {"error": "dmidecode: permission denied"}
    }"#;

    #[tokio::test]
    async fn test_replays_records_and_failures() {
        let provider = FixtureProbeProvider::from_json_str(FIXTURE).unwrap();

        let cpus = provider.probe(ComponentKind::Processor).await.unwrap();
        assert_eq!(cpus[0].get("number_of_cores").unwrap().as_unsigned(), Some(8));

        let err = provider.probe(ComponentKind::PhysicalMemory).await.unwrap_err();
        assert!(err.to_string().contains("permission denied"));

        assert!(provider.probe(ComponentKind::Chassis).await.unwrap().is_empty());
        assert_eq!(provider.components().count(), 3);
    }

    #[test]
    fn test_unknown_component_is_rejected() {
        let err = FixtureProbeProvider::from_json_str(r#"{"Toaster": []}"#).unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }
}
