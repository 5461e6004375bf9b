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

use thiserror::Error;

/// Domain-level errors that don't expose infrastructure details
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Inventory collection failed
    #[error("Inventory collection failed: {0}")]
    CollectionFailed(String),
    /// System information unavailable
    #[error("System information unavailable: {0}")]
    SystemInfoUnavailable(String),
    /// Insufficient privileges to collect information
    #[error("Insufficient privileges: {0}")]
    InsufficientPrivileges(String),
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Required system dependencies missing
    #[error("Missing required dependencies: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),
    /// Data parsing failed
    #[error("Data parsing failed: {0}")]
    ParsingFailed(String),
    /// Operation timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Errors surfaced by the inventory service to its callers.
///
/// Individual probe and dataset failures never show up here; they are contained
/// and recorded in the snapshot diagnostics instead.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// Domain operation failed
    #[error("{0}")]
    Domain(#[from] DomainError),
    /// Every dispatched probe failed or timed out
    #[error("All {attempted} probes failed; no inventory could be collected")]
    AllProbesFailed { attempted: usize },
    /// Non-recoverable internal fault
    #[error("Internal inventory fault: {0}")]
    Internal(String),
}

/// Probe-level errors for adapters (not exposed past the aggregator)
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// Command execution failed
    #[error("Command '{command}' failed{}", failure_detail(.exit_code, .stderr))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    /// Command not found
    #[error("Command not found: {0}")]
    CommandNotFound(String),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(String),
    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),
    /// The probe did not finish within its budget
    #[error("Timeout: {0}")]
    Timeout(String),
    /// The probe provider has no source for this component
    #[error("Unsupported component: {0}")]
    Unsupported(String),
}

fn failure_detail(exit_code: &Option<i32>, stderr: &str) -> String {
    let mut detail = String::new();
    if let Some(code) = exit_code {
        detail.push_str(&format!(" with exit code {}", code));
    }
    if !stderr.is_empty() {
        detail.push_str(&format!(": {}", stderr));
    }
    detail
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied(err.to_string()),
            _ => ProbeError::Io(err.to_string()),
        }
    }
}

/// Convert probe errors to domain errors (with context loss for abstraction)
impl From<ProbeError> for DomainError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::CommandFailed { command, .. } => {
                DomainError::CollectionFailed(format!("System command failed: {}", command))
            }
            ProbeError::CommandNotFound(cmd) => DomainError::MissingDependencies(vec![cmd]),
            ProbeError::PermissionDenied(_) => {
                DomainError::InsufficientPrivileges("System access denied".to_string())
            }
            ProbeError::Io(msg) => DomainError::SystemInfoUnavailable(format!("I/O error: {}", msg)),
            ProbeError::Parse(msg) => DomainError::ParsingFailed(msg),
            ProbeError::Timeout(msg) => DomainError::Timeout(msg),
            ProbeError::Unsupported(msg) => DomainError::SystemInfoUnavailable(msg),
        }
    }
}

/// Command execution errors
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// Probe-level error occurred
    #[error("{0}")]
    System(#[from] ProbeError),
    /// Command execution failed
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),
    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl From<CommandError> for ProbeError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::System(probe_err) => probe_err,
            CommandError::ExecutionFailed(msg) if msg.contains("timed out") => {
                ProbeError::Timeout(msg)
            }
            CommandError::ExecutionFailed(msg) => ProbeError::Io(msg),
            CommandError::InvalidArguments(msg) => ProbeError::Parse(msg),
        }
    }
}

/// Failures while loading one dataset domain.
///
/// These are non-fatal: the affected classifiers fall back to heuristics.
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    /// The reference file does not exist
    #[error("Dataset file not found: {0}")]
    NotFound(String),
    /// The reference file could not be read
    #[error("Failed to read dataset {path}: {reason}")]
    Io { path: String, reason: String },
    /// The reference file is not valid JSON for its schema
    #[error("Failed to parse dataset {path}: {reason}")]
    Parse { path: String, reason: String },
    /// A required top-level section is missing
    #[error("Dataset {path} has no '{section}' section")]
    MissingSection { path: String, section: String },
}

/// Errors raised while persisting or loading snapshots
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    /// Filesystem operation failed
    #[error("Storage operation failed: {0}")]
    StorageFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = ProbeError::CommandFailed {
            command: "dmidecode".to_string(),
            exit_code: Some(1),
            stderr: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command 'dmidecode' failed with exit code 1: permission denied"
        );

        let bare = ProbeError::CommandFailed {
            command: "lsblk".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(bare.to_string(), "Command 'lsblk' failed");
    }

    #[test]
    fn test_probe_error_to_domain() {
        let domain: DomainError = ProbeError::CommandNotFound("lspci".to_string()).into();
        assert!(matches!(domain, DomainError::MissingDependencies(ref deps) if deps == &["lspci"]));

        let domain: DomainError = ProbeError::Timeout("usb".to_string()).into();
        assert!(matches!(domain, DomainError::Timeout(_)));
    }

    #[test]
    fn test_command_timeout_maps_to_probe_timeout() {
        let err = CommandError::ExecutionFailed("Command 'sleep' timed out after 1s".to_string());
        assert!(matches!(ProbeError::from(err), ProbeError::Timeout(_)));
    }

    #[test]
    fn test_all_probes_failed_display() {
        let err = InventoryError::AllProbesFailed { attempted: 15 };
        assert!(err.to_string().contains("All 15 probes failed"));
    }
}
