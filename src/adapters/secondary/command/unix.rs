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

//! Unix command execution adapter

use crate::domain::{CommandError, ProbeError};
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use async_trait::async_trait;
use log::{debug, trace};
use std::env;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Unix-based command executor that handles privilege escalation and timeouts
pub struct UnixCommandExecutor {
    /// Default timeout for commands
    default_timeout: Duration,
    /// Number of retry attempts for spawn failures and timeouts
    retry_count: u32,
    /// Never escalate; privileged commands run as the current user
    skip_sudo: bool,
}

impl UnixCommandExecutor {
    /// Create a new Unix command executor
    ///
    /// # Arguments
    /// * `default_timeout` - Default timeout for commands
    /// * `retry_count` - Number of retry attempts
    /// * `skip_sudo` - Run privileged commands without sudo
    pub fn new(default_timeout: Duration, retry_count: u32, skip_sudo: bool) -> Self {
        Self {
            default_timeout,
            retry_count,
            skip_sudo,
        }
    }

    /// Create a Unix command executor with default settings
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(30), 2, false)
    }

    /// Execute a command with optional retry logic
    async fn execute_with_retry(
        &self,
        command: &SystemCommand,
        use_sudo: bool,
    ) -> Result<CommandOutput, CommandError> {
        let mut attempt = 0;
        loop {
            match self.execute_once(command, use_sudo).await {
                Ok(output) => return Ok(output),
                // A missing binary will not appear on retry
                Err(e @ CommandError::System(ProbeError::CommandNotFound(_))) => return Err(e),
                Err(e) if attempt >= self.retry_count => return Err(e),
                Err(e) => {
                    attempt += 1;
                    debug!("'{}' failed on attempt {}, retrying: {}", command, attempt, e);
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
            }
        }
    }

    /// Execute a command once
    async fn execute_once(
        &self,
        command: &SystemCommand,
        use_sudo: bool,
    ) -> Result<CommandOutput, CommandError> {
        let command_timeout = command.timeout.unwrap_or(self.default_timeout);
        let escalate = (use_sudo || command.use_sudo) && !self.skip_sudo && !is_root();

        let mut cmd = if escalate {
            // Non-interactive: fail instead of prompting for a password
            let mut sudo_cmd = Command::new("sudo");
            sudo_cmd.arg("-n").arg(&command.program);
            sudo_cmd.args(&command.args);
            sudo_cmd
        } else {
            let mut base_cmd = Command::new(&command.program);
            base_cmd.args(&command.args);
            base_cmd
        };

        for (key, value) in &command.env_vars {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        trace!("Executing: {}{}", if escalate { "sudo -n " } else { "" }, command);

        match timeout(command_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let success = output.status.success();
                let exit_code = output.status.code();

                if !success {
                    debug!("'{}' exited with {:?}: {}", command, exit_code, stderr.trim());
                }

                Ok(CommandOutput {
                    stdout,
                    stderr,
                    exit_code,
                    success,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(CommandError::System(
                ProbeError::CommandNotFound(command.program.clone()),
            )),
            Ok(Err(e)) => Err(CommandError::ExecutionFailed(format!(
                "Failed to execute command '{}': {}",
                command.program, e
            ))),
            Err(_) => Err(CommandError::ExecutionFailed(format!(
                "Command '{}' timed out after {:?}",
                command.program, command_timeout
            ))),
        }
    }
}

fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Locate an executable on `PATH`
fn find_in_path(command_name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(command_name))
        .find(|candidate| candidate.is_file())
}

#[async_trait]
impl CommandExecutor for UnixCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        self.execute_with_retry(command, false).await
    }

    async fn execute_with_privileges(
        &self,
        command: &SystemCommand,
    ) -> Result<CommandOutput, CommandError> {
        self.execute_with_retry(command, true).await
    }

    async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError> {
        Ok(find_in_path(command_name).is_some())
    }

    async fn get_command_path(&self, command_name: &str) -> Result<Option<String>, CommandError> {
        Ok(find_in_path(command_name).map(|p| p.to_string_lossy().to_string()))
    }

    async fn has_elevated_privileges(&self) -> Result<bool, CommandError> {
        Ok(is_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unix_command_executor_basic() {
        let executor = UnixCommandExecutor::with_defaults();

        let cmd = SystemCommand::new("echo").args(&["hello", "world"]);

        let result = executor.execute(&cmd).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_missing_command_is_not_retried() {
        let executor = UnixCommandExecutor::new(Duration::from_secs(5), 3, true);
        let cmd = SystemCommand::new("definitely_not_a_real_command_12345");

        let err = executor.execute(&cmd).await.unwrap_err();
        assert!(matches!(
            err,
            CommandError::System(ProbeError::CommandNotFound(_))
        ));
        assert!(!executor
            .is_command_available("definitely_not_a_real_command_12345")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let executor = UnixCommandExecutor::new(Duration::from_secs(30), 0, true);

        let cmd = SystemCommand::new("sleep")
            .args(&["10"])
            .timeout(Duration::from_millis(100));

        let result = executor.execute(&cmd).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_get_command_path() {
        let executor = UnixCommandExecutor::with_defaults();

        // Sandboxes may lack coreutils; only check consistency
        if let Some(p) = executor.get_command_path("echo").await.unwrap() {
            assert!(p.ends_with("echo"));
        }
        assert!(executor
            .get_command_path("definitely_not_a_real_command_12345")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_skip_sudo_runs_unescalated() {
        let executor = UnixCommandExecutor::new(Duration::from_secs(5), 0, true);
        let cmd = SystemCommand::new("echo").args(&["plain"]).with_sudo();

        let result = executor.execute_with_privileges(&cmd).await.unwrap();
        assert_eq!(result.stdout.trim(), "plain");
    }
}
