use crate::context::ActionContext;
use crate::error::{ActionError, Result};
use crate::{ActionHandler, ActionOutcome};
use async_trait::async_trait;
use reacter_common::types::ActionKind;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing;

/// Maximum number of characters of captured output kept in log lines.
const MAX_OUTPUT_LOG_CHARS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Prefix for every exported environment variable.
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,
    /// Shell used to run the command string (`<shell> -c <command>`).
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Kill the command after this many seconds. Unset means no limit.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_env_prefix() -> String {
    "COLLECTD_".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            env_prefix: default_env_prefix(),
            shell: default_shell(),
            timeout_secs: None,
        }
    }
}

/// Runs the resolved command through the shell with the transition
/// exported as environment variables on top of the parent environment.
#[derive(Debug, Clone, Default)]
pub struct ExecAction {
    config: ExecConfig,
}

impl ExecAction {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    fn build_command(&self, command: &str, context: &ActionContext) -> Command {
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(command)
            .envs(context.env_vars(&self.config.env_prefix))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.config.timeout_secs.is_some());
        cmd
    }
}

fn truncate_output(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    match text.char_indices().nth(MAX_OUTPUT_LOG_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[async_trait]
impl ActionHandler for ExecAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Exec
    }

    async fn dispatch(&self, context: &ActionContext) -> Result<ActionOutcome> {
        let command = context
            .payload
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ActionError::MissingCommand {
                metric: context.metric.clone(),
            })?;

        let child = self.build_command(command, context).spawn()?;
        tracing::debug!(
            host = %context.host,
            metric = %context.metric,
            command,
            pid = child.id(),
            "Spawned exec action"
        );

        let output = match self.config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
                .await
                .map_err(|_| ActionError::Timeout { secs })??,
            None => child.wait_with_output().await?,
        };

        let stdout = truncate_output(&output.stdout);
        let stderr = truncate_output(&output.stderr);
        let exit_code = output.status.code();

        if output.status.success() {
            tracing::debug!(metric = %context.metric, stdout = %stdout, "Exec action finished");
        } else {
            tracing::warn!(
                metric = %context.metric,
                command,
                exit_code,
                stderr = %stderr,
                "Exec action exited with failure"
            );
        }

        Ok(ActionOutcome {
            exit_code,
            detail: (!stdout.is_empty()).then_some(stdout),
        })
    }
}
