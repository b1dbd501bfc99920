/// Errors returned by action handlers.
///
/// These are observed only by whoever awaits a dispatch handle; they never
/// affect classification or hysteresis state.
///
/// # Examples
///
/// ```rust
/// use reacter_notify::error::ActionError;
///
/// let err = ActionError::Timeout { secs: 30 };
/// assert!(err.to_string().contains("30"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The reached bound set enabled `exec` but neither it nor the rule
    /// supplies a command.
    #[error("Action: no command configured for metric '{metric}'")]
    MissingCommand { metric: String },

    /// The child process could not be started or waited on.
    #[error("Action: process error: {0}")]
    Process(#[from] std::io::Error),

    /// The child process exceeded the configured timeout and was killed.
    #[error("Action: command timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The outbound channel to the collector is gone.
    #[error("Action: outbound channel closed")]
    ChannelClosed,

    /// The dispatch task panicked or was cancelled.
    #[error("Action: task failed: {0}")]
    Join(String),
}

/// Convenience `Result` alias for action handlers.
pub type Result<T> = std::result::Result<T, ActionError>;
