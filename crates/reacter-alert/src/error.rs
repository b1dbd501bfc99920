/// Errors raised while compiling threshold configuration.
///
/// # Examples
///
/// ```rust
/// use reacter_alert::error::AlertError;
///
/// let err = AlertError::InvalidHostPattern {
///     pattern: "web[".to_string(),
///     source: regex::Regex::new("web[").unwrap_err(),
/// };
/// assert!(err.to_string().contains("web["));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// A host key is neither `default` nor a valid regular expression.
    #[error("Alert: invalid host pattern '{pattern}': {source}")]
    InvalidHostPattern {
        pattern: String,
        source: regex::Error,
    },

    /// A metric key under a host section is not a valid regular expression.
    #[error("Alert: invalid metric pattern '{pattern}' under host '{host}': {source}")]
    InvalidMetricPattern {
        host: String,
        pattern: String,
        source: regex::Error,
    },
}

/// Convenience `Result` alias for engine construction.
pub type Result<T> = std::result::Result<T, AlertError>;
