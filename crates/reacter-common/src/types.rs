use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Free-form action parameters. Values may be any YAML/JSON scalar and are
/// stringified when exported to an action.
pub type Params = BTreeMap<String, Value>;

/// One observation batch as delivered by the metric collector.
///
/// # Examples
///
/// ```
/// use reacter_common::types::ValueList;
///
/// let vl: ValueList = serde_json::from_str(
///     r#"{"host":"web01","plugin":"cpu","plugin_instance":"0","type":"cpu","type_instance":"idle","values":[97.5]}"#,
/// ).unwrap();
/// assert_eq!(vl.metric_name(), "cpu-0.cpu-idle");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueList {
    pub host: String,
    pub plugin: String,
    #[serde(default)]
    pub plugin_instance: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub type_instance: String,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
    pub values: Vec<f64>,
}

impl ValueList {
    pub fn new(host: &str, plugin: &str, type_name: &str, values: Vec<f64>) -> Self {
        Self {
            host: host.to_string(),
            plugin: plugin.to_string(),
            plugin_instance: String::new(),
            type_name: type_name.to_string(),
            type_instance: String::new(),
            time: Utc::now(),
            values,
        }
    }

    pub fn with_plugin_instance(mut self, instance: &str) -> Self {
        self.plugin_instance = instance.to_string();
        self
    }

    pub fn with_type_instance(mut self, instance: &str) -> Self {
        self.type_instance = instance.to_string();
        self
    }

    /// Dotted metric name used for rule matching.
    pub fn metric_name(&self) -> String {
        compose_metric_name(
            &self.plugin,
            &self.plugin_instance,
            &self.type_name,
            &self.type_instance,
        )
    }
}

/// Builds `plugin[-plugin_instance][.type[-type_instance]]`.
///
/// # Examples
///
/// ```
/// use reacter_common::types::compose_metric_name;
///
/// assert_eq!(compose_metric_name("load", "", "load", ""), "load.load");
/// assert_eq!(compose_metric_name("df", "root", "", ""), "df-root");
/// assert_eq!(compose_metric_name("memory", "", "memory", "free"), "memory.memory-free");
/// ```
pub fn compose_metric_name(
    plugin: &str,
    plugin_instance: &str,
    type_name: &str,
    type_instance: &str,
) -> String {
    let mut name = join_instance(plugin, plugin_instance);
    let type_part = join_instance(type_name, type_instance);
    if !type_part.is_empty() {
        name.push('.');
        name.push_str(&type_part);
    }
    name
}

fn join_instance(base: &str, instance: &str) -> String {
    if instance.is_empty() {
        base.to_string()
    } else {
        format!("{base}-{instance}")
    }
}

/// Result of checking one value against a rule's bounds, ordered from the
/// lowest failure to the highest failure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    FailLow,
    WarnLow,
    #[default]
    Ok,
    WarnHigh,
    FailHigh,
}

impl Classification {
    /// Numeric state code exported to actions: -2 (fail low) through 2 (fail high).
    pub fn code(self) -> i8 {
        match self {
            Self::FailLow => -2,
            Self::WarnLow => -1,
            Self::Ok => 0,
            Self::WarnHigh => 1,
            Self::FailHigh => 2,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::FailLow | Self::FailHigh => Severity::Failure,
            Self::WarnLow | Self::WarnHigh => Severity::Warning,
            Self::Ok => Severity::Okay,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FailLow => write!(f, "fail_low"),
            Self::WarnLow => write!(f, "warn_low"),
            Self::Ok => write!(f, "ok"),
            Self::WarnHigh => write!(f, "warn_high"),
            Self::FailHigh => write!(f, "fail_high"),
        }
    }
}

/// Notification severity, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use reacter_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Failure > Severity::Okay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Okay,
    Warning,
    Failure,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Okay => write!(f, "okay"),
            Severity::Warning => write!(f, "warning"),
            Severity::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "okay" => Ok(Severity::Okay),
            "warning" => Ok(Severity::Warning),
            "failure" => Ok(Severity::Failure),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Action kinds a bound set can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Exec,
    Notify,
}

impl ActionKind {
    pub const ALL: [ActionKind; 2] = [ActionKind::Exec, ActionKind::Notify];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::Notify => "notify",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exec" => Ok(Self::Exec),
            "notify" => Ok(Self::Notify),
            _ => Err(format!("unknown action kind: {s}")),
        }
    }
}

/// Per-bound-set action declaration: `true` uses the rule-level default,
/// `false` disables the action, a string overrides the command or message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionSpec {
    Enabled(bool),
    Override(String),
}

/// One warn/fail/okay section of a rule. Absent bounds are never breached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundSet {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exec: Option<ActionSpec>,
    pub notify: Option<ActionSpec>,
    pub params: Params,
}

impl BoundSet {
    pub fn action(&self, kind: ActionKind) -> Option<&ActionSpec> {
        match kind {
            ActionKind::Exec => self.exec.as_ref(),
            ActionKind::Notify => self.notify.as_ref(),
        }
    }

    pub fn has_bounds(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// A threshold rule bound to one metric-name pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdRule {
    /// Display name used when reporting stats. Falls back to the metric name.
    pub name: Option<String>,
    pub warn: Option<BoundSet>,
    pub fail: Option<BoundSet>,
    /// Action section used for OK classifications.
    pub okay: Option<BoundSet>,
    pub hits: u32,
    pub observations: Option<usize>,
    pub persist: bool,
    pub persist_ok: bool,
    pub report: bool,
    pub exec: Option<String>,
    pub notify: Option<String>,
    pub params: Params,
}

impl ThresholdRule {
    /// Consecutive observations needed for a transition; zero means one.
    pub fn effective_hits(&self) -> u32 {
        self.hits.max(1)
    }

    /// Window capacity; defaults to the hysteresis depth.
    pub fn window_size(&self) -> usize {
        match self.observations {
            Some(n) if n > 0 => n,
            _ => self.effective_hits() as usize,
        }
    }

    /// Rule-level default command (`exec`) or message (`notify`).
    pub fn default_action(&self, kind: ActionKind) -> Option<&str> {
        match kind {
            ActionKind::Exec => self.exec.as_deref(),
            ActionKind::Notify => self.notify.as_deref(),
        }
    }

    pub fn has_bounds(&self) -> bool {
        self.warn.as_ref().is_some_and(BoundSet::has_bounds)
            || self.fail.as_ref().is_some_and(BoundSet::has_bounds)
    }
}

/// Stringifies a parameter value the way it is exported to actions.
///
/// # Examples
///
/// ```
/// use reacter_common::types::param_to_string;
///
/// assert_eq!(param_to_string(&serde_json::json!("ops")), "ops");
/// assert_eq!(param_to_string(&serde_json::json!(3)), "3");
/// assert_eq!(param_to_string(&serde_json::json!(true)), "true");
/// ```
pub fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Entering (or persisting in) violation.
    Violating,
    /// Leaving violation, or a persisted success.
    Clearing,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Violating => write!(f, "violating"),
            Direction::Clearing => write!(f, "clearing"),
        }
    }
}

/// Immutable snapshot of a reportable state change, handed from the engine
/// to the action dispatcher after the per-key lock has been released.
#[derive(Debug, Clone)]
pub struct Transition {
    pub direction: Direction,
    /// True when `violation` changed on this observation.
    pub edge: bool,
    pub host: String,
    pub plugin: String,
    pub plugin_instance: String,
    pub type_name: String,
    pub type_instance: String,
    pub metric: String,
    /// Metric pattern of the rule that produced this transition.
    pub pattern: String,
    pub classification: Classification,
    /// Most recent raw value in the observation window.
    pub value: f64,
    pub time: DateTime<Utc>,
    pub rule: Arc<ThresholdRule>,
    /// The bound set reached by the classification, if the rule defines one.
    pub bounds: Option<BoundSet>,
}

/// Notification sent back to the collector by the `notify` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub time: DateTime<Utc>,
    pub severity: Severity,
    pub host: String,
    pub plugin: String,
    #[serde(default)]
    pub plugin_instance: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub type_instance: String,
    pub message: String,
}

/// Everything written back to the collector on the outbound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    Values(ValueList),
    Notification(Notification),
}
