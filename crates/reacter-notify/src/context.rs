use chrono::{DateTime, Utc};
use reacter_common::types::{
    param_to_string, ActionKind, Classification, Direction, Params, Transition,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything an action needs to know about one transition. Built from a
/// [`Transition`] snapshot, so it owns all of its data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionContext {
    pub kind: ActionKind,
    pub direction: Direction,
    pub host: String,
    pub plugin: String,
    pub plugin_instance: String,
    pub type_name: String,
    pub type_instance: String,
    pub metric: String,
    pub classification: Classification,
    pub value: f64,
    pub time: DateTime<Utc>,
    pub rule_name: Option<String>,
    /// Command for `exec`, message template for `notify`.
    pub payload: Option<String>,
    /// Global, rule and bound-set parameters, later layers winning.
    pub params: BTreeMap<String, String>,
}

impl ActionContext {
    pub fn from_transition(
        kind: ActionKind,
        transition: &Transition,
        payload: Option<String>,
        global_params: &Params,
    ) -> Self {
        let bound_params = transition.bounds.as_ref().map(|b| &b.params);
        Self {
            kind,
            direction: transition.direction,
            host: transition.host.clone(),
            plugin: transition.plugin.clone(),
            plugin_instance: transition.plugin_instance.clone(),
            type_name: transition.type_name.clone(),
            type_instance: transition.type_instance.clone(),
            metric: transition.metric.clone(),
            classification: transition.classification,
            value: transition.value,
            time: transition.time,
            rule_name: transition.rule.name.clone(),
            payload,
            params: layer_params([Some(global_params), Some(&transition.rule.params), bound_params]),
        }
    }

    /// Environment exported to `exec` commands, every name prefixed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use reacter_notify::context::ActionContext;
    /// # use reacter_common::types::{ActionKind, Classification, Direction};
    /// let ctx = ActionContext {
    ///     kind: ActionKind::Exec,
    ///     direction: Direction::Violating,
    ///     host: "web01".into(),
    ///     plugin: "cpu".into(),
    ///     plugin_instance: String::new(),
    ///     type_name: "load".into(),
    ///     type_instance: String::new(),
    ///     metric: "cpu.load".into(),
    ///     classification: Classification::WarnHigh,
    ///     value: 85.5,
    ///     time: chrono::Utc::now(),
    ///     rule_name: None,
    ///     payload: None,
    ///     params: [("team".to_string(), "ops".to_string())].into(),
    /// };
    /// let env = ctx.env_vars("COLLECTD_");
    /// assert!(env.contains(&("COLLECTD_THRESHOLD_STATE".into(), "1".into())));
    /// assert!(env.contains(&("COLLECTD_VALUE".into(), "85.5".into())));
    /// assert!(env.contains(&("COLLECTD_PARAM_TEAM".into(), "ops".into())));
    /// ```
    pub fn env_vars(&self, prefix: &str) -> Vec<(String, String)> {
        let mut env = vec![
            (format!("{prefix}HOST"), self.host.clone()),
            (format!("{prefix}PLUGIN"), self.plugin.clone()),
            (format!("{prefix}PLUGIN_INSTANCE"), self.plugin_instance.clone()),
            (format!("{prefix}TYPE"), self.type_name.clone()),
            (format!("{prefix}TYPE_INSTANCE"), self.type_instance.clone()),
            (format!("{prefix}METRIC"), self.metric.clone()),
            (
                format!("{prefix}THRESHOLD_STATE"),
                self.classification.code().to_string(),
            ),
            (format!("{prefix}VALUE"), format_value(self.value)),
        ];
        env.extend(
            self.params
                .iter()
                .map(|(k, v)| (format!("{prefix}PARAM_{}", k.to_uppercase()), v.clone())),
        );
        env
    }

    /// Substitutes `{{placeholder}}` fields in a message template.
    pub fn render(&self, template: &str) -> String {
        let mut out = template
            .replace("{{host}}", &self.host)
            .replace("{{metric}}", &self.metric)
            .replace("{{plugin}}", &self.plugin)
            .replace("{{plugin_instance}}", &self.plugin_instance)
            .replace("{{type}}", &self.type_name)
            .replace("{{type_instance}}", &self.type_instance)
            .replace("{{value}}", &format!("{:.2}", self.value))
            .replace("{{state}}", &self.classification.to_string())
            .replace("{{direction}}", &self.direction.to_string());
        for (key, value) in &self.params {
            out = out.replace(&format!("{{{{param.{key}}}}}"), value);
        }
        out
    }
}

/// Formats a value for the environment, always keeping a fractional part
/// for whole numbers (`85.0`, not `85`).
///
/// # Examples
///
/// ```
/// use reacter_notify::context::format_value;
///
/// assert_eq!(format_value(85.0), "85.0");
/// assert_eq!(format_value(0.25), "0.25");
/// ```
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// Merges parameter layers in order; a later layer overrides same-named
/// keys of earlier ones.
pub fn layer_params<'a>(layers: impl IntoIterator<Item = Option<&'a Params>>) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for layer in layers.into_iter().flatten() {
        for (key, value) in layer {
            merged.insert(key.clone(), param_to_string(value));
        }
    }
    merged
}
