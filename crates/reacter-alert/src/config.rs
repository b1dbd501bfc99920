use indexmap::IndexMap;
use reacter_common::types::{Params, ThresholdRule};
use serde::{Deserialize, Serialize};

/// Metric pattern → rule, in declaration order.
pub type MetricRules = IndexMap<String, ThresholdRule>;

/// Top level of a threshold file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Global parameters exported to every action.
    pub params: Params,
    /// Host pattern (`default` or a regular expression) → metric rules.
    /// A null section is kept but matches nothing.
    pub hosts: IndexMap<String, Option<MetricRules>>,
}

impl Thresholds {
    pub fn rule_count(&self) -> usize {
        self.hosts.values().flatten().map(|rules| rules.len()).sum()
    }
}
