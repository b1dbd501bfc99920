//! Engine statistics reported back to the collector.

use crate::engine::ThresholdEngine;
use chrono::Utc;
use reacter_common::types::ValueList;

/// Plugin name used for every reported value list.
pub const STATS_PLUGIN: &str = "reacter";

impl ThresholdEngine {
    /// For each record whose rule sets `report: true`, emits the current
    /// breach counter (`hits`) and last classification code (`status`).
    pub fn report_stats(&self) -> Vec<ValueList> {
        let now = Utc::now();
        let mut out = Vec::new();

        for (key, record) in self.store().snapshot() {
            let Some(rule) = record.rule() else {
                continue;
            };
            if !rule.report {
                continue;
            }
            let name = rule.name.clone().unwrap_or_else(|| key.metric.clone());

            for (type_name, value) in [
                ("hits", f64::from(record.breach_count())),
                ("status", f64::from(record.last_classification().code())),
            ] {
                out.push(ValueList {
                    host: key.host.clone(),
                    plugin: STATS_PLUGIN.to_string(),
                    plugin_instance: name.clone(),
                    type_name: type_name.to_string(),
                    type_instance: String::new(),
                    time: now,
                    values: vec![value],
                });
            }
        }

        out
    }
}
