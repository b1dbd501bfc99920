use crate::config::Thresholds;
use crate::error::Result;
use crate::matcher::RuleMatcher;
use crate::rules::threshold::{classify, describe};
use crate::store::{ObservationKey, ObservationStore};
use reacter_common::types::{ThresholdRule, Transition, ValueList};
use std::sync::Arc;
use tracing;

/// Owns the rule matcher and the observation store. Shared across ingest
/// workers behind an `Arc`; state for different keys never contends.
pub struct ThresholdEngine {
    matcher: RuleMatcher,
    store: ObservationStore,
}

impl ThresholdEngine {
    pub fn new(matcher: RuleMatcher) -> Self {
        Self {
            matcher,
            store: ObservationStore::new(),
        }
    }

    pub fn from_thresholds(thresholds: &Thresholds) -> Result<Self> {
        Ok(Self::new(RuleMatcher::new(thresholds)?))
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    pub fn store(&self) -> &ObservationStore {
        &self.store
    }

    /// Evaluates every value of `vl` against every matching rule and returns
    /// the reportable transitions in evaluation order. Unmatched input
    /// yields nothing.
    pub fn ingest(&self, vl: &ValueList) -> Vec<Transition> {
        let metric = vl.metric_name();
        let candidates = self.matcher.candidates(&vl.host);

        let mut matched = false;
        let mut transitions = Vec::new();
        for entry in candidates.iter().filter(|entry| entry.matches(&metric)) {
            matched = true;
            let key = ObservationKey::new(&vl.host, &metric, &entry.pattern);
            for &value in &vl.values {
                if let Some(transition) = self.observe(&key, vl, value, &entry.rule) {
                    transitions.push(transition);
                }
            }
        }

        if !matched {
            tracing::trace!(host = %vl.host, metric = %metric, "No threshold rule matches");
        }
        transitions
    }

    /// Runs one value through record → classify → state machine under the
    /// key's lock, returning a snapshot if the change is reportable.
    pub fn observe(
        &self,
        key: &ObservationKey,
        vl: &ValueList,
        value: f64,
        rule: &Arc<ThresholdRule>,
    ) -> Option<Transition> {
        let slot = self.store.get_or_create(key);
        let mut record = slot.lock();

        let rule = record.record(value, rule);
        let evaluation = classify(value, &rule);
        record.advance(evaluation.classification, rule.effective_hits());

        tracing::debug!(
            key = %key,
            value,
            classification = %evaluation.classification,
            breaches = record.breach_count(),
            violation = record.violation(),
            "Observation checked"
        );

        let direction = record.reportable(&rule)?;
        let edge = record.is_edge();
        let latest = record.latest_value().unwrap_or(value);
        drop(record);

        if edge {
            tracing::info!(
                host = %key.host,
                metric = %key.metric,
                direction = %direction,
                "{}",
                describe(&key.metric, latest, evaluation.classification, &rule)
            );
        }

        Some(Transition {
            direction,
            edge,
            host: vl.host.clone(),
            plugin: vl.plugin.clone(),
            plugin_instance: vl.plugin_instance.clone(),
            type_name: vl.type_name.clone(),
            type_instance: vl.type_instance.clone(),
            metric: key.metric.clone(),
            pattern: key.pattern.clone(),
            classification: evaluation.classification,
            value: latest,
            time: vl.time,
            bounds: evaluation.bounds.cloned(),
            rule,
        })
    }
}
