use crate::window::ObservationWindow;
use parking_lot::{Mutex, RwLock};
use reacter_common::types::{Classification, ThresholdRule};
use std::collections::HashMap;
use std::sync::Arc;

/// Identifies one observation stream. The metric pattern is part of the key
/// so that several rules matching the same metric keep separate state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationKey {
    pub host: String,
    pub metric: String,
    pub pattern: String,
}

impl ObservationKey {
    pub fn new(host: &str, metric: &str, pattern: &str) -> Self {
        Self {
            host: host.to_string(),
            metric: metric.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

impl std::fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} [{}]", self.host, self.metric, self.pattern)
    }
}

/// Mutable state for one observation key.
#[derive(Debug, Clone, Default)]
pub struct ObservationRecord {
    rule: Option<Arc<ThresholdRule>>,
    window: ObservationWindow,
    pub(crate) breach_count: u32,
    pub(crate) ok_count: u32,
    pub(crate) last_classification: Classification,
    pub(crate) violation: bool,
    pub(crate) last_violation: bool,
    pub(crate) checks: u64,
}

impl ObservationRecord {
    /// Binds `rule` if none is bound yet and appends `value` to the window.
    /// Returns the rule in effect for this record, which is always the
    /// first one ever passed.
    pub fn record(&mut self, value: f64, rule: &Arc<ThresholdRule>) -> Arc<ThresholdRule> {
        let bound = match &self.rule {
            Some(bound) => Arc::clone(bound),
            None => {
                self.window.resize(rule.window_size());
                self.rule = Some(Arc::clone(rule));
                Arc::clone(rule)
            }
        };
        self.window.push(value);
        bound
    }

    pub fn rule(&self) -> Option<&Arc<ThresholdRule>> {
        self.rule.as_ref()
    }

    pub fn window(&self) -> &ObservationWindow {
        &self.window
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.window.latest()
    }

    /// Consecutive non-OK classifications since the last reset.
    pub fn breach_count(&self) -> u32 {
        self.breach_count
    }

    /// Consecutive OK classifications since the last reset.
    pub fn ok_count(&self) -> u32 {
        self.ok_count
    }

    pub fn last_classification(&self) -> Classification {
        self.last_classification
    }

    pub fn violation(&self) -> bool {
        self.violation
    }

    pub fn last_violation(&self) -> bool {
        self.last_violation
    }

    /// Total observations classified for this key.
    pub fn checks(&self) -> u64 {
        self.checks
    }
}

type Slot = Arc<Mutex<ObservationRecord>>;

/// Per-key observation state. The map lock is only held to find or insert a
/// slot; callers lock the slot itself for the read-modify-write of a record.
#[derive(Default)]
pub struct ObservationStore {
    records: RwLock<HashMap<ObservationKey, Slot>>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `key`, creating a zero-state record on first use.
    pub fn get_or_create(&self, key: &ObservationKey) -> Slot {
        if let Some(slot) = self.records.read().get(key) {
            return Arc::clone(slot);
        }
        let mut records = self.records.write();
        Arc::clone(records.entry(key.clone()).or_default())
    }

    /// Binds the rule (first call only), appends the value and returns a
    /// snapshot of the updated record.
    pub fn record(&self, key: &ObservationKey, value: f64, rule: &Arc<ThresholdRule>) -> ObservationRecord {
        let slot = self.get_or_create(key);
        let mut record = slot.lock();
        record.record(value, rule);
        record.clone()
    }

    pub fn get(&self, key: &ObservationKey) -> Option<ObservationRecord> {
        let slot = self.records.read().get(key).map(Arc::clone)?;
        let record = slot.lock().clone();
        Some(record)
    }

    /// Snapshot of every record, sorted by key.
    pub fn snapshot(&self) -> Vec<(ObservationKey, ObservationRecord)> {
        let slots: Vec<(ObservationKey, Slot)> = self
            .records
            .read()
            .iter()
            .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
            .collect();
        let mut records: Vec<_> = slots
            .into_iter()
            .map(|(key, slot)| {
                let record = slot.lock().clone();
                (key, record)
            })
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
