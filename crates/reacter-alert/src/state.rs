//! Violation state machine.
//!
//! A record enters violation after `hits` consecutive non-OK classifications
//! and leaves it after `hits` consecutive OK classifications. Any breach
//! kind counts toward entering, so a warn that escalates to fail keeps
//! accumulating. A change of direction (OK versus breach) resets the
//! opposite counter; reaching `hits` resets the counter that reached it.

use crate::store::ObservationRecord;
use reacter_common::types::{Classification, Direction, ThresholdRule};

impl ObservationRecord {
    /// Folds one classification into the hysteresis counters.
    pub fn advance(&mut self, classification: Classification, hits: u32) {
        let hits = hits.max(1);
        self.last_violation = self.violation;
        self.last_classification = classification;
        self.checks += 1;

        if classification.is_ok() {
            self.breach_count = 0;
            self.ok_count += 1;
            if self.ok_count >= hits {
                self.ok_count = 0;
                self.violation = false;
            }
        } else {
            self.ok_count = 0;
            self.breach_count += 1;
            if self.breach_count >= hits {
                self.breach_count = 0;
                self.violation = true;
            }
        }
    }

    /// True when the last [`advance`](Self::advance) flipped `violation`.
    pub fn is_edge(&self) -> bool {
        self.violation != self.last_violation
    }

    /// Decides whether the last observation should trigger actions.
    ///
    /// Violating: the observation was a breach, the record is in violation,
    /// and either this is the edge or the rule persists. Clearing: the
    /// observation was OK, the record is not in violation, and either this
    /// is the edge or the rule persists successes.
    pub fn reportable(&self, rule: &ThresholdRule) -> Option<Direction> {
        let breach = !self.last_classification.is_ok();
        if breach && self.violation && (self.is_edge() || rule.persist) {
            return Some(Direction::Violating);
        }
        if !breach && !self.violation && (self.is_edge() || rule.persist_ok) {
            return Some(Direction::Clearing);
        }
        None
    }
}
