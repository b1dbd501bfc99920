use reacter_common::types::{BoundSet, Classification, ThresholdRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    LessThan,
    GreaterThan,
}

impl CompareOp {
    fn check(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::LessThan => value < threshold,
            Self::GreaterThan => value > threshold,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessThan => write!(f, "below"),
            Self::GreaterThan => write!(f, "above"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Fail,
    Warn,
}

/// Fixed check order: failure bounds win over warning bounds.
const CHECKS: [(Level, CompareOp, Classification); 4] = [
    (Level::Fail, CompareOp::LessThan, Classification::FailLow),
    (Level::Fail, CompareOp::GreaterThan, Classification::FailHigh),
    (Level::Warn, CompareOp::LessThan, Classification::WarnLow),
    (Level::Warn, CompareOp::GreaterThan, Classification::WarnHigh),
];

/// Outcome of [`classify`]: the classification and the bound set that was
/// reached (the rule's `okay` set for OK, which may be absent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation<'a> {
    pub classification: Classification,
    pub bounds: Option<&'a BoundSet>,
}

/// Classifies `value` against the rule's bounds.
///
/// Absent bounds are never breached, so a rule with only `warn.max` can
/// never produce a low classification. NaN compares false everywhere and is
/// therefore OK.
///
/// # Examples
///
/// ```
/// use reacter_alert::rules::threshold::classify;
/// use reacter_common::types::{BoundSet, Classification, ThresholdRule};
///
/// let rule = ThresholdRule {
///     warn: Some(BoundSet { min: Some(20.0), ..Default::default() }),
///     fail: Some(BoundSet { min: Some(10.0), ..Default::default() }),
///     ..Default::default()
/// };
/// assert_eq!(classify(5.0, &rule).classification, Classification::FailLow);
/// assert_eq!(classify(15.0, &rule).classification, Classification::WarnLow);
/// assert_eq!(classify(25.0, &rule).classification, Classification::Ok);
/// ```
pub fn classify(value: f64, rule: &ThresholdRule) -> Evaluation<'_> {
    for (level, op, classification) in CHECKS {
        let bounds = match level {
            Level::Fail => rule.fail.as_ref(),
            Level::Warn => rule.warn.as_ref(),
        };
        let Some(bounds) = bounds else {
            continue;
        };
        let threshold = match op {
            CompareOp::LessThan => bounds.min,
            CompareOp::GreaterThan => bounds.max,
        };
        if threshold.is_some_and(|t| op.check(value, t)) {
            return Evaluation {
                classification,
                bounds: Some(bounds),
            };
        }
    }

    Evaluation {
        classification: Classification::Ok,
        bounds: rule.okay.as_ref(),
    }
}

/// Human-readable summary of a classification, used for log lines and the
/// default notification message.
pub fn describe(metric: &str, value: f64, classification: Classification, rule: &ThresholdRule) -> String {
    let bound = |bounds: &Option<BoundSet>, op: CompareOp| {
        bounds.as_ref().and_then(|b| match op {
            CompareOp::LessThan => b.min,
            CompareOp::GreaterThan => b.max,
        })
    };
    let (op, threshold) = match classification {
        Classification::FailLow => (CompareOp::LessThan, bound(&rule.fail, CompareOp::LessThan)),
        Classification::FailHigh => (CompareOp::GreaterThan, bound(&rule.fail, CompareOp::GreaterThan)),
        Classification::WarnLow => (CompareOp::LessThan, bound(&rule.warn, CompareOp::LessThan)),
        Classification::WarnHigh => (CompareOp::GreaterThan, bound(&rule.warn, CompareOp::GreaterThan)),
        Classification::Ok => return format!("{metric} is within thresholds ({value:.2})"),
    };
    match threshold {
        Some(t) => format!("{metric} is {op} {t:.2} ({value:.2}, {classification})"),
        None => format!("{metric} is {classification} ({value:.2})"),
    }
}
