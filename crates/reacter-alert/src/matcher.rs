use crate::config::Thresholds;
use crate::error::{AlertError, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use reacter_common::types::ThresholdRule;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Host key that applies to every host.
pub const DEFAULT_HOST: &str = "default";

/// Patterns match from the start of the subject, like a prefix match.
fn compile_anchored(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

#[derive(Debug)]
enum HostPattern {
    Default,
    Regex(Regex),
}

impl HostPattern {
    fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Default => true,
            HostPattern::Regex(re) => re.is_match(host),
        }
    }
}

/// A compiled metric pattern and its rule.
#[derive(Debug)]
pub struct RuleEntry {
    pub pattern: String,
    regex: Regex,
    pub rule: Arc<ThresholdRule>,
}

impl RuleEntry {
    pub fn matches(&self, metric: &str) -> bool {
        self.regex.is_match(metric)
    }
}

#[derive(Debug)]
struct HostSection {
    host: HostPattern,
    rules: Vec<Arc<RuleEntry>>,
}

/// Merged candidate rules for one host.
pub type Candidates = Arc<Vec<Arc<RuleEntry>>>;

/// Selects the rules that apply to a (host, metric) pair.
///
/// Host sections are merged once per distinct host and cached, so repeat
/// lookups for a known host only clone an `Arc`.
#[derive(Debug, Default)]
pub struct RuleMatcher {
    sections: Vec<HostSection>,
    merged: RwLock<HashMap<String, Candidates>>,
}

impl RuleMatcher {
    /// Compiles every host and metric pattern, keeping declaration order.
    /// Null host sections are skipped.
    pub fn new(thresholds: &Thresholds) -> Result<Self> {
        let mut sections = Vec::with_capacity(thresholds.hosts.len());

        for (host_key, rules) in &thresholds.hosts {
            let Some(rules) = rules else {
                tracing::debug!(host = %host_key, "Skipping empty host section");
                continue;
            };

            let host = if host_key == DEFAULT_HOST {
                HostPattern::Default
            } else {
                let re = compile_anchored(host_key).map_err(|source| {
                    AlertError::InvalidHostPattern {
                        pattern: host_key.clone(),
                        source,
                    }
                })?;
                HostPattern::Regex(re)
            };

            let mut entries = Vec::with_capacity(rules.len());
            for (pattern, rule) in rules {
                let regex = compile_anchored(pattern).map_err(|source| {
                    AlertError::InvalidMetricPattern {
                        host: host_key.clone(),
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                entries.push(Arc::new(RuleEntry {
                    pattern: pattern.clone(),
                    regex,
                    rule: Arc::new(rule.clone()),
                }));
            }

            sections.push(HostSection {
                host,
                rules: entries,
            });
        }

        Ok(Self {
            sections,
            merged: RwLock::new(HashMap::new()),
        })
    }

    /// Merged candidate rules for `host`. Sections are applied in order and
    /// a later section replaces an earlier rule with the same metric pattern.
    pub fn candidates(&self, host: &str) -> Candidates {
        if let Some(cached) = self.merged.read().get(host) {
            return Arc::clone(cached);
        }
        let candidates = Arc::new(self.merge(host));
        let mut merged = self.merged.write();
        Arc::clone(merged.entry(host.to_string()).or_insert(candidates))
    }

    fn merge(&self, host: &str) -> Vec<Arc<RuleEntry>> {
        let mut merged: IndexMap<&str, &Arc<RuleEntry>> = IndexMap::new();
        for section in self.sections.iter().filter(|s| s.host.matches(host)) {
            for entry in &section.rules {
                merged.insert(entry.pattern.as_str(), entry);
            }
        }
        merged.into_values().map(Arc::clone).collect()
    }

    /// Every candidate rule whose metric pattern matches `metric`.
    pub fn matching(&self, host: &str, metric: &str) -> Vec<Arc<RuleEntry>> {
        self.candidates(host)
            .iter()
            .filter(|entry| entry.matches(metric))
            .cloned()
            .collect()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|s| s.rules.len()).sum()
    }
}
