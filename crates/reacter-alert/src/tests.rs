use crate::config::{MetricRules, ThresholdConfig, Thresholds};
use crate::engine::ThresholdEngine;
use crate::error::AlertError;
use crate::matcher::RuleMatcher;
use crate::rules::threshold::classify;
use crate::stats::STATS_PLUGIN;
use crate::store::{ObservationKey, ObservationStore};
use crate::window::ObservationWindow;
use indexmap::IndexMap;
use reacter_common::types::{
    BoundSet, Classification, Direction, ThresholdRule, ValueList,
};
use std::sync::Arc;

fn bounds(min: Option<f64>, max: Option<f64>) -> Option<BoundSet> {
    Some(BoundSet {
        min,
        max,
        ..Default::default()
    })
}

fn cpu_rule(hits: u32) -> ThresholdRule {
    ThresholdRule {
        warn: bounds(None, Some(80.0)),
        fail: bounds(None, Some(95.0)),
        hits,
        ..Default::default()
    }
}

fn single_host(host: &str, rules: Vec<(&str, ThresholdRule)>) -> Thresholds {
    let mut metric_rules = MetricRules::new();
    for (pattern, rule) in rules {
        metric_rules.insert(pattern.to_string(), rule);
    }
    let mut hosts = IndexMap::new();
    hosts.insert(host.to_string(), Some(metric_rules));
    Thresholds {
        hosts,
        ..Default::default()
    }
}

fn engine_with(rule: ThresholdRule) -> ThresholdEngine {
    ThresholdEngine::from_thresholds(&single_host("default", vec![("cpu\\.load", rule)])).unwrap()
}

fn load_vl(host: &str, value: f64) -> ValueList {
    ValueList::new(host, "cpu", "load", vec![value])
}

/// Feeds values one at a time and returns the reportable direction per value.
fn feed(engine: &ThresholdEngine, host: &str, values: &[f64]) -> Vec<Option<Direction>> {
    values
        .iter()
        .map(|&v| {
            let mut transitions = engine.ingest(&load_vl(host, v));
            assert!(transitions.len() <= 1);
            transitions.pop().map(|t| t.direction)
        })
        .collect()
}

// ── Threshold evaluator ──

#[test]
fn classify_values_inside_bounds_are_ok() {
    let rule = ThresholdRule {
        warn: bounds(Some(20.0), Some(80.0)),
        ..Default::default()
    };
    for v in [20.5, 50.0, 79.99] {
        assert_eq!(classify(v, &rule).classification, Classification::Ok);
    }
    // bounds are exclusive
    assert_eq!(classify(20.0, &rule).classification, Classification::Ok);
    assert_eq!(classify(80.0, &rule).classification, Classification::Ok);
}

#[test]
fn classify_failure_bound_takes_precedence() {
    let rule = ThresholdRule {
        warn: bounds(Some(20.0), None),
        fail: bounds(Some(10.0), None),
        ..Default::default()
    };
    let eval = classify(5.0, &rule);
    assert_eq!(eval.classification, Classification::FailLow);
    assert_eq!(eval.bounds, rule.fail.as_ref());

    let eval = classify(15.0, &rule);
    assert_eq!(eval.classification, Classification::WarnLow);
    assert_eq!(eval.bounds, rule.warn.as_ref());
}

#[test]
fn classify_absent_bound_is_never_breached() {
    let rule = ThresholdRule {
        warn: bounds(None, Some(80.0)),
        ..Default::default()
    };
    assert_eq!(classify(-1e9, &rule).classification, Classification::Ok);
    assert_eq!(classify(0.0, &rule).classification, Classification::Ok);
    assert_eq!(classify(81.0, &rule).classification, Classification::WarnHigh);

    let empty = ThresholdRule::default();
    assert_eq!(classify(1e12, &empty).classification, Classification::Ok);
}

#[test]
fn classify_high_side_orders_fail_before_warn() {
    let rule = cpu_rule(1);
    assert_eq!(classify(96.0, &rule).classification, Classification::FailHigh);
    assert_eq!(classify(90.0, &rule).classification, Classification::WarnHigh);
    assert_eq!(classify(70.0, &rule).classification, Classification::Ok);
}

#[test]
fn classify_ok_returns_okay_bound_set() {
    let okay = BoundSet {
        exec: Some(reacter_common::types::ActionSpec::Enabled(true)),
        ..Default::default()
    };
    let rule = ThresholdRule {
        okay: Some(okay.clone()),
        ..cpu_rule(1)
    };
    assert_eq!(classify(10.0, &rule).bounds, Some(&okay));
    assert_eq!(classify(10.0, &cpu_rule(1)).bounds, None);
}

#[test]
fn classify_nan_is_ok() {
    assert_eq!(classify(f64::NAN, &cpu_rule(1)).classification, Classification::Ok);
}

// ── Observation window / store ──

#[test]
fn window_keeps_last_n_values_in_order() {
    let mut window = ObservationWindow::new(5);
    for v in 1..=7 {
        window.push(f64::from(v));
    }
    assert_eq!(window.len(), 5);
    assert_eq!(window.to_vec(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!(window.latest(), Some(7.0));
}

#[test]
fn window_capacity_is_at_least_one() {
    let mut window = ObservationWindow::new(0);
    window.push(1.0);
    window.push(2.0);
    assert_eq!(window.to_vec(), vec![2.0]);
}

#[test]
fn store_record_uses_rule_observation_count() {
    let store = ObservationStore::new();
    let key = ObservationKey::new("web01", "cpu.load", "cpu\\.load");
    let rule = Arc::new(ThresholdRule {
        observations: Some(5),
        ..cpu_rule(2)
    });
    let mut last = None;
    for v in 1..=7 {
        last = Some(store.record(&key, f64::from(v), &rule));
    }
    let record = last.unwrap();
    assert_eq!(record.window().to_vec(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!(store.len(), 1);
}

#[test]
fn store_binds_first_rule_only() {
    let store = ObservationStore::new();
    let key = ObservationKey::new("web01", "cpu.load", "cpu.*");
    let first = Arc::new(cpu_rule(2));
    let second = Arc::new(cpu_rule(7));

    store.record(&key, 1.0, &first);
    let record = store.record(&key, 2.0, &second);
    assert!(Arc::ptr_eq(record.rule().unwrap(), &first));
    assert_eq!(record.rule().unwrap().hits, 2);
}

#[test]
fn store_get_or_create_is_idempotent() {
    let store = ObservationStore::new();
    let key = ObservationKey::new("db1", "load.load", "load");
    let a = store.get_or_create(&key);
    let b = store.get_or_create(&key);
    assert!(Arc::ptr_eq(&a, &b));
    let record = store.get(&key).unwrap();
    assert!(record.rule().is_none());
    assert!(!record.violation());
    assert_eq!(record.breach_count(), 0);
    assert_eq!(record.last_classification(), Classification::Ok);
}

// ── Violation state machine ──

#[test]
fn three_hits_fire_once_without_persist() {
    let engine = engine_with(cpu_rule(3));
    let got = feed(&engine, "web01", &[90.0, 90.0, 90.0, 90.0, 90.0, 90.0, 90.0]);
    assert_eq!(
        got,
        vec![None, None, Some(Direction::Violating), None, None, None, None]
    );
}

#[test]
fn persist_redispatches_every_breach_after_violation() {
    let engine = engine_with(ThresholdRule {
        persist: true,
        ..cpu_rule(3)
    });
    let got = feed(&engine, "web01", &[90.0, 90.0, 90.0, 90.0, 91.0]);
    assert_eq!(
        got,
        vec![
            None,
            None,
            Some(Direction::Violating),
            Some(Direction::Violating),
            Some(Direction::Violating),
        ]
    );
}

#[test]
fn recovery_needs_hits_consecutive_ok() {
    let engine = engine_with(cpu_rule(3));
    let got = feed(
        &engine,
        "web01",
        &[
            90.0, 90.0, 90.0, // enter violation
            50.0, 50.0, 90.0, // interrupted recovery
            50.0, 50.0, 50.0, // clean recovery
        ],
    );
    assert_eq!(got[2], Some(Direction::Violating));
    assert_eq!(&got[3..8], &[None, None, None, None, None]);
    assert_eq!(got[8], Some(Direction::Clearing));
}

#[test]
fn interrupted_recovery_keeps_violation_and_counts_breach() {
    let engine = engine_with(cpu_rule(3));
    feed(&engine, "web01", &[90.0, 90.0, 90.0, 50.0, 50.0, 90.0]);
    let key = ObservationKey::new("web01", "cpu.load", "cpu\\.load");
    let record = engine.store().get(&key).unwrap();
    assert!(record.violation());
    assert_eq!(record.breach_count(), 1);
    assert_eq!(record.ok_count(), 0);
    assert_eq!(record.last_classification(), Classification::WarnHigh);
}

#[test]
fn persist_ok_redispatches_every_success() {
    let engine = engine_with(ThresholdRule {
        persist_ok: true,
        ..cpu_rule(2)
    });
    let got = feed(&engine, "web01", &[50.0, 90.0, 90.0, 50.0, 50.0, 50.0]);
    assert_eq!(
        got,
        vec![
            Some(Direction::Clearing),
            None,
            Some(Direction::Violating),
            None,
            Some(Direction::Clearing),
            Some(Direction::Clearing),
        ]
    );
}

#[test]
fn hits_one_is_edge_triggered() {
    let engine = engine_with(cpu_rule(1));
    let got = feed(&engine, "web01", &[90.0, 96.0, 50.0, 50.0, 85.0]);
    assert_eq!(
        got,
        vec![
            Some(Direction::Violating),
            None,
            Some(Direction::Clearing),
            None,
            Some(Direction::Violating),
        ]
    );
}

#[test]
fn rule_without_bounds_never_violates() {
    let engine = engine_with(ThresholdRule {
        hits: 1,
        ..Default::default()
    });
    let got = feed(&engine, "web01", &[0.0, 1e9, -1e9]);
    assert!(got.iter().all(Option::is_none));
}

#[test]
fn end_to_end_escalation_counts_any_breach() {
    let engine = engine_with(cpu_rule(2));
    let values = [70.0, 85.0, 90.0, 96.0, 96.0, 50.0, 50.0];
    let expected_classes = [
        Classification::Ok,
        Classification::WarnHigh,
        Classification::WarnHigh,
        Classification::FailHigh,
        Classification::FailHigh,
        Classification::Ok,
        Classification::Ok,
    ];

    let key = ObservationKey::new("web01", "cpu.load", "cpu\\.load");
    let mut fired = Vec::new();
    for (i, (&value, &class)) in values.iter().zip(expected_classes.iter()).enumerate() {
        let transitions = engine.ingest(&load_vl("web01", value));
        let record = engine.store().get(&key).unwrap();
        assert_eq!(record.last_classification(), class, "value #{i}");
        for t in transitions {
            fired.push((i, t.direction, t.classification, t.edge, t.value));
        }
    }

    assert_eq!(
        fired,
        vec![
            (2, Direction::Violating, Classification::WarnHigh, true, 90.0),
            (6, Direction::Clearing, Classification::Ok, true, 50.0),
        ]
    );
}

#[test]
fn transition_carries_origin_and_reached_bounds() {
    let engine = engine_with(cpu_rule(1));
    let vl = ValueList::new("web01", "cpu", "load", vec![97.0]).with_type_instance("");
    let transitions = engine.ingest(&vl);
    assert_eq!(transitions.len(), 1);
    let t = &transitions[0];
    assert_eq!(t.host, "web01");
    assert_eq!(t.plugin, "cpu");
    assert_eq!(t.type_name, "load");
    assert_eq!(t.metric, "cpu.load");
    assert_eq!(t.pattern, "cpu\\.load");
    assert_eq!(t.classification, Classification::FailHigh);
    assert_eq!(t.bounds.as_ref().unwrap().max, Some(95.0));
    assert_eq!(t.value, 97.0);
}

#[test]
fn multiple_values_in_one_batch_share_the_key() {
    let engine = engine_with(cpu_rule(2));
    let vl = ValueList::new("web01", "cpu", "load", vec![90.0, 91.0]);
    let transitions = engine.ingest(&vl);
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].value, 91.0);
}

// ── Rule matcher ──

#[test]
fn matcher_merges_default_and_host_sections_in_order() {
    let yaml = r#"
thresholds:
  hosts:
    default:
      'cpu\.load': { hits: 1, warn: { max: 80 } }
      'memory': { hits: 1, warn: { max: 90 } }
    'web\d+':
      'cpu\.load': { hits: 5, warn: { max: 50 } }
    'db\d+': ~
"#;
    let config: ThresholdConfig = serde_yaml::from_str(yaml).unwrap();
    let matcher = RuleMatcher::new(&config.thresholds).unwrap();
    assert_eq!(matcher.section_count(), 2);
    assert_eq!(matcher.rule_count(), 3);

    let web = matcher.candidates("web01");
    let patterns: Vec<&str> = web.iter().map(|e| e.pattern.as_str()).collect();
    assert_eq!(patterns, vec!["cpu\\.load", "memory"]);
    assert_eq!(web[0].rule.hits, 5);

    let other = matcher.candidates("mail01");
    assert_eq!(other[0].rule.hits, 1);

    let db = matcher.candidates("db01");
    assert_eq!(db.len(), 2);
}

#[test]
fn matcher_merges_each_host_once() {
    let thresholds = single_host("web", vec![("cpu", cpu_rule(1)), ("load", cpu_rule(1))]);
    let matcher = RuleMatcher::new(&thresholds).unwrap();

    let first = matcher.candidates("web01");
    let again = matcher.candidates("web01");
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.len(), 2);

    let other = matcher.candidates("db01");
    assert!(!Arc::ptr_eq(&first, &other));
    assert!(other.is_empty());
}

#[test]
fn matcher_patterns_are_prefix_anchored() {
    let thresholds = single_host("web", vec![("load", cpu_rule(1))]);
    let matcher = RuleMatcher::new(&thresholds).unwrap();
    assert_eq!(matcher.matching("web01", "load.load").len(), 1);
    assert!(matcher.matching("web01", "cpu.load").is_empty());
    assert!(matcher.matching("backweb", "load.load").is_empty());
}

#[test]
fn matcher_unmatched_input_is_ignored() {
    let engine = engine_with(cpu_rule(1));
    let vl = ValueList::new("web01", "memory", "memory", vec![1e9]);
    assert!(engine.ingest(&vl).is_empty());
    assert!(engine.store().is_empty());
}

#[test]
fn matcher_rejects_invalid_patterns() {
    let bad_host = single_host("web[", vec![("cpu", cpu_rule(1))]);
    assert!(matches!(
        RuleMatcher::new(&bad_host),
        Err(AlertError::InvalidHostPattern { .. })
    ));

    let bad_metric = single_host("default", vec![("cpu(", cpu_rule(1))]);
    let err = RuleMatcher::new(&bad_metric).unwrap_err();
    assert!(matches!(err, AlertError::InvalidMetricPattern { .. }));
    assert!(err.to_string().contains("cpu("), "error was {err}");
}

#[test]
fn multiple_matching_rules_are_evaluated_independently() {
    let thresholds = single_host(
        "default",
        vec![("cpu", cpu_rule(1)), ("cpu\\.load", cpu_rule(3))],
    );
    let engine = ThresholdEngine::from_thresholds(&thresholds).unwrap();

    let first = engine.ingest(&load_vl("web01", 90.0));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].pattern, "cpu");

    engine.ingest(&load_vl("web01", 90.0));
    let third = engine.ingest(&load_vl("web01", 90.0));
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].pattern, "cpu\\.load");
    assert_eq!(engine.store().len(), 2);
}

// ── Concurrency ──

#[test]
fn concurrent_ingest_on_one_key_fires_a_single_edge() {
    let engine = Arc::new(engine_with(cpu_rule(1)));
    let fired: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                s.spawn(move || {
                    (0..50)
                        .map(|_| engine.ingest(&load_vl("web01", 99.0)).len())
                        .sum::<usize>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    assert_eq!(fired, 1);

    let key = ObservationKey::new("web01", "cpu.load", "cpu\\.load");
    assert_eq!(engine.store().get(&key).unwrap().checks(), 400);
}

#[test]
fn concurrent_ingest_on_distinct_keys_is_independent() {
    let engine = Arc::new(engine_with(cpu_rule(2)));
    std::thread::scope(|s| {
        for i in 0..4 {
            let engine = Arc::clone(&engine);
            s.spawn(move || {
                let host = format!("web{i:02}");
                let got = feed(&engine, &host, &[90.0, 90.0, 50.0, 50.0]);
                assert_eq!(
                    got,
                    vec![None, Some(Direction::Violating), None, Some(Direction::Clearing)]
                );
            });
        }
    });
    assert_eq!(engine.store().len(), 4);
}

// ── Stats ──

#[test]
fn report_stats_only_for_reporting_rules() {
    let thresholds = single_host(
        "default",
        vec![
            (
                "cpu\\.load",
                ThresholdRule {
                    report: true,
                    name: Some("cpu_load".into()),
                    ..cpu_rule(3)
                },
            ),
            ("memory", cpu_rule(1)),
        ],
    );
    let engine = ThresholdEngine::from_thresholds(&thresholds).unwrap();
    engine.ingest(&load_vl("web01", 90.0));
    engine.ingest(&ValueList::new("web01", "memory", "", vec![99.0]));

    let stats = engine.report_stats();
    assert_eq!(stats.len(), 2);
    assert!(stats.iter().all(|vl| vl.plugin == STATS_PLUGIN));
    assert!(stats.iter().all(|vl| vl.plugin_instance == "cpu_load"));
    let hits = stats.iter().find(|vl| vl.type_name == "hits").unwrap();
    assert_eq!(hits.values, vec![1.0]);
    let status = stats.iter().find(|vl| vl.type_name == "status").unwrap();
    assert_eq!(status.values, vec![1.0]);
}

#[test]
fn thresholds_count_rules_across_sections() {
    let thresholds = single_host("default", vec![("a", cpu_rule(1)), ("b", cpu_rule(1))]);
    assert_eq!(thresholds.rule_count(), 2);
}
