#![allow(dead_code)]

use anyhow::Result;
use reacter_common::types::ValueList;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A config file and threshold file written into a fresh temp dir.
pub struct TestConfig {
    pub dir: TempDir,
    pub config_path: PathBuf,
}

impl TestConfig {
    pub fn config_path_str(&self) -> &str {
        self.config_path.to_str().unwrap_or_default()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Writes `reacter.toml` pointing at a relative `thresholds.yaml`.
pub fn write_config(extra_toml: &str, thresholds_yaml: &str) -> Result<TestConfig> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("reacter.toml");
    std::fs::write(
        &config_path,
        format!("threshold_file = \"thresholds.yaml\"\n{extra_toml}"),
    )?;
    std::fs::write(dir.path().join("thresholds.yaml"), thresholds_yaml)?;
    Ok(TestConfig { dir, config_path })
}

/// A cpu load rule that records every exec as `<state> <value>` lines in
/// `out`.
pub fn recording_thresholds(out: &Path, hits: u32) -> String {
    format!(
        r#"
thresholds:
  params:
    team: ops
  hosts:
    default:
      'cpu\.load':
        hits: {hits}
        exec: 'echo "$COLLECTD_THRESHOLD_STATE $COLLECTD_VALUE" >> {out}'
        warn: {{ max: 80, exec: true }}
        fail: {{ max: 95, exec: true }}
        okay: {{ exec: true }}
"#,
        out = out.display()
    )
}

pub fn load_vl(host: &str, value: f64) -> ValueList {
    ValueList::new(host, "cpu", "load", vec![value])
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
