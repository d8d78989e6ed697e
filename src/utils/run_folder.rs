use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn default_run_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// A run folder under `out_root` that does not collide with previous runs:
/// `<out_root>/<run_id>`, falling back to `_01`, `_02`, ... suffixes.
pub fn make_unique_run_dir(out_root: &Path, run_id: &str) -> PathBuf {
    let base = out_root.join(run_id);
    if !base.exists() {
        return base;
    }
    for i in 1..1000 {
        let candidate = out_root.join(format!("{}_{:02}", run_id, i));
        if !candidate.exists() {
            return candidate;
        }
    }
    out_root.join(format!("{}_{}", run_id, Local::now().format("%f")))
}

/// Provenance record written next to a run's outputs so a reviewed artifact
/// can always be traced back to the invocation that produced it.
#[derive(Debug, Serialize)]
pub struct RunInfo {
    pub run_id: String,
    pub run_dir: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_csv: Option<String>,
}

impl RunInfo {
    pub fn new(run_dir: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_dir: run_dir.display().to_string(),
            created_at: Local::now().to_rfc3339(),
            input: None,
            review_csv: None,
            suggested_csv: None,
            final_csv: None,
        }
    }
}

pub fn write_run_info(run_dir: &Path, info: &RunInfo) -> Result<PathBuf> {
    let path = run_dir.join("RUN_INFO.json");
    let json = serde_json::to_string_pretty(info).context("Failed to serialize run info")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_run_dir_appends_counter() {
        let tmp = TempDir::new().unwrap();
        let first = make_unique_run_dir(tmp.path(), "run");
        assert_eq!(first, tmp.path().join("run"));
        fs::create_dir_all(&first).unwrap();
        let second = make_unique_run_dir(tmp.path(), "run");
        assert_eq!(second, tmp.path().join("run_01"));
        fs::create_dir_all(&second).unwrap();
        let third = make_unique_run_dir(tmp.path(), "run");
        assert_eq!(third, tmp.path().join("run_02"));
    }

    #[test]
    fn test_run_info_round_trips_as_json() {
        let tmp = TempDir::new().unwrap();
        let mut info = RunInfo::new(tmp.path());
        info.input = Some("input.csv".to_string());
        let path = write_run_info(tmp.path(), &info).unwrap();
        let raw = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["input"], "input.csv");
        assert!(value.get("final_csv").is_none());
    }
}
