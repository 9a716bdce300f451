//! Configuration discovery and effective settings resolution.
//!
//! krazy2view reads `krazy2view.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `working_dir`: the repository root
//! - `output`: `human`
//! - `chunk_size`: 4096 bytes per feed when replaying captured output
//! - `checkers`: unset (required for progress tracking)
//! - `reports`: none
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

const CONFIG_TOML: &str = "krazy2view.toml";
const CONFIG_YAML: [&str; 2] = ["krazy2view.yaml", "krazy2view.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `krazy2view.toml|yaml`.
pub struct ViewConfig {
    /// Directory krazy2 ran in; relative report paths resolve against it.
    pub working_dir: Option<String>,
    pub output: Option<String>,
    /// Number of checkers krazy2 runs, used to scale progress.
    pub checkers: Option<usize>,
    pub chunk_size: Option<usize>,
    /// Glob patterns of XML reports, relative to the repository root.
    #[serde(default)]
    pub reports: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub working_dir: PathBuf,
    pub output: String,
    pub checkers: Option<usize>,
    pub chunk_size: usize,
    pub reports: Vec<String>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `krazy2view.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join(CONFIG_TOML).exists() || CONFIG_YAML.iter().any(|y| cur.join(y).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `ViewConfig` from `krazy2view.toml` or `krazy2view.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<ViewConfig>> {
    let toml_path = root.join(CONFIG_TOML);
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).map_err(|e| Error::io(&toml_path, e))?;
        let cfg = toml::from_str(&s).map_err(|e| Error::Config {
            path: toml_path.clone(),
            message: e.to_string(),
        })?;
        debug!(path = %toml_path.display(), "loaded config");
        return Ok(Some(cfg));
    }
    for yml in CONFIG_YAML {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).map_err(|e| Error::io(&p, e))?;
            let cfg = serde_yaml::from_str(&s).map_err(|e| Error::Config {
                path: p.clone(),
                message: e.to_string(),
            })?;
            debug!(path = %p.display(), "loaded config");
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_working_dir: Option<&str>,
    cli_output: Option<&str>,
    cli_checkers: Option<usize>,
    cli_chunk_size: Option<usize>,
    cli_reports: &[String],
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let working_dir = match cli_working_dir.map(str::to_string).or(cfg.working_dir) {
        Some(dir) => repo_root.join(dir),
        None => repo_root.clone(),
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let chunk_size = cli_chunk_size
        .or(cfg.chunk_size)
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_CHUNK_SIZE);

    let reports = if cli_reports.is_empty() {
        cfg.reports
    } else {
        cli_reports.to_vec()
    };

    Ok(Effective {
        repo_root,
        config_found,
        working_dir,
        output,
        checkers: cli_checkers.or(cfg.checkers),
        chunk_size,
        reports,
    })
}

/// Expand report glob patterns relative to the repository root.
///
/// Results are sorted and deduplicated so runs are deterministic.
pub fn expand_reports(eff: &Effective) -> Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = Vec::new();
    for pat in &eff.reports {
        let abs = eff.repo_root.join(pat);
        let pattern = abs.to_string_lossy().to_string();
        let paths = glob::glob(&pattern).map_err(|e| Error::Pattern {
            pattern: pat.clone(),
            message: e.to_string(),
        })?;
        found.extend(paths.flatten());
    }
    found.sort();
    found.dedup();
    Ok(found)
}
