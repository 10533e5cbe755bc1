// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch evaluation over an asset tree.
//!
//! ```text
//! <assets>/<reference_dir>/<name>/*.stl
//! <assets>/<candidate_dir>/<name>/*.stl
//! <assets>/<environment_dir>/*.hdr
//! ```

use super::runner::{run_session, AssetPair, SessionReport};
use crate::config::EvaluationConfig;
use crate::output::{init_consolidated_tables, BatchReport};
use crate::render::{AssetCache, Environment};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const ENVIRONMENT_EXTENSIONS: [&str; 4] = ["hdr", "exr", "png", "jpg"];

/// Pair up asset directories present under both variant roots, sorted by name
pub fn discover_pairs(config: &EvaluationConfig) -> Result<Vec<AssetPair>> {
    let reference_root = config.reference_root();
    let candidate_root = config.candidate_root();

    let entries = std::fs::read_dir(&reference_root)
        .with_context(|| format!("Failed to read {}", reference_root.display()))?;

    let mut pairs = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();

        let candidate_dir = candidate_root.join(&name);
        if !candidate_dir.is_dir() {
            warn!("Skipping '{}': no candidate directory", name);
            continue;
        }

        let reference = first_with_extension(&path, &["stl"]);
        let candidate = first_with_extension(&candidate_dir, &["stl"]);
        match (reference, candidate) {
            (Some(reference), Some(candidate)) => pairs.push(AssetPair {
                name,
                reference,
                candidate,
            }),
            _ => warn!("Skipping '{}': missing STL in one of the variants", name),
        }
    }

    pairs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pairs)
}

/// First environment image under the environment directory, if any
pub fn find_environment(config: &EvaluationConfig) -> Option<PathBuf> {
    let root = config.environment_root();
    if !root.is_dir() {
        return None;
    }
    first_with_extension(&root, &ENVIRONMENT_EXTENSIONS)
}

/// Evaluate every discovered pair. Sessions that fail to start are reported
/// as errors and the batch moves on.
pub fn run_batch(config: &EvaluationConfig) -> Result<BatchReport> {
    run_batch_with(config, |_, _| {})
}

/// [`run_batch`] with a callback after each asset
pub fn run_batch_with<F>(config: &EvaluationConfig, mut on_asset: F) -> Result<BatchReport>
where
    F: FnMut(&AssetPair, &Result<SessionReport>),
{
    config.validate()?;
    let pairs = discover_pairs(config)?;
    info!("Found {} asset pairs", pairs.len());

    let environment = match find_environment(config) {
        Some(path) => Environment::load(&path)?,
        None => {
            info!("No environment map found, using default ambient");
            Environment::default()
        }
    };

    init_consolidated_tables(&config.paths.output_root)?;

    let mut cache = AssetCache::new();
    let mut report = BatchReport::new();
    for pair in &pairs {
        let result = run_session(config, pair, &mut cache, &environment);
        on_asset(pair, &result);
        match result {
            Ok(session) => report.add_session(session),
            Err(e) => {
                warn!("'{}' failed: {:#}", pair.name, e);
                report.add_error(pair.name.clone(), format!("{:#}", e));
            }
        }
        // Variants are not shared across assets
        cache.clear();
    }

    Ok(report)
}

fn first_with_extension(dir: &Path, extensions: &[&str]) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> EvaluationConfig {
        let mut config = EvaluationConfig::default();
        config.paths.assets_root = root.to_path_buf();
        config.paths.output_root = root.join("output");
        config
    }

    #[test]
    fn test_discover_pairs_skips_incomplete() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());

        for name in ["b_chair", "a_lamp", "orphan"] {
            let d = config.reference_root().join(name);
            fs::create_dir_all(&d).unwrap();
            fs::write(d.join("model.stl"), b"").unwrap();
        }
        for name in ["b_chair", "a_lamp"] {
            let d = config.candidate_root().join(name);
            fs::create_dir_all(&d).unwrap();
            fs::write(d.join("model.stl"), b"").unwrap();
        }

        let pairs = discover_pairs(&config).unwrap();
        let names: Vec<_> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a_lamp", "b_chair"]);
    }

    #[test]
    fn test_find_environment() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        assert!(find_environment(&config).is_none());

        fs::create_dir_all(config.environment_root()).unwrap();
        fs::write(config.environment_root().join("notes.txt"), b"").unwrap();
        fs::write(config.environment_root().join("sky.hdr"), b"").unwrap();
        assert_eq!(
            find_environment(&config),
            Some(config.environment_root().join("sky.hdr"))
        );
    }

    #[test]
    fn test_missing_reference_root() {
        let dir = TempDir::new().unwrap();
        assert!(discover_pairs(&config_for(dir.path())).is_err());
    }
}
