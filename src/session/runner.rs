// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Run one reference/candidate pair through every phase

use crate::config::EvaluationConfig;
use crate::output::FsSink;
use crate::pipeline::{EvaluationPipeline, Phase, PhaseSummary, PipelineSettings};
use crate::render::{AssetCache, Environment, SoftwareRenderer};
use crate::sampling::{CameraSample, ViewSampler};
use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Two variants of the same asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    pub name: String,
    pub reference: PathBuf,
    pub candidate: PathBuf,
}

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub asset: String,
    pub view_count: usize,
    pub reference_sha256: String,
    pub candidate_sha256: String,
    pub phases: Vec<PhaseSummary>,
    /// Color PSNR in dB per view, `None` where the measurement failed
    #[serde(default)]
    pub view_psnr: Vec<Option<f64>>,
    pub duration_ms: u64,
}

impl SessionReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseSummary> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Views whose measurement failed, over all phases
    pub fn failed_views(&self) -> usize {
        self.phases.iter().map(|p| p.failed_views).sum()
    }
}

/// Camera views for a session. Jittered layouts use the configured seed when
/// there is one.
pub fn sample_views(config: &EvaluationConfig) -> Vec<CameraSample> {
    let sampling = &config.sampling;
    let sampler = ViewSampler::new(sampling.view_count, sampling.radius, config.aspect())
        .with_jitter(sampling.jitter);

    let mut rng = match sampling.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    sampler.generate(&mut rng)
}

/// Evaluate `pair` and write its artifacts under the configured output root
pub fn run_session(
    config: &EvaluationConfig,
    pair: &AssetPair,
    cache: &mut AssetCache,
    environment: &Environment,
) -> Result<SessionReport> {
    config.validate()?;
    let start = Instant::now();

    let reference = cache
        .load(&pair.reference)
        .with_context(|| format!("Failed to load reference for '{}'", pair.name))?;
    let candidate = cache
        .load(&pair.candidate)
        .with_context(|| format!("Failed to load candidate for '{}'", pair.name))?;
    let reference_sha256 = file_sha256(&pair.reference)?;
    let candidate_sha256 = file_sha256(&pair.candidate)?;

    let views = sample_views(config);
    let view_count = views.len();

    let settings = PipelineSettings {
        asset_name: pair.name.clone(),
        width: config.render.width,
        height: config.render.height,
        dwell: config.dwell(),
        output_root: config.paths.output_root.clone(),
        thresholds: config.thresholds(),
    };
    let backend = SoftwareRenderer::new(
        config.render.width,
        config.render.height,
        reference,
        candidate,
        environment.clone(),
    )
    .with_thresholds(config.thresholds());
    let sink = FsSink::new(&config.paths.output_root);

    let mut pipeline = EvaluationPipeline::new(settings, views, backend, sink, Instant::now())?;
    let frame_interval = config.frame_interval();
    let mut phases = Vec::new();
    let mut view_psnr = vec![None; view_count];

    while let Some(report) = pipeline.tick(Instant::now()) {
        if report.recorded && report.phase == Phase::ColorFidelity {
            view_psnr[report.view] = report.psnr;
        }
        if let Some(summary) = report.completed {
            phases.push(summary);
        }
        if !frame_interval.is_zero() && !pipeline.is_finished() {
            std::thread::sleep(frame_interval);
        }
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!("Finished '{}' in {} ms", pair.name, duration_ms);

    Ok(SessionReport {
        asset: pair.name.clone(),
        view_count,
        reference_sha256,
        candidate_sha256,
        phases,
        view_psnr,
        duration_ms,
    })
}

/// SHA-256 of a file's bytes, hex encoded
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sha256() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_seeded_jitter_reproducible() {
        let mut config = EvaluationConfig::default();
        config.sampling.view_count = 8;
        config.sampling.jitter = 0.1;
        config.sampling.seed = Some(42);

        let a = sample_views(&config);
        let b = sample_views(&config);
        assert_eq!(a.len(), 8);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.position, y.position);
        }
    }

    #[test]
    fn test_missing_asset_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = EvaluationConfig::default();
        config.paths.output_root = dir.path().join("out");

        let pair = AssetPair {
            name: "ghost".to_string(),
            reference: dir.path().join("ref.stl"),
            candidate: dir.path().join("cand.stl"),
        };
        let mut cache = AssetCache::new();
        assert!(run_session(&config, &pair, &mut cache, &Environment::default()).is_err());
        assert!(!config.paths.output_root.exists());
    }
}
