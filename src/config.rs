// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Evaluation configuration (TOML with environment overrides)

use crate::metrics::SilhouetteThresholds;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "viewmetrics.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub render: RenderConfig,
    pub sampling: SamplingConfig,
    pub timing: TimingConfig,
    pub silhouette: SilhouetteConfig,
    pub paths: PathsConfig,
}

/// Offscreen resolution shared by both variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub view_count: usize,
    /// Camera distance from the origin
    pub radius: f32,
    /// Random offset applied to each view, 0 for the regular layout
    pub jitter: f32,
    /// Fixed seed for reproducible jitter
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            view_count: 64,
            radius: 2.0,
            jitter: 0.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum time spent on each view
    pub dwell_ms: u64,
    /// Sleep between ticks
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilhouetteConfig {
    pub depth_threshold: f32,
    pub normal_threshold: f32,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        let t = SilhouetteThresholds::default();
        Self {
            depth_threshold: t.depth,
            normal_threshold: t.normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub assets_root: PathBuf,
    pub output_root: PathBuf,
    /// Reference variants, relative to `assets_root`
    pub reference_dir: PathBuf,
    /// Candidate variants, relative to `assets_root`
    pub candidate_dir: PathBuf,
    pub environment_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            output_root: PathBuf::from("output"),
            reference_dir: PathBuf::from("refmodel"),
            candidate_dir: PathBuf::from("optmodel"),
            environment_dir: PathBuf::from("hdrtextures"),
        }
    }
}

impl EvaluationConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EvaluationConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `viewmetrics.toml` when present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `VIEWMETRICS_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(output) = std::env::var("VIEWMETRICS_OUTPUT_DIR") {
            self.paths.output_root = PathBuf::from(output);
        }

        if let Ok(assets) = std::env::var("VIEWMETRICS_ASSETS_DIR") {
            self.paths.assets_root = PathBuf::from(assets);
        }

        if let Ok(views) = std::env::var("VIEWMETRICS_VIEWS") {
            self.sampling.view_count = views
                .parse()
                .with_context(|| format!("VIEWMETRICS_VIEWS is not a count: {}", views))?;
        }

        if let Ok(seed) = std::env::var("VIEWMETRICS_SEED") {
            self.sampling.seed = Some(
                seed.parse()
                    .with_context(|| format!("VIEWMETRICS_SEED is not a u64: {}", seed))?,
            );
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.render.width == 0 || self.render.height == 0 {
            bail!(
                "render resolution must be non-zero, got {}x{}",
                self.render.width,
                self.render.height
            );
        }
        if self.sampling.view_count == 0 {
            bail!("view_count must be at least 1");
        }
        if !(self.sampling.radius > 0.0) {
            bail!("camera radius must be positive, got {}", self.sampling.radius);
        }
        if !(self.sampling.jitter >= 0.0) {
            bail!("jitter must be non-negative, got {}", self.sampling.jitter);
        }
        Ok(())
    }

    pub fn thresholds(&self) -> SilhouetteThresholds {
        SilhouetteThresholds {
            depth: self.silhouette.depth_threshold,
            normal: self.silhouette.normal_threshold,
        }
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.timing.dwell_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.timing.frame_interval_ms)
    }

    pub fn aspect(&self) -> f32 {
        self.render.width as f32 / self.render.height.max(1) as f32
    }

    pub fn reference_root(&self) -> PathBuf {
        self.paths.assets_root.join(&self.paths.reference_dir)
    }

    pub fn candidate_root(&self) -> PathBuf {
        self.paths.assets_root.join(&self.paths.candidate_dir)
    }

    pub fn environment_root(&self) -> PathBuf {
        self.paths.assets_root.join(&self.paths.environment_dir)
    }
}
