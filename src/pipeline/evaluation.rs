// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The evaluation state machine.
//!
//! One call to [`EvaluationPipeline::tick`] measures the current view of the
//! current phase. The view index advances once the dwell time has elapsed,
//! and the phase advances when the view index wraps around.

use super::backend::{ArtifactSink, MetricRow, RenderBackend, Variant};
use super::phase::{BufferKind, Captured, MeasureContext, Measurement, Phase, PhaseEntry};
use crate::metrics::SilhouetteThresholds;
use crate::sampling::CameraSample;
use anyhow::{bail, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Fixed inputs for one session
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub asset_name: String,
    pub width: u32,
    pub height: u32,
    /// Time spent on each view before moving on
    pub dwell: Duration,
    pub output_root: PathBuf,
    pub thresholds: SilhouetteThresholds,
}

/// Phase-level result, produced when a phase completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub views: usize,
    pub mean_error: f64,
    /// Only for the color phase
    pub mean_psnr: Option<f64>,
    pub failed_views: usize,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub phase: Phase,
    pub view: usize,
    pub error: f64,
    /// PSNR in dB of this view, for phases that compute one
    pub psnr: Option<f64>,
    /// True the first time this view was measured in this phase
    pub recorded: bool,
    /// Set on the tick that closed a phase
    pub completed: Option<PhaseSummary>,
}

/// Render, measure and record loop over all views and phases
pub struct EvaluationPipeline<B: RenderBackend, S: ArtifactSink> {
    settings: PipelineSettings,
    views: Vec<CameraSample>,
    backend: B,
    sink: S,

    phase: Phase,
    view_index: usize,
    last_advance: Instant,

    accumulator: f64,
    psnr_accumulator: f64,
    failed_views: usize,
    last_saved: Option<usize>,
    phase_dir: PathBuf,
}

impl<B: RenderBackend, S: ArtifactSink> EvaluationPipeline<B, S> {
    /// Start a session in the color phase. `now` is the dwell time origin.
    pub fn new(
        settings: PipelineSettings,
        views: Vec<CameraSample>,
        backend: B,
        mut sink: S,
        now: Instant,
    ) -> Result<Self> {
        if views.is_empty() {
            bail!("evaluation needs at least one camera view");
        }
        if settings.width == 0 || settings.height == 0 {
            bail!(
                "invalid render resolution {}x{}",
                settings.width,
                settings.height
            );
        }

        let phase = Phase::ColorFidelity;
        let phase_dir = phase_dir(&settings, phase);
        sink.begin_phase(&settings.asset_name, phase, &phase_dir)?;

        info!(
            "Evaluating '{}' over {} views",
            settings.asset_name,
            views.len()
        );

        Ok(Self {
            settings,
            views,
            backend,
            sink,
            phase,
            view_index: 0,
            last_advance: now,
            accumulator: 0.0,
            psnr_accumulator: 0.0,
            failed_views: 0,
            last_saved: None,
            phase_dir,
        })
    }

    /// Advance the session by one frame. Returns `None` once finished.
    pub fn tick(&mut self, now: Instant) -> Option<TickReport> {
        let entry = self.phase.entry()?;
        let view = self.view_index;

        let measurement = match self.measure(entry) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(
                    "[{}] view {} of '{}': {:#}",
                    entry.phase.as_str(),
                    view,
                    self.settings.asset_name,
                    e
                );
                None
            }
        };

        let error = measurement.as_ref().map_or(0.0, |m| m.error);
        let psnr = measurement.as_ref().and_then(|m| m.psnr);
        if let Some(m) = &measurement {
            self.backend.present_heatmap(&m.heatmap);
        }

        let recorded = self.last_saved != Some(view);
        if recorded {
            self.record(entry, view, measurement.as_ref());
        }

        let mut completed = None;
        if now.saturating_duration_since(self.last_advance) >= self.settings.dwell {
            self.last_advance = now;
            self.view_index += 1;
            if self.view_index >= self.views.len() {
                self.view_index = 0;
                completed = Some(self.complete_phase(entry));
            }
        }

        Some(TickReport {
            phase: entry.phase,
            view,
            error,
            psnr,
            recorded,
            completed,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    pub fn view_index(&self) -> usize {
        self.view_index
    }

    /// Running error sum of the current phase
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn views(&self) -> &[CameraSample] {
        &self.views
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Directory receiving screenshots for the current phase
    pub fn phase_dir(&self) -> &Path {
        &self.phase_dir
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (B, S) {
        (self.backend, self.sink)
    }

    fn measure(&mut self, entry: &PhaseEntry) -> Result<Measurement> {
        let view = &self.views[self.view_index];
        let reference = capture(&mut self.backend, view, Variant::Reference, entry)?;
        let candidate = capture(&mut self.backend, view, Variant::Candidate, entry)?;

        let expected = (self.settings.width, self.settings.height);
        reference.check_size(expected)?;
        candidate.check_size(expected)?;

        let ctx = MeasureContext {
            thresholds: self.settings.thresholds,
        };
        Ok((entry.measure)(&reference, &candidate, &ctx)?)
    }

    /// Accumulate and persist the first measurement of a view
    fn record(&mut self, entry: &PhaseEntry, view: usize, measurement: Option<&Measurement>) {
        match measurement {
            Some(m) => {
                self.accumulator += m.error;
                self.psnr_accumulator += m.psnr.unwrap_or(0.0);
                debug!("[{}] view {}: {:.6}", entry.phase.as_str(), view, m.error);
            }
            None => self.failed_views += 1,
        }

        // A failed screenshot must not drop the row
        if let Err(e) = self.save_screenshot(view) {
            warn!(
                "[{}] failed to save screenshot of view {} of '{}': {:#}",
                entry.phase.as_str(),
                view,
                self.settings.asset_name,
                e
            );
        }

        let row = MetricRow {
            asset: self.settings.asset_name.clone(),
            view,
            error: measurement.map_or(0.0, |m| m.error),
        };
        if let Err(e) = self.sink.append_row(entry.table, &row) {
            warn!(
                "[{}] failed to append row for view {} of '{}': {:#}",
                entry.phase.as_str(),
                view,
                self.settings.asset_name,
                e
            );
        }

        self.last_saved = Some(view);
    }

    fn save_screenshot(&mut self, view: usize) -> Result<()> {
        let frame = self.backend.capture_frame()?;
        if frame.channels() != 3 {
            bail!("captured frame has {} channels, expected RGB", frame.channels());
        }

        let image = frame.flipped_vertically();
        let path = self.phase_dir.join(format!("view_{}.png", view));
        self.sink
            .save_image(&path, image.as_slice(), image.width(), image.height())
    }

    fn complete_phase(&mut self, entry: &PhaseEntry) -> PhaseSummary {
        let views = self.views.len();
        let mean_error = self.accumulator / views as f64;
        let mean_psnr = entry
            .buffers
            .contains(&BufferKind::Color)
            .then(|| self.psnr_accumulator / views as f64);

        match mean_psnr {
            Some(psnr) => info!(
                "[RESULT] '{}' {}: {:.6} (PSNR {:.2} dB)",
                self.settings.asset_name, entry.label, mean_error, psnr
            ),
            None => info!(
                "[RESULT] '{}' {}: {:.6}",
                self.settings.asset_name, entry.label, mean_error
            ),
        }

        let summary = PhaseSummary {
            phase: entry.phase,
            views,
            mean_error,
            mean_psnr,
            failed_views: self.failed_views,
        };

        self.accumulator = 0.0;
        self.psnr_accumulator = 0.0;
        self.failed_views = 0;
        self.last_saved = None;
        self.phase = entry.next;

        if self.phase.is_finished() {
            info!("All metrics calculated for '{}'", self.settings.asset_name);
        } else {
            info!(
                "Phase switch: {} -> {}",
                entry.phase.as_str(),
                self.phase.as_str()
            );
            self.phase_dir = phase_dir(&self.settings, self.phase);
            if let Err(e) =
                self.sink
                    .begin_phase(&self.settings.asset_name, self.phase, &self.phase_dir)
            {
                warn!("failed to prepare {}: {:#}", self.phase_dir.display(), e);
            }
        }

        summary
    }
}

fn phase_dir(settings: &PipelineSettings, phase: Phase) -> PathBuf {
    let subdir = phase.entry().map_or("finished", |s| s.subdir);
    settings
        .output_root
        .join(&settings.asset_name)
        .join(subdir)
}

fn capture<B: RenderBackend>(
    backend: &mut B,
    view: &CameraSample,
    variant: Variant,
    entry: &PhaseEntry,
) -> Result<Captured> {
    let target = backend.render_variant(view, variant, entry.phase)?;

    let mut captured = Captured::default();
    for kind in entry.buffers {
        match kind {
            BufferKind::Color => captured.color = Some(backend.read_color(&target)?),
            BufferKind::Normal => captured.normal = Some(backend.read_normal(&target)?),
            BufferKind::Depth => captured.depth = Some(backend.read_depth(&target)?),
        }
    }

    Ok(captured)
}
