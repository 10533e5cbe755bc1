// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Measurement phases and the transition table that drives them.
//!
//! Everything that differs between phases (buffers to read back, output
//! directory, table name, metric, successor) lives in [`PHASE_TABLE`].

use crate::buffer::{ColorBuffer, DepthBuffer, Heatmap, NormalBuffer};
use crate::error::MetricError;
use crate::metrics::{
    color_fidelity, extract_silhouette, generate_heatmap, normal_fidelity, silhouette_fidelity,
    HeatmapSource, SilhouetteThresholds,
};
use crate::metrics::silhouette::check_channels;
use serde::{Deserialize, Serialize};

/// Current stage of an evaluation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    ColorFidelity,
    Silhouette,
    NormalFidelity,
    Finished,
}

impl Phase {
    /// Table entry, `None` for [`Phase::Finished`]
    pub fn entry(self) -> Option<&'static PhaseEntry> {
        PHASE_TABLE.iter().find(|s| s.phase == self)
    }

    pub fn next(self) -> Phase {
        self.entry().map_or(Phase::Finished, |s| s.next)
    }

    pub fn is_finished(self) -> bool {
        self == Phase::Finished
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ColorFidelity => "color",
            Phase::Silhouette => "silhouette",
            Phase::NormalFidelity => "normal",
            Phase::Finished => "finished",
        }
    }

    /// Resolve a table name back to its phase
    pub fn from_table(table: &str) -> Option<Phase> {
        PHASE_TABLE.iter().find(|s| s.table == table).map(|s| s.phase)
    }
}

/// Buffers a phase needs from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Color,
    Normal,
    Depth,
}

/// Buffers read back for one variant
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub color: Option<ColorBuffer>,
    pub normal: Option<NormalBuffer>,
    pub depth: Option<DepthBuffer>,
}

impl Captured {
    pub fn color(&self) -> Result<&ColorBuffer, MetricError> {
        self.color
            .as_ref()
            .ok_or(MetricError::MissingBuffer { what: "color" })
    }

    pub fn normal(&self) -> Result<&NormalBuffer, MetricError> {
        self.normal
            .as_ref()
            .ok_or(MetricError::MissingBuffer { what: "normal" })
    }

    pub fn depth(&self) -> Result<&DepthBuffer, MetricError> {
        self.depth
            .as_ref()
            .ok_or(MetricError::MissingBuffer { what: "depth" })
    }

    /// Every captured buffer must match the session resolution and carry
    /// the channel count its kind implies (RGB color, XYZ normal, scalar depth)
    pub fn check_size(&self, expected: (u32, u32)) -> Result<(), MetricError> {
        let shapes = [
            ("color", self.color.as_ref().map(|b| (b.dimensions(), b.channels())), 3),
            ("normal", self.normal.as_ref().map(|b| (b.dimensions(), b.channels())), 3),
            ("depth", self.depth.as_ref().map(|b| (b.dimensions(), b.channels())), 1),
        ];
        for (what, shape, channels) in shapes {
            let Some((actual, actual_channels)) = shape else {
                continue;
            };
            if actual != expected {
                return Err(MetricError::UnexpectedSize {
                    what,
                    expected,
                    actual,
                });
            }
            check_channels(what, actual_channels, channels)?;
        }
        Ok(())
    }
}

/// Result of measuring one view
#[derive(Debug, Clone)]
pub struct Measurement {
    pub error: f64,
    pub psnr: Option<f64>,
    pub heatmap: Heatmap,
}

/// Inputs shared by every measurement in a session
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureContext {
    pub thresholds: SilhouetteThresholds,
}

pub type MeasureFn = fn(&Captured, &Captured, &MeasureContext) -> Result<Measurement, MetricError>;

/// One row of the transition table
pub struct PhaseEntry {
    pub phase: Phase,
    pub buffers: &'static [BufferKind],
    /// Screenshot subdirectory below `<output>/<asset>/`
    pub subdir: &'static str,
    /// Name passed to [`ArtifactSink::append_row`](super::ArtifactSink::append_row)
    pub table: &'static str,
    /// Label used when logging the phase average
    pub label: &'static str,
    pub measure: MeasureFn,
    pub next: Phase,
}

pub static PHASE_TABLE: [PhaseEntry; 3] = [
    PhaseEntry {
        phase: Phase::ColorFidelity,
        buffers: &[BufferKind::Color],
        subdir: "psnr",
        // Rows carry the per-view MSE. Per-view dB values are in `TickReport::psnr`.
        table: "PSNR",
        label: "Color Error (MSE)",
        measure: measure_color,
        next: Phase::Silhouette,
    },
    PhaseEntry {
        phase: Phase::Silhouette,
        buffers: &[BufferKind::Depth, BufferKind::Normal],
        subdir: "silhouette",
        table: "Silhouette",
        label: "Silhouette Error (MSE)",
        measure: measure_silhouette,
        next: Phase::NormalFidelity,
    },
    PhaseEntry {
        phase: Phase::NormalFidelity,
        buffers: &[BufferKind::Normal],
        subdir: "normal",
        table: "Normal",
        label: "Normal Error (MSE)",
        measure: measure_normal,
        next: Phase::Finished,
    },
];

fn measure_color(
    reference: &Captured,
    candidate: &Captured,
    _ctx: &MeasureContext,
) -> Result<Measurement, MetricError> {
    let (a, b) = (reference.color()?, candidate.color()?);
    let score = color_fidelity(a, b)?;
    let heatmap = generate_heatmap(HeatmapSource::Color {
        reference: a,
        candidate: b,
    })?;

    Ok(Measurement {
        error: score.mse,
        psnr: Some(score.psnr),
        heatmap,
    })
}

fn measure_silhouette(
    reference: &Captured,
    candidate: &Captured,
    ctx: &MeasureContext,
) -> Result<Measurement, MetricError> {
    let a = extract_silhouette(reference.depth()?, reference.normal()?, ctx.thresholds)?;
    let b = extract_silhouette(candidate.depth()?, candidate.normal()?, ctx.thresholds)?;
    let error = silhouette_fidelity(&a, &b)?;
    let heatmap = generate_heatmap(HeatmapSource::Silhouette {
        reference: &a,
        candidate: &b,
    })?;

    Ok(Measurement {
        error,
        psnr: None,
        heatmap,
    })
}

fn measure_normal(
    reference: &Captured,
    candidate: &Captured,
    _ctx: &MeasureContext,
) -> Result<Measurement, MetricError> {
    let (a, b) = (reference.normal()?, candidate.normal()?);
    let error = normal_fidelity(a, b)?;
    let heatmap = generate_heatmap(HeatmapSource::Normal {
        reference: a,
        candidate: b,
    })?;

    Ok(Measurement {
        error,
        psnr: None,
        heatmap,
    })
}
