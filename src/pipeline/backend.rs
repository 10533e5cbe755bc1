// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Collaborator interfaces: the rendering backend and the artifact sink

use super::phase::Phase;
use crate::buffer::{ColorBuffer, DepthBuffer, Heatmap, NormalBuffer};
use crate::sampling::CameraSample;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which asset variant to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Reference,
    Candidate,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Reference => "reference",
            Variant::Candidate => "candidate",
        }
    }
}

/// Draws one variant from one viewpoint and reads the result back.
///
/// Buffers use a bottom-up row order. Reads are synchronous.
pub trait RenderBackend {
    /// Handle to whatever was just drawn
    type Target;

    fn render_variant(
        &mut self,
        view: &CameraSample,
        variant: Variant,
        phase: Phase,
    ) -> Result<Self::Target>;

    fn read_color(&mut self, target: &Self::Target) -> Result<ColorBuffer>;

    fn read_normal(&mut self, target: &Self::Target) -> Result<NormalBuffer>;

    fn read_depth(&mut self, target: &Self::Target) -> Result<DepthBuffer>;

    /// Hand the latest heatmap over for on-screen composition
    fn present_heatmap(&mut self, heatmap: &Heatmap);

    /// The composed frame as currently displayed (RGB, bottom-up)
    fn capture_frame(&mut self) -> Result<ColorBuffer>;
}

/// One tabular record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub asset: String,
    pub view: usize,
    pub error: f64,
}

/// Receives screenshots and table rows
pub trait ArtifactSink {
    /// Prepare a fresh output directory and table handle for `phase`
    fn begin_phase(&mut self, asset: &str, phase: Phase, dir: &Path) -> Result<()>;

    /// Write an RGB image whose first row is the top of the picture
    fn save_image(&mut self, path: &Path, rgb: &[u8], width: u32, height: u32) -> Result<()>;

    /// Append a row to `table`. Unknown table names are skipped.
    fn append_row(&mut self, table: &str, row: &MetricRow) -> Result<()>;
}
