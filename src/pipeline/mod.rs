// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Multi-phase evaluation pipeline

pub mod backend;
pub mod evaluation;
pub mod phase;

pub use backend::{ArtifactSink, MetricRow, RenderBackend, Variant};
pub use evaluation::{EvaluationPipeline, PhaseSummary, PipelineSettings, TickReport};
pub use phase::{
    BufferKind, Captured, MeasureContext, Measurement, Phase, PhaseEntry, PHASE_TABLE,
};
