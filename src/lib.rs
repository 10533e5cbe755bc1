// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! View Metrics
//!
//! Multi-view fidelity evaluation for 3D assets. A reference and a candidate
//! variant are rendered from the same set of camera views, then compared on
//! color (MSE / PSNR), silhouette and surface normals. Every view produces a
//! heatmap screenshot and a metric row; every phase produces an average.

pub mod buffer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod sampling;
pub mod session;
pub mod utils;

pub use buffer::{ColorBuffer, DepthBuffer, Heatmap, Mask, NormalBuffer, PixelBuffer};
pub use config::EvaluationConfig;
pub use error::{AssetError, BufferError, MetricError};
pub use pipeline::{
    ArtifactSink, EvaluationPipeline, Phase, PhaseSummary, PipelineSettings, RenderBackend,
    Variant,
};
pub use render::{AssetCache, Environment, Mesh, SoftwareRenderer};
pub use sampling::{CameraSample, ViewSampler};
pub use session::{run_batch, run_session, AssetPair, SessionReport};
