// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fidelity metrics, silhouette extraction and heatmaps

pub mod evaluator;
pub mod heatmap;
pub mod silhouette;

pub use evaluator::{
    color_fidelity, normal_fidelity, psnr_from_mse, silhouette_fidelity, ColorScore, MSE_FLOOR,
    PSNR_IDENTICAL,
};
pub use heatmap::{generate_heatmap, value_to_color, HeatmapSource};
pub use silhouette::{extract_silhouette, SilhouetteThresholds};
