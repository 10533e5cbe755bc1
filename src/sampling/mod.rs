// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Camera viewpoint sampling

pub mod sampler;

pub use sampler::{adaptive_fov_deg, golden_angle, look_at_origin, CameraSample, ViewSampler};
