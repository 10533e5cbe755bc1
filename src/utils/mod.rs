// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared helpers

pub mod math;

pub use math::{deg_to_rad, rad_to_deg, smoothstep, triangle_normal};
