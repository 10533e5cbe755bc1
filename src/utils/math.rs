// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::Vector3;

/// Unit normal of a triangle, or `None` when it is degenerate
pub fn triangle_normal(
    p0: &Vector3<f32>,
    p1: &Vector3<f32>,
    p2: &Vector3<f32>,
) -> Option<Vector3<f32>> {
    let n = (p1 - p0).cross(&(p2 - p0));
    if n.norm_squared() < 1e-12 {
        None
    } else {
        Some(n.normalize())
    }
}

/// Hermite step between two edges. `edge0 > edge1` yields a falling curve.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

/// Convert radians to degrees
pub fn rad_to_deg(rad: f32) -> f32 {
    rad * 180.0 / std::f32::consts::PI
}
