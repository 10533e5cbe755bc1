// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fibonacci-lattice camera sampling over the upper hemisphere

use crate::utils::{deg_to_rad, rad_to_deg};
use nalgebra::{Matrix4, Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Radius of the normalized asset the projection is fitted to
pub const MODEL_RADIUS: f32 = 1.0;
/// Extra field of view added around the fitted cone, in degrees
pub const FOV_MARGIN_DEG: f32 = 5.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

const MIN_JITTERED_Y: f32 = 0.01;
const POLE_COSINE: f32 = 0.99;

/// One camera pose. Index 0 is the top pole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSample {
    pub index: usize,
    pub position: Vector3<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

/// Sampler parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSampler {
    pub count: usize,
    pub radius: f32,
    pub aspect: f32,
    pub jitter: f32,
}

impl ViewSampler {
    pub fn new(count: usize, radius: f32, aspect: f32) -> Self {
        Self {
            count,
            radius,
            aspect,
            jitter: 0.0,
        }
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    /// Generate the regular lattice. The jitter setting is ignored.
    pub fn generate_regular(&self) -> Vec<CameraSample> {
        (0..self.count)
            .map(|i| {
                let (y, theta) = self.lattice_point(i);
                self.build_sample(i, y, theta)
            })
            .collect()
    }

    /// Generate samples, drawing jitter from `rng` when `jitter > 0`.
    /// A seeded generator makes the output reproducible.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<CameraSample> {
        if self.jitter <= 0.0 {
            return self.generate_regular();
        }

        let j = self.jitter;
        (0..self.count)
            .map(|i| {
                let (y, theta) = self.lattice_point(i);
                let jitter_y: f32 = rng.gen_range(-j..=j);
                let jitter_theta: f32 = rng.gen_range(-j..=j) * std::f32::consts::TAU;

                let y = (y + jitter_y).clamp(MIN_JITTERED_Y, 1.0);
                self.build_sample(i, y, theta + jitter_theta)
            })
            .collect()
    }

    /// Vertical field of view in degrees, including the margin
    pub fn field_of_view_deg(&self) -> f32 {
        adaptive_fov_deg(MODEL_RADIUS, self.radius) + FOV_MARGIN_DEG
    }

    /// Projection shared by every sample
    pub fn projection(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(
            self.aspect,
            deg_to_rad(self.field_of_view_deg()),
            Z_NEAR,
            Z_FAR,
        )
    }

    fn lattice_point(&self, i: usize) -> (f32, f32) {
        let y = if self.count > 1 {
            1.0 - i as f32 / (self.count - 1) as f32
        } else {
            1.0
        };
        (y, i as f32 * golden_angle())
    }

    fn build_sample(&self, index: usize, y: f32, theta: f32) -> CameraSample {
        let radius_at_y = (1.0 - y * y).max(0.0).sqrt();
        let unit = Vector3::new(theta.cos() * radius_at_y, y, theta.sin() * radius_at_y);
        let position = unit * self.radius;

        CameraSample {
            index,
            position,
            view: look_at_origin(&position),
            projection: self.projection(),
        }
    }
}

/// Golden angle in radians, `π(3 − √5)`
pub fn golden_angle() -> f32 {
    std::f32::consts::PI * (3.0 - 5.0_f32.sqrt())
}

/// Full field of view (degrees) of a cone that just encloses a sphere of
/// `model_radius` seen from `distance`
pub fn adaptive_fov_deg(model_radius: f32, distance: f32) -> f32 {
    if distance <= model_radius {
        return 90.0;
    }
    rad_to_deg((model_radius / distance).asin()) * 2.0
}

/// Right-handed look-at toward the origin with a pole-safe up vector
pub fn look_at_origin(position: &Vector3<f32>) -> Matrix4<f32> {
    let eye = Point3::from(*position);
    let target = Point3::origin();

    let forward = (target - eye).normalize();
    let mut up = Vector3::y();
    if forward.dot(&up).abs() > POLE_COSINE {
        up = Vector3::z();
    }

    Matrix4::look_at_rh(&eye, &target, &up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_golden_angle() {
        assert_relative_eq!(golden_angle(), 2.399_963, epsilon = 1e-5);
    }

    #[test]
    fn test_adaptive_fov() {
        assert_relative_eq!(adaptive_fov_deg(1.0, 2.0), 60.0, epsilon = 1e-3);
        assert_eq!(adaptive_fov_deg(1.0, 0.5), 90.0);
    }

    #[test]
    fn test_single_sample_is_pole() {
        let samples = ViewSampler::new(1, 2.0, 1.0).generate_regular();
        assert_eq!(samples.len(), 1);
        assert_relative_eq!(samples[0].position.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_count() {
        assert!(ViewSampler::new(0, 2.0, 1.0).generate_regular().is_empty());
    }

    #[test]
    fn test_pole_view_is_finite() {
        let samples = ViewSampler::new(8, 2.0, 1.0).generate_regular();
        assert!(samples[0].view.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_positions_lie_on_sphere() {
        let samples = ViewSampler::new(16, 3.0, 1.5).generate_regular();
        for s in &samples {
            assert_relative_eq!(s.position.norm(), 3.0, epsilon = 1e-4);
            assert!(s.position.y >= -1e-6);
        }
    }
}
