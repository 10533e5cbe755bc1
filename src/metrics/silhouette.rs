// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Silhouette masks from depth and normal discontinuities.
//!
//! A cross-shaped finite difference over the four direct neighbours is
//! thresholded independently for depth and for normals. This is an edge
//! detector over already rendered buffers, not a geometric silhouette.

use crate::buffer::{DepthBuffer, Mask, NormalBuffer};
use crate::error::MetricError;
use serde::{Deserialize, Serialize};

pub const EDGE: u8 = 255;

/// Gradient thresholds. Absolute values, independent of resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteThresholds {
    pub depth: f32,
    pub normal: f32,
}

impl Default for SilhouetteThresholds {
    fn default() -> Self {
        Self {
            depth: 0.01,
            normal: 0.1,
        }
    }
}

/// Extract a binary mask (0 / 255). The one-pixel border is always 0.
pub fn extract_silhouette(
    depth: &DepthBuffer,
    normal: &NormalBuffer,
    thresholds: SilhouetteThresholds,
) -> Result<Mask, MetricError> {
    if depth.dimensions() != normal.dimensions() {
        return Err(MetricError::SizeMismatch {
            what: "silhouette depth/normal",
            reference: depth.dimensions(),
            candidate: normal.dimensions(),
        });
    }
    check_channels("silhouette depth", depth.channels(), 1)?;
    check_channels("silhouette normal", normal.channels(), 3)?;

    let (width, height) = depth.dimensions();
    let mut mask = Mask::new(width, height, 1);
    if width < 3 || height < 3 {
        return Ok(mask);
    }

    let d = |x: u32, y: u32| depth.at(x, y)[0];
    let n = |x: u32, y: u32| normal.at(x, y);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let grad_depth =
                (d(x - 1, y) - d(x + 1, y)).abs() + (d(x, y + 1) - d(x, y - 1)).abs();
            let grad_normal =
                distance(n(x - 1, y), n(x + 1, y)) + distance(n(x, y + 1), n(x, y - 1));

            if grad_depth > thresholds.depth || grad_normal > thresholds.normal {
                mask.set(x, y, &[EDGE]);
            }
        }
    }

    Ok(mask)
}

pub(crate) fn check_channels(
    what: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), MetricError> {
    if actual != expected {
        return Err(MetricError::ChannelMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

fn distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_buffers_have_no_edges() {
        let depth = DepthBuffer::filled(16, 12, 1, 0.4);
        let normal = NormalBuffer::filled(16, 12, 3, 0.5);
        let mask = extract_silhouette(&depth, &normal, SilhouetteThresholds::default()).unwrap();
        assert!(mask.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_depth_step_marks_edge() {
        let mut depth = DepthBuffer::filled(8, 8, 1, 1.0);
        for y in 0..8 {
            for x in 4..8 {
                depth.set(x, y, &[0.5]);
            }
        }
        let normal = NormalBuffer::new(8, 8, 3);
        let mask = extract_silhouette(&depth, &normal, SilhouetteThresholds::default()).unwrap();

        // Pixels adjacent to the step see it through the left/right difference
        assert_eq!(mask.at(3, 4)[0], EDGE);
        assert_eq!(mask.at(4, 4)[0], EDGE);
        assert_eq!(mask.at(1, 4)[0], 0);
        assert_eq!(mask.at(6, 4)[0], 0);
        // Border stays clear
        assert_eq!(mask.at(3, 0)[0], 0);
        assert_eq!(mask.at(4, 7)[0], 0);
    }

    #[test]
    fn test_normal_step_marks_edge() {
        let depth = DepthBuffer::filled(6, 6, 1, 0.3);
        let mut normal = NormalBuffer::filled(6, 6, 3, 0.5);
        for x in 0..6 {
            for y in 3..6 {
                normal.set(x, y, &[0.5, 0.5, 1.0]);
            }
        }
        let mask = extract_silhouette(&depth, &normal, SilhouetteThresholds::default()).unwrap();
        assert_eq!(mask.at(2, 2)[0], EDGE);
        assert_eq!(mask.at(2, 3)[0], EDGE);
        assert_eq!(mask.at(2, 1)[0], 0);
    }

    #[test]
    fn test_tiny_buffers() {
        let depth = DepthBuffer::new(2, 2, 1);
        let normal = NormalBuffer::new(2, 2, 3);
        let mask = extract_silhouette(&depth, &normal, SilhouetteThresholds::default()).unwrap();
        assert_eq!(mask.pixel_count(), 4);
    }

    #[test]
    fn test_mismatched_inputs() {
        let depth = DepthBuffer::new(4, 4, 1);
        let normal = NormalBuffer::new(4, 5, 3);
        assert!(extract_silhouette(&depth, &normal, SilhouetteThresholds::default()).is_err());
    }

    #[test]
    fn test_wrong_channel_counts() {
        let normal = NormalBuffer::new(4, 4, 3);
        let err = extract_silhouette(
            &DepthBuffer::new(4, 4, 0),
            &normal,
            SilhouetteThresholds::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MetricError::ChannelMismatch {
                what: "silhouette depth",
                expected: 1,
                actual: 0,
            }
        );

        let depth = DepthBuffer::new(4, 4, 1);
        let flat_normal = NormalBuffer::new(4, 4, 1);
        assert!(extract_silhouette(&depth, &flat_normal, SilhouetteThresholds::default()).is_err());
    }
}
