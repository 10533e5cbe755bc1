// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scalar fidelity metrics between a reference and a candidate buffer

use crate::buffer::{ColorBuffer, Mask, NormalBuffer, PixelBuffer};
use crate::error::MetricError;
use serde::{Deserialize, Serialize};

/// MSE below this is treated as identical
pub const MSE_FLOOR: f64 = 1e-10;
/// PSNR reported for identical images
pub const PSNR_IDENTICAL: f64 = 99.99;

/// Color fidelity of one view
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorScore {
    pub mse: f64,
    pub psnr: f64,
}

impl ColorScore {
    /// Score for a pair that could not be compared
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_identical(&self) -> bool {
        self.psnr == PSNR_IDENTICAL
    }
}

/// Mean squared error over all channel samples of two 8-bit images,
/// normalized to `[0, 1]`, plus the derived PSNR.
pub fn color_fidelity(
    reference: &ColorBuffer,
    candidate: &ColorBuffer,
) -> Result<ColorScore, MetricError> {
    check_pair("color", reference, candidate)?;

    let sum: f64 = reference
        .as_slice()
        .iter()
        .zip(candidate.as_slice())
        .map(|(&a, &b)| {
            let d = (a as f64 - b as f64) / 255.0;
            d * d
        })
        .sum();
    let mse = sum / reference.as_slice().len() as f64;

    if mse < MSE_FLOOR {
        return Ok(ColorScore {
            mse: 0.0,
            psnr: PSNR_IDENTICAL,
        });
    }

    Ok(ColorScore {
        mse,
        psnr: psnr_from_mse(mse),
    })
}

/// `10 * log10(1 / mse)` for signals in `[0, 1]`
pub fn psnr_from_mse(mse: f64) -> f64 {
    10.0 * (1.0 / mse).log10()
}

/// Mean squared error over all components of two normal maps.
/// Values are compared as stored; nothing is clamped.
pub fn normal_fidelity(
    reference: &NormalBuffer,
    candidate: &NormalBuffer,
) -> Result<f64, MetricError> {
    check_pair("normal", reference, candidate)?;

    let sum: f64 = reference
        .as_slice()
        .iter()
        .zip(candidate.as_slice())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum();

    Ok(sum / reference.as_slice().len() as f64)
}

/// Mean squared error of two binary masks. Any non-zero value counts as 1.
pub fn silhouette_fidelity(reference: &Mask, candidate: &Mask) -> Result<f64, MetricError> {
    check_pair("silhouette", reference, candidate)?;

    let mismatched = reference
        .as_slice()
        .iter()
        .zip(candidate.as_slice())
        .filter(|(&a, &b)| (a > 0) != (b > 0))
        .count();

    Ok(mismatched as f64 / reference.as_slice().len() as f64)
}

pub(crate) fn check_pair<T>(
    what: &'static str,
    reference: &PixelBuffer<T>,
    candidate: &PixelBuffer<T>,
) -> Result<(), MetricError>
where
    T: Copy + Default,
{
    if reference.dimensions() != candidate.dimensions()
        || reference.channels() != candidate.channels()
    {
        return Err(MetricError::SizeMismatch {
            what,
            reference: reference.dimensions(),
            candidate: candidate.dimensions(),
        });
    }
    if reference.as_slice().is_empty() {
        return Err(MetricError::Empty { what });
    }
    Ok(())
}
