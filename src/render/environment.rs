// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Environment lighting reduced to a single ambient term

use crate::error::AssetError;
use log::info;
use nalgebra::Vector3;
use std::path::{Path, PathBuf};

const DEFAULT_AMBIENT: f32 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub path: Option<PathBuf>,
    /// Tone-mapped mean radiance
    pub ambient: Vector3<f32>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            path: None,
            ambient: Vector3::repeat(DEFAULT_AMBIENT),
        }
    }
}

impl Environment {
    /// Load an environment image (Radiance HDR or any format `image` reads)
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }

        let image = image::open(path)
            .map_err(|source| AssetError::Environment {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb32f();

        let count = (image.width() as f64 * image.height() as f64).max(1.0);
        let mut sum = [0.0f64; 3];
        for px in image.pixels() {
            for (acc, &c) in sum.iter_mut().zip(px.0.iter()) {
                *acc += c.max(0.0) as f64;
            }
        }

        let mean = Vector3::new(sum[0], sum[1], sum[2]).map(|c| (c / count) as f32);
        let ambient = mean.map(|c| c / (1.0 + c));
        info!(
            "Environment {}: ambient ({:.3}, {:.3}, {:.3})",
            path.display(),
            ambient.x,
            ambient.y,
            ambient.z
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            ambient,
        })
    }
}
