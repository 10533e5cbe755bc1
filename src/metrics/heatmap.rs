// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-pixel error heatmaps and the warm-center colormap

use super::evaluator::check_pair;
use crate::buffer::{ColorBuffer, Heatmap, Mask, NormalBuffer};
use crate::error::MetricError;
use crate::utils::smoothstep;

/// Gain applied to the RGB distance in color mode
pub const COLOR_GAIN: f32 = 5.0;
/// Gain applied to `1 - dot` in normal mode
pub const NORMAL_GAIN: f32 = 2.0;

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Which buffers to visualize
#[derive(Debug, Clone, Copy)]
pub enum HeatmapSource<'a> {
    Color {
        reference: &'a ColorBuffer,
        candidate: &'a ColorBuffer,
    },
    Normal {
        reference: &'a NormalBuffer,
        candidate: &'a NormalBuffer,
    },
    /// Background is where neither mask marks an edge. A pixel set in only
    /// one mask is drawn at full error rather than as background.
    Silhouette {
        reference: &'a Mask,
        candidate: &'a Mask,
    },
}

/// Build an RGBA heatmap. Background pixels are opaque black.
///
/// Color and normal modes treat a pixel as background when either side is
/// empty (all-zero). Silhouette mode only does so when neither mask marks
/// the pixel, so one-sided edges stay visible.
pub fn generate_heatmap(source: HeatmapSource<'_>) -> Result<Heatmap, MetricError> {
    match source {
        HeatmapSource::Color {
            reference,
            candidate,
        } => {
            check_pair("color heatmap", reference, candidate)?;
            Ok(map_pixels(reference.dimensions(), |i| {
                let a = reference.pixel(i);
                let b = candidate.pixel(i);
                if is_empty_u8(a) || is_empty_u8(b) {
                    return None;
                }
                Some(color_distance(a, b) * COLOR_GAIN)
            }))
        }
        HeatmapSource::Normal {
            reference,
            candidate,
        } => {
            check_pair("normal heatmap", reference, candidate)?;
            Ok(map_pixels(reference.dimensions(), |i| {
                let a = reference.pixel(i);
                let b = candidate.pixel(i);
                if is_empty_f32(a) || is_empty_f32(b) {
                    return None;
                }
                Some((1.0 - decoded_dot(a, b)) * NORMAL_GAIN)
            }))
        }
        HeatmapSource::Silhouette {
            reference,
            candidate,
        } => {
            check_pair("silhouette heatmap", reference, candidate)?;
            Ok(map_pixels(reference.dimensions(), |i| {
                let a = reference.pixel(i)[0];
                let b = candidate.pixel(i)[0];
                if a == 0 && b == 0 {
                    return None;
                }
                Some((a as f32 / 255.0 - b as f32 / 255.0).abs())
            }))
        }
    }
}

/// Map a value to the warm-center ramp. Input is clamped to `[0, 1]`.
pub fn value_to_color(value: f32) -> [u8; 3] {
    let v = value.clamp(0.0, 1.0);

    let r = smoothstep(0.5, 0.8, v);
    let g = (v * std::f32::consts::PI).sin();
    let b = smoothstep(0.5, 0.2, v);

    [to_byte(r), to_byte(g), to_byte(b)]
}

fn map_pixels<F>((width, height): (u32, u32), mut diff: F) -> Heatmap
where
    F: FnMut(usize) -> Option<f32>,
{
    let mut heatmap = Heatmap::new(width, height, 4);
    let out = heatmap.as_mut_slice();

    for i in 0..width as usize * height as usize {
        let rgba = match diff(i) {
            Some(d) => {
                let [r, g, b] = value_to_color(d);
                [r, g, b, 255]
            }
            None => BACKGROUND,
        };
        out[i * 4..i * 4 + 4].copy_from_slice(&rgba);
    }

    heatmap
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

fn is_empty_u8(px: &[u8]) -> bool {
    px.iter().all(|&c| c == 0)
}

fn is_empty_f32(px: &[f32]) -> bool {
    px.iter().all(|&c| c == 0.0)
}

fn color_distance(a: &[u8], b: &[u8]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f32 / 255.0 - y as f32 / 255.0;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

fn decoded_dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x * 2.0 - 1.0) * (y * 2.0 - 1.0))
        .sum()
}
