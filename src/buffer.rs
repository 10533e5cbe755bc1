// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pixel buffers exchanged between the renderer, the metrics and persistence.
//!
//! Rows are stored bottom-up (row 0 is the bottom of the image), which is
//! the convention of the render targets. Use [`PixelBuffer::flipped_vertically`]
//! before handing a buffer to an image writer that expects a top-left origin.

use crate::error::BufferError;

/// Rectangular grid of interleaved samples with a fixed channel count
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<T>,
}

/// 8-bit RGB color
pub type ColorBuffer = PixelBuffer<u8>;
/// Float RGB normals encoded in `[0, 1]`
pub type NormalBuffer = PixelBuffer<f32>;
/// Single-channel float depth
pub type DepthBuffer = PixelBuffer<f32>;
/// Single-channel binary mask (0 or 255)
pub type Mask = PixelBuffer<u8>;
/// RGBA error visualization
pub type Heatmap = PixelBuffer<u8>;

impl<T: Copy + Default> PixelBuffer<T> {
    /// Buffer filled with `T::default()`
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        Self::filled(width, height, channels, T::default())
    }

    /// Buffer with every sample set to `value`
    pub fn filled(width: u32, height: u32, channels: usize, value: T) -> Self {
        let len = width as usize * height as usize * channels;
        Self {
            width,
            height,
            channels,
            data: vec![value; len],
        }
    }

    /// Wrap existing samples, checking the length against the dimensions
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self, BufferError> {
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(BufferError {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<T> {
        self.data
    }

    /// Samples of the pixel at linear index `i`
    pub fn pixel(&self, i: usize) -> &[T] {
        let start = i * self.channels;
        &self.data[start..start + self.channels]
    }

    /// Samples of the pixel at `(x, y)`
    pub fn at(&self, x: u32, y: u32) -> &[T] {
        self.pixel(self.index(x, y))
    }

    pub fn set(&mut self, x: u32, y: u32, value: &[T]) {
        let start = self.index(x, y) * self.channels;
        self.data[start..start + self.channels].copy_from_slice(value);
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Copy with the row order reversed
    pub fn flipped_vertically(&self) -> Self {
        let row = self.width as usize * self.channels;
        let mut data = Vec::with_capacity(self.data.len());
        if row > 0 {
            for chunk in self.data.chunks_exact(row).rev() {
                data.extend_from_slice(chunk);
            }
        }

        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data,
        }
    }
}

impl PixelBuffer<u8> {
    /// Drop the alpha channel of an RGBA buffer
    pub fn rgba_to_rgb(&self) -> ColorBuffer {
        let mut data = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.data.chunks_exact(self.channels.max(1)) {
            data.extend_from_slice(&px[..3.min(px.len())]);
        }

        Self {
            width: self.width,
            height: self.height,
            channels: 3,
            data,
        }
    }

    /// Replicate the first channel into RGB, for showing masks
    pub fn gray_to_rgb(&self) -> ColorBuffer {
        let mut data = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.data.chunks_exact(self.channels.max(1)) {
            let v = px.first().copied().unwrap_or(0);
            data.extend_from_slice(&[v, v, v]);
        }

        Self {
            width: self.width,
            height: self.height,
            channels: 3,
            data,
        }
    }
}
