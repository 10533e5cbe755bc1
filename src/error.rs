// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed errors for buffers, metrics and asset acquisition

use std::path::PathBuf;
use thiserror::Error;

/// Raw pixel data that does not fit the declared dimensions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("buffer of {width}x{height}x{channels} expects {expected} samples, got {actual}")]
pub struct BufferError {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub expected: usize,
    pub actual: usize,
}

/// Per-view metric failures. These never abort a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("{what}: reference is {reference:?}, candidate is {candidate:?}")]
    SizeMismatch {
        what: &'static str,
        reference: (u32, u32),
        candidate: (u32, u32),
    },

    #[error("{what}: expected {expected:?} for this session, got {actual:?}")]
    UnexpectedSize {
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("{what}: expected {expected} channels, got {actual}")]
    ChannelMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what}: buffers are empty")]
    Empty { what: &'static str },

    #[error("{what} buffer was not captured for this phase")]
    MissingBuffer { what: &'static str },
}

/// Failures acquiring meshes or lighting resources. Fatal at session start.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read mesh {}: {source}", .path.display())]
    Mesh {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mesh {} contains no triangles", .0.display())]
    EmptyMesh(PathBuf),

    #[error("failed to read environment map {}: {source}", .path.display())]
    Environment {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
