// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Asset loading and the headless rendering backend

pub mod cache;
pub mod environment;
pub mod mesh;
pub mod software;

pub use cache::AssetCache;
pub use environment::Environment;
pub use mesh::Mesh;
pub use software::{RenderTarget, SoftwareRenderer};
