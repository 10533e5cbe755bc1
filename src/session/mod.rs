// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Single-asset sessions and batch runs

pub mod batch;
pub mod runner;

pub use batch::{discover_pairs, find_environment, run_batch, run_batch_with};
pub use runner::{file_sha256, run_session, sample_views, AssetPair, SessionReport};
