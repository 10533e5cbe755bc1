// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Screenshots, metric tables and batch reports

pub mod reporter;
pub mod sink;

pub use reporter::{BatchReport, Reporter, SessionError};
pub use sink::{consolidated_file_name, init_consolidated_tables, FsSink, PHASE_TABLE_FILE};
