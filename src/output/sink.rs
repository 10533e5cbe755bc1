// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Filesystem artifact sink: PNG screenshots and CSV metric tables

use crate::pipeline::{ArtifactSink, MetricRow, Phase, PHASE_TABLE};
use anyhow::{bail, Context, Result};
use image::RgbImage;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const PHASE_TABLE_FILE: &str = "metrics.csv";
const PHASE_TABLE_HEADER: &str = "Model,View,Error";
const CONSOLIDATED_HEADER: &str = "ModelName,ViewIndex,ErrorValue";

/// Consolidated table for a phase: `metrics_<subdir>.csv`
pub fn consolidated_file_name(phase: Phase) -> Option<String> {
    phase
        .entry()
        .map(|entry| format!("metrics_{}.csv", entry.subdir))
}

/// Truncate every consolidated table under `output_root` and write headers
pub fn init_consolidated_tables(output_root: &Path) -> Result<()> {
    fs::create_dir_all(output_root)
        .with_context(|| format!("Failed to create {}", output_root.display()))?;

    for entry in PHASE_TABLE.iter() {
        let path = output_root.join(format!("metrics_{}.csv", entry.subdir));
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writeln!(file, "{}", CONSOLIDATED_HEADER)?;
    }
    Ok(())
}

/// Writes artifacts below `output_root`
pub struct FsSink {
    output_root: PathBuf,
    phase: Option<Phase>,
    phase_table: Option<BufWriter<File>>,
    images_written: usize,
    rows_written: usize,
}

impl FsSink {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            phase: None,
            phase_table: None,
            images_written: 0,
            rows_written: 0,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn images_written(&self) -> usize {
        self.images_written
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn append_consolidated(&self, phase: Phase, row: &MetricRow) -> Result<()> {
        let Some(name) = consolidated_file_name(phase) else {
            return Ok(());
        };
        fs::create_dir_all(&self.output_root)
            .with_context(|| format!("Failed to create {}", self.output_root.display()))?;

        let path = self.output_root.join(name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        if file.metadata()?.len() == 0 {
            writeln!(file, "{}", CONSOLIDATED_HEADER)?;
        }
        writeln!(file, "{},{},{}", row.asset, row.view, row.error)
            .with_context(|| format!("Failed to append to {}", path.display()))?;
        Ok(())
    }
}

impl ArtifactSink for FsSink {
    fn begin_phase(&mut self, asset: &str, phase: Phase, dir: &Path) -> Result<()> {
        if let Some(mut previous) = self.phase_table.take() {
            previous.flush()?;
        }

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let path = dir.join(PHASE_TABLE_FILE);
        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        writeln!(writer, "{}", PHASE_TABLE_HEADER)?;
        writer.flush()?;

        debug!("'{}' {} -> {}", asset, phase.as_str(), dir.display());
        self.phase = Some(phase);
        self.phase_table = Some(writer);
        Ok(())
    }

    fn save_image(&mut self, path: &Path, rgb: &[u8], width: u32, height: u32) -> Result<()> {
        let Some(image) = RgbImage::from_raw(width, height, rgb.to_vec()) else {
            bail!(
                "{} bytes do not form a {}x{} RGB image",
                rgb.len(),
                width,
                height
            );
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        image
            .save(path)
            .with_context(|| format!("Failed to save PNG to {}", path.display()))?;

        self.images_written += 1;
        Ok(())
    }

    fn append_row(&mut self, table: &str, row: &MetricRow) -> Result<()> {
        let Some(phase) = Phase::from_table(table) else {
            debug!("Skipping row for unknown table '{}'", table);
            return Ok(());
        };

        if self.phase == Some(phase) {
            if let Some(writer) = self.phase_table.as_mut() {
                writeln!(writer, "{},{},{}", row.asset, row.view, row.error)?;
                writer.flush()?;
            }
        }

        self.append_consolidated(phase, row)?;
        self.rows_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(view: usize, error: f64) -> MetricRow {
        MetricRow {
            asset: "chair".to_string(),
            view,
            error,
        }
    }

    #[test]
    fn test_phase_table_and_consolidated() {
        let dir = TempDir::new().unwrap();
        let phase_dir = dir.path().join("chair").join("psnr");
        let mut sink = FsSink::new(dir.path());

        sink.begin_phase("chair", Phase::ColorFidelity, &phase_dir)
            .unwrap();
        sink.append_row("PSNR", &row(0, 0.25)).unwrap();
        sink.append_row("PSNR", &row(1, 0.5)).unwrap();

        let phase_csv = fs::read_to_string(phase_dir.join(PHASE_TABLE_FILE)).unwrap();
        assert_eq!(phase_csv, "Model,View,Error\nchair,0,0.25\nchair,1,0.5\n");

        let consolidated = fs::read_to_string(dir.path().join("metrics_psnr.csv")).unwrap();
        assert_eq!(
            consolidated,
            "ModelName,ViewIndex,ErrorValue\nchair,0,0.25\nchair,1,0.5\n"
        );
        assert_eq!(sink.rows_written(), 2);
    }

    #[test]
    fn test_unknown_table_skipped() {
        let dir = TempDir::new().unwrap();
        let mut sink = FsSink::new(dir.path());
        sink.append_row("SSIM", &row(0, 1.0)).unwrap();
        assert_eq!(sink.rows_written(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_init_consolidated_tables() {
        let dir = TempDir::new().unwrap();
        init_consolidated_tables(dir.path()).unwrap();
        for name in ["metrics_psnr.csv", "metrics_silhouette.csv", "metrics_normal.csv"] {
            let content = fs::read_to_string(dir.path().join(name)).unwrap();
            assert_eq!(content, "ModelName,ViewIndex,ErrorValue\n");
        }
    }

    #[test]
    fn test_save_image_rejects_short_buffer() {
        let dir = TempDir::new().unwrap();
        let mut sink = FsSink::new(dir.path());
        let path = dir.path().join("view_0.png");
        assert!(sink.save_image(&path, &[0; 5], 2, 2).is_err());
        assert!(sink.save_image(&path, &[10; 12], 2, 2).is_ok());
        assert!(path.exists());
    }
}
