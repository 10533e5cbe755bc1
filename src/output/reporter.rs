// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch report generation (JSON and Markdown)

use crate::pipeline::Phase;
use crate::session::SessionReport;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// An asset whose session could not start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    pub asset: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub timestamp: String,
    pub total_assets: usize,
    pub completed: usize,
    pub errors: usize,
    pub sessions: Vec<SessionReport>,
    pub error_details: Vec<SessionError>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            total_assets: 0,
            completed: 0,
            errors: 0,
            sessions: Vec::new(),
            error_details: Vec::new(),
        }
    }

    pub fn add_session(&mut self, session: SessionReport) {
        self.total_assets += 1;
        self.completed += 1;
        self.sessions.push(session);
    }

    pub fn add_error(&mut self, asset: String, error: String) {
        self.total_assets += 1;
        self.errors += 1;
        self.error_details.push(SessionError { asset, error });
    }

    /// Mean of a phase's per-asset mean error over completed sessions
    pub fn mean_error(&self, phase: Phase) -> Option<f64> {
        let values: Vec<f64> = self
            .sessions
            .iter()
            .filter_map(|s| s.phase(phase))
            .map(|p| p.mean_error)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    pub fn success_rate(&self) -> f32 {
        if self.total_assets == 0 {
            0.0
        } else {
            (self.completed as f32 / self.total_assets as f32) * 100.0
        }
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Report writer
pub struct Reporter;

impl Reporter {
    pub fn write_json(report: &BatchReport, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(())
    }

    pub fn write_markdown(report: &BatchReport, path: &Path) -> Result<()> {
        fs::write(path, Self::render_markdown(report))
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(())
    }

    pub fn render_markdown(report: &BatchReport) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "# View Metrics Report ({})\n\n",
            Utc::now().format("%Y-%m-%d")
        ));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Total Assets**: {}\n", report.total_assets));
        md.push_str(&format!(
            "- **Completed**: {} ({:.1}%)\n",
            report.completed,
            report.success_rate()
        ));
        md.push_str(&format!("- **Errors**: {}\n", report.errors));
        for (phase, label) in [
            (Phase::ColorFidelity, "Mean Color MSE"),
            (Phase::Silhouette, "Mean Silhouette Error"),
            (Phase::NormalFidelity, "Mean Normal Error"),
        ] {
            if let Some(mean) = report.mean_error(phase) {
                md.push_str(&format!("- **{}**: {:.6}\n", label, mean));
            }
        }
        md.push('\n');

        md.push_str("## Detailed Results\n\n");
        md.push_str("| Asset | Views | Color MSE | PSNR (dB) | Silhouette | Normal | Failed Views | Time |\n");
        md.push_str("|-------|-------|-----------|-----------|------------|--------|--------------|------|\n");

        for session in &report.sessions {
            let error = |phase| {
                session
                    .phase(phase)
                    .map_or("N/A".to_string(), |p| format!("{:.6}", p.mean_error))
            };
            let psnr = session
                .phase(Phase::ColorFidelity)
                .and_then(|p| p.mean_psnr)
                .map_or("N/A".to_string(), |v| format!("{:.2}", v));

            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {}ms |\n",
                session.asset,
                session.view_count,
                error(Phase::ColorFidelity),
                psnr,
                error(Phase::Silhouette),
                error(Phase::NormalFidelity),
                session.failed_views(),
                session.duration_ms
            ));
        }

        if report.errors > 0 {
            md.push_str("\n## Execution Errors\n\n");
            md.push_str(&format!("{} assets failed to evaluate:\n\n", report.errors));
            for error in &report.error_details {
                md.push_str(&format!("- ⚠️ **{}**\n", error.asset));
                md.push_str(&format!("  ```\n  {}\n  ```\n", error.error));
            }
        }

        md.push_str(&format!("\n---\n\n*Generated on {}*\n", report.timestamp));
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PhaseSummary;

    fn session(asset: &str, color: f64) -> SessionReport {
        SessionReport {
            asset: asset.to_string(),
            view_count: 4,
            reference_sha256: String::new(),
            candidate_sha256: String::new(),
            phases: vec![PhaseSummary {
                phase: Phase::ColorFidelity,
                views: 4,
                mean_error: color,
                mean_psnr: Some(30.0),
                failed_views: 0,
            }],
            view_psnr: vec![Some(30.0); 4],
            duration_ms: 12,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::new();
        report.add_session(session("a", 0.1));
        report.add_session(session("b", 0.3));
        report.add_error("c".to_string(), "missing".to_string());

        assert_eq!(report.total_assets, 3);
        assert_eq!(report.completed, 2);
        assert_eq!(report.errors, 1);
        assert!((report.mean_error(Phase::ColorFidelity).unwrap() - 0.2).abs() < 1e-12);
        assert!(report.mean_error(Phase::Silhouette).is_none());
    }

    #[test]
    fn test_markdown_lists_sessions_and_errors() {
        let mut report = BatchReport::new();
        report.add_session(session("chair", 0.25));
        report.add_error("lamp".to_string(), "asset not found".to_string());

        let md = Reporter::render_markdown(&report);
        assert!(md.contains("| chair | 4 | 0.250000 | 30.00 | N/A | N/A | 0 | 12ms |"));
        assert!(md.contains("**lamp**"));
    }
}
