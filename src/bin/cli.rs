// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! View Metrics CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use viewmetrics::config::CONFIG_FILE;
use viewmetrics::output::{BatchReport, Reporter};
use viewmetrics::session::{discover_pairs, find_environment, run_batch_with};
use viewmetrics::{
    run_session, AssetCache, AssetPair, Environment, EvaluationConfig, Phase, SessionReport,
    ViewSampler,
};

#[derive(Parser)]
#[command(name = "viewmetrics")]
#[command(about = "Multi-view fidelity evaluation for 3D assets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single reference/candidate pair
    Eval {
        /// Reference STL
        #[arg(long)]
        reference: PathBuf,

        /// Candidate STL
        #[arg(long)]
        candidate: PathBuf,

        /// Asset name used for output paths (defaults to the reference file stem)
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Environment image
        #[arg(short, long)]
        environment: Option<PathBuf>,
    },

    /// Evaluate every asset pair under the assets directory
    Batch {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Assets root
        #[arg(short, long)]
        assets: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print camera views as JSON
    Sample {
        #[arg(short, long, default_value = "64")]
        count: usize,

        #[arg(short, long, default_value = "2.0")]
        radius: f32,

        #[arg(short, long, default_value = "1.0")]
        aspect: f32,

        #[arg(short, long, default_value = "0.0")]
        jitter: f32,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Write the default configuration
    InitConfig {
        #[arg(short, long, default_value = CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Eval {
            reference,
            candidate,
            name,
            out,
            config,
            environment,
        } => eval_command(reference, candidate, name, out, config, environment),
        Commands::Batch {
            config,
            assets,
            out,
        } => batch_command(config, assets, out, cli.verbose),
        Commands::Sample {
            count,
            radius,
            aspect,
            jitter,
            seed,
        } => sample_command(count, radius, aspect, jitter, seed),
        Commands::InitConfig { path } => init_config_command(&path),
    }
}

fn load_config(path: Option<&Path>) -> Result<EvaluationConfig> {
    let mut config = match path {
        Some(path) => EvaluationConfig::from_file(path)?,
        None => return EvaluationConfig::load(),
    };
    config.apply_env()?;
    Ok(config)
}

fn eval_command(
    reference: PathBuf,
    candidate: PathBuf,
    name: Option<String>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
    environment: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    if let Some(out) = out {
        config.paths.output_root = out;
    }

    let name = match name {
        Some(name) => name,
        None => reference
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .context("Cannot derive an asset name from the reference path")?,
    };

    let environment = match environment {
        Some(path) => Environment::load(&path)?,
        None => Environment::default(),
    };

    let pair = AssetPair {
        name,
        reference,
        candidate,
    };

    println!("{} {}", "Evaluating".bold(), pair.name);
    let mut cache = AssetCache::new();
    let session = run_session(&config, &pair, &mut cache, &environment)?;

    let json_path = config
        .paths
        .output_root
        .join(&session.asset)
        .join("session.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&session)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    print_session(&session);
    println!("{} {}", "Results:".green(), json_path.display());
    Ok(())
}

fn batch_command(
    config: Option<PathBuf>,
    assets: Option<PathBuf>,
    out: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    if let Some(assets) = assets {
        config.paths.assets_root = assets;
    }
    if let Some(out) = out {
        config.paths.output_root = out;
    }

    let total = discover_pairs(&config)?.len();
    if total == 0 {
        bail!(
            "no asset pairs under {} and {}",
            config.reference_root().display(),
            config.candidate_root().display()
        );
    }
    if verbose {
        if let Some(env) = find_environment(&config) {
            println!("Environment: {}", env.display());
        }
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let report = run_batch_with(&config, |pair, result| {
        if result.is_err() {
            pb.println(format!("{} {}", "Failed:".red(), pair.name));
        }
        pb.set_message(pair.name.clone());
        pb.inc(1);
    })?;
    pb.finish_with_message("Evaluation complete");

    let json_path = config.paths.output_root.join("latest.json");
    Reporter::write_json(&report, &json_path)?;
    let md_path = config.paths.output_root.join("report.md");
    Reporter::write_markdown(&report, &md_path)?;

    print_batch_summary(&report);
    println!("{} {}", "Report:".green(), md_path.display());

    if report.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn sample_command(
    count: usize,
    radius: f32,
    aspect: f32,
    jitter: f32,
    seed: Option<u64>,
) -> Result<()> {
    let sampler = ViewSampler::new(count, radius, aspect).with_jitter(jitter);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let views = sampler.generate(&mut rng);
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

fn init_config_command(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    EvaluationConfig::default().save(path)?;
    println!("{} Wrote {}", "Success:".green(), path.display());
    Ok(())
}

fn print_session(session: &SessionReport) {
    println!("\n{}", "═".repeat(60).bright_black());
    println!("{} ({} views)", session.asset.bold(), session.view_count);
    println!("{}", "═".repeat(60).bright_black());
    for summary in &session.phases {
        let label = match summary.phase {
            Phase::ColorFidelity => "Color MSE",
            Phase::Silhouette => "Silhouette",
            Phase::NormalFidelity => "Normal",
            Phase::Finished => continue,
        };
        match summary.mean_psnr {
            Some(psnr) => println!(
                "  {:<12} {:.6}  (PSNR {:.2} dB)",
                label.bright_black(),
                summary.mean_error,
                psnr
            ),
            None => println!("  {:<12} {:.6}", label.bright_black(), summary.mean_error),
        }
        if summary.failed_views > 0 {
            println!(
                "  {} {} views failed",
                "Warning:".yellow(),
                summary.failed_views
            );
        }
    }
    println!("  {:<12} {}ms", "Time".bright_black(), session.duration_ms);
}

fn print_batch_summary(report: &BatchReport) {
    println!(
        "{} {} ({:.1}%)",
        "Completed:".green(),
        report.completed,
        report.success_rate()
    );
    println!("{} {}", "Errors:".yellow(), report.errors);
}
