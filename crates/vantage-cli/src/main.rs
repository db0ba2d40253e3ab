// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vantage CLI entrypoint.
//!
//! Developer-facing commands for Vantage streams:
//! - `vantage demo <out>` records a sample scene
//! - `vantage info <file>` decodes a recording and reports what it holds
//! - `vantage config` shows (and optionally saves) the effective settings
//!
//! The CLI exits with code `0` on success and non-zero on error.

// The CLI is expected to print to stdout.
#![allow(clippy::print_stdout)]

mod demo;
mod info;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vantage_app_core::config::ConfigService;
use vantage_app_core::config_port::SettingsPort;
use vantage_app_core::settings::{StreamSettings, SETTINGS_KEY};
use vantage_config_fs::FsConfigStore;

#[derive(Parser, Debug)]
#[command(name = "vantage", author, version, about = "Vantage stream tools")]
struct Cli {
    /// Read and write settings here instead of the platform config dir.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a sample scene to a file.
    Demo(DemoArgs),
    /// Decode a recording and report packet and scene statistics.
    Info(InfoArgs),
    /// Show the effective stream settings.
    Config(ConfigArgs),
}

/// Flags that override stored settings.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Payload bytes per mesh transfer packet (0 fills each packet).
    #[arg(long)]
    byte_limit: Option<usize>,
    /// Payload bytes spent on mesh transfer per frame (0 is unbounded).
    #[arg(long)]
    frame_budget: Option<usize>,
    /// Skip transient shapes while decoding.
    #[arg(long)]
    ignore_transient: bool,
}

impl Overrides {
    fn apply(&self, settings: &mut StreamSettings) {
        if let Some(limit) = self.byte_limit {
            settings.transfer.byte_limit = limit;
        }
        if let Some(budget) = self.frame_budget {
            settings.transfer.frame_byte_budget = budget;
        }
        if self.ignore_transient {
            settings.decode.ignore_transient = true;
        }
    }
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Output file.
    out: PathBuf,
    /// Minimum number of frames to record.
    #[arg(long, default_value_t = 24)]
    frames: u32,
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Recorded stream.
    file: PathBuf,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Persist the effective settings.
    #[arg(long)]
    save: bool,
    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = open_config(cli.config_dir.as_deref())?;
    let mut settings = config.load_settings().unwrap_or_default();

    match cli.command {
        Commands::Demo(args) => {
            args.overrides.apply(&mut settings);
            run_demo(&args, &settings)
        }
        Commands::Info(args) => {
            args.overrides.apply(&mut settings);
            run_info(&args, &settings)
        }
        Commands::Config(args) => {
            args.overrides.apply(&mut settings);
            if args.save {
                config
                    .save(SETTINGS_KEY, &settings)
                    .context("save stream settings")?;
                info!(dir = %config.store().base().display(), "settings saved");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn open_config(dir: Option<&Path>) -> Result<ConfigService<FsConfigStore>> {
    let store = match dir {
        Some(dir) => FsConfigStore::with_base(dir)
            .with_context(|| format!("open config dir {}", dir.display()))?,
        None => FsConfigStore::new().context("open platform config dir")?,
    };
    Ok(ConfigService::new(store))
}

fn run_demo(args: &DemoArgs, settings: &StreamSettings) -> Result<()> {
    let file =
        File::create(&args.out).with_context(|| format!("create {}", args.out.display()))?;
    let mut out = BufWriter::new(file);
    let summary = demo::record(&mut out, args.frames, settings)?;
    out.flush().context("flush recording")?;
    info!(
        frames = summary.frames,
        packets = summary.packets,
        bytes = summary.bytes,
        transfer_frames = summary.transfer_frames,
        "demo recorded"
    );
    println!(
        "wrote {} frames ({} packets, {} bytes) to {}",
        summary.frames,
        summary.packets,
        summary.bytes,
        args.out.display()
    );
    Ok(())
}

fn run_info(args: &InfoArgs, settings: &StreamSettings) -> Result<()> {
    let file = File::open(&args.file).with_context(|| format!("open {}", args.file.display()))?;
    let report = info::inspect(file, settings)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for table in info::render(&report) {
            println!("{table}");
        }
    }
    Ok(())
}
