#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for the collision map toolchain.
//!
//! Fetches NYC collision records into a JSON snapshot, generates the
//! precomputed hotspot summaries from it, and starts the API server. Run
//! without a subcommand for an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`collision_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use collision_map_hotspots::cluster::DEFAULT_CLUSTER_RADIUS_DEGREES;
use dialoguer::{Input, Select};

use crate::commands::{
    DEFAULT_COLLISIONS_PATH, DEFAULT_HOTSPOTS_PATH, DEFAULT_RAW_DIR, FetchArgs, SummarizeArgs,
};

#[derive(Parser)]
#[command(name = "collision_map_cli", about = "Collision map toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download NYC collisions and write the records snapshot
    Fetch {
        /// Only fetch collisions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Maximum number of rows to fetch
        #[arg(long)]
        limit: Option<u64>,
        /// Directory for the raw download
        #[arg(long, default_value = DEFAULT_RAW_DIR)]
        raw_dir: PathBuf,
        /// Records snapshot to write
        #[arg(long, default_value = DEFAULT_COLLISIONS_PATH)]
        output: PathBuf,
    },
    /// Generate hotspot summaries from the records snapshot
    Summarize {
        #[arg(long, default_value = DEFAULT_COLLISIONS_PATH)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_HOTSPOTS_PATH)]
        output: PathBuf,
        /// Smallest cluster kept as a hotspot
        #[arg(long, default_value_t = 5)]
        min_crashes: u64,
        /// Maximum number of hotspots kept
        #[arg(long, default_value_t = 50)]
        max_hotspots: usize,
        /// Clustering radius in degrees
        #[arg(long, default_value_t = DEFAULT_CLUSTER_RADIUS_DEGREES)]
        radius: f64,
    },
    /// Start the API server
    Serve {
        /// Records snapshot (overrides `COLLISIONS_PATH`)
        #[arg(long)]
        collisions: Option<PathBuf>,
        /// Hotspot summaries snapshot (overrides `HOTSPOTS_PATH`)
        #[arg(long)]
        hotspots: Option<PathBuf>,
    },
}

/// Top-level tool selection for the interactive menu.
enum Tool {
    Fetch,
    Summarize,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Fetch, Self::Summarize, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Fetch => "Fetch NYC collision data",
            Self::Summarize => "Generate hotspot summaries",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = collision_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Fetch {
            since,
            limit,
            raw_dir,
            output,
        }) => {
            commands::fetch(
                &multi,
                FetchArgs {
                    since,
                    limit,
                    raw_dir,
                    output,
                },
            )
            .await?;
        }
        Some(Commands::Summarize {
            input,
            output,
            min_crashes,
            max_hotspots,
            radius,
        }) => commands::summarize(&SummarizeArgs {
            input,
            output,
            min_crashes,
            max_hotspots,
            radius_degrees: radius,
        })?,
        Some(Commands::Serve {
            collisions,
            hotspots,
        }) => {
            let config = commands::server_config(collisions, hotspots);
            commands::serve(config, false).await?;
        }
        None => interactive(&multi).await?,
    }

    Ok(())
}

async fn interactive(
    multi: &collision_map_cli_utils::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Collision Map Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Fetch => {
            let since: String = Input::new()
                .with_prompt("Fetch collisions since (YYYY-MM-DD, blank for all)")
                .allow_empty(true)
                .interact_text()?;
            let limit: String = Input::new()
                .with_prompt("Row limit (blank for no limit)")
                .allow_empty(true)
                .interact_text()?;
            let output: String = Input::new()
                .with_prompt("Records snapshot")
                .default(DEFAULT_COLLISIONS_PATH.to_string())
                .interact_text()?;

            commands::fetch(
                multi,
                FetchArgs {
                    since: parse_optional(&since)?,
                    limit: parse_optional(&limit)?,
                    raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
                    output: PathBuf::from(output),
                },
            )
            .await?;
        }
        Tool::Summarize => {
            let input: String = Input::new()
                .with_prompt("Records snapshot")
                .default(DEFAULT_COLLISIONS_PATH.to_string())
                .interact_text()?;
            let output: String = Input::new()
                .with_prompt("Hotspot summaries output")
                .default(DEFAULT_HOTSPOTS_PATH.to_string())
                .interact_text()?;
            let min_crashes: u64 = Input::new()
                .with_prompt("Minimum crashes per hotspot")
                .default(5)
                .interact_text()?;
            let max_hotspots: usize = Input::new()
                .with_prompt("Maximum hotspots")
                .default(50)
                .interact_text()?;

            commands::summarize(&SummarizeArgs {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
                min_crashes,
                max_hotspots,
                radius_degrees: DEFAULT_CLUSTER_RADIUS_DEGREES,
            })?;
        }
        Tool::Server => commands::serve(commands::server_config(None, None), true).await?,
    }

    Ok(())
}

/// Parses a possibly blank prompt answer.
fn parse_optional<T>(answer: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    Ok(Some(answer.parse()?))
}
