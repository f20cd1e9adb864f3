//! Fetch and summarize steps shared by the subcommands and the interactive
//! menu.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use collision_map_cli_utils::{IndicatifProgress, MultiProgress};
use collision_map_hotspots::cluster::ClusterOptions;
use collision_map_hotspots::summary::{SummaryOptions, generate_summaries};
use collision_map_server::ServerConfig;
use collision_map_source::nyc::NycCollisionSource;
use collision_map_source::{CollisionSource, FetchOptions, snapshot};

/// Default location of the normalized records snapshot.
pub const DEFAULT_COLLISIONS_PATH: &str = "data/collisions.json";
/// Default location of the hotspot summaries snapshot.
pub const DEFAULT_HOTSPOTS_PATH: &str = "data/hotspots.json";
/// Default directory for raw downloads.
pub const DEFAULT_RAW_DIR: &str = "data/raw";

/// Arguments for [`fetch`].
#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub since: Option<NaiveDate>,
    pub limit: Option<u64>,
    pub raw_dir: PathBuf,
    pub output: PathBuf,
}

/// Downloads NYC collisions, normalizes them, and writes the records
/// snapshot.
///
/// # Errors
///
/// Returns an error if the download, normalization, or write fails.
pub async fn fetch(multi: &MultiProgress, args: FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let source = NycCollisionSource::new();

    log::info!("Fetching from {} ({})", source.name(), source.id());
    let options = FetchOptions {
        since: args.since,
        limit: args.limit,
        output_dir: args.raw_dir,
        progress: IndicatifProgress::rows_bar(multi, source.name()),
    };

    let raw_path = source.fetch(&options).await?;
    let records = source.normalize(&raw_path).await?;
    snapshot::write_json(&args.output, &records)?;

    log::info!(
        "Wrote {} records to {} in {:.1}s",
        records.len(),
        args.output.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Arguments for [`summarize`].
#[derive(Debug, Clone)]
pub struct SummarizeArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub min_crashes: u64,
    pub max_hotspots: usize,
    pub radius_degrees: f64,
}

impl SummarizeArgs {
    #[must_use]
    pub fn options(&self) -> SummaryOptions {
        SummaryOptions {
            cluster: ClusterOptions {
                radius_degrees: self.radius_degrees,
            },
            min_crashes: self.min_crashes,
            max_hotspots: self.max_hotspots,
        }
    }
}

/// Generates hotspot summaries from a records snapshot and writes them,
/// stamped with the generation time.
///
/// # Errors
///
/// Returns an error if the records cannot be loaded or the summaries
/// cannot be written.
pub fn summarize(args: &SummarizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records = snapshot::load_records(&args.input)?;
    let mut summaries = generate_summaries(&records, &args.options());
    let generated_at = Utc::now();
    for summary in &mut summaries {
        summary.generated_at = Some(generated_at);
    }
    snapshot::write_json(&args.output, &summaries)?;

    log::info!(
        "Wrote {} hotspot summaries to {}",
        summaries.len(),
        args.output.display()
    );
    Ok(())
}

/// Runs the API server on a dedicated actix system.
///
/// The server uses actix-web's runtime, so it runs in a blocking task to
/// avoid nesting tokio runtimes. In interactive mode `config` supplies the
/// prompt defaults.
///
/// # Errors
///
/// Returns an error if the server fails to start or stops with an error.
pub async fn serve(
    config: ServerConfig,
    interactive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if interactive {
                collision_map_server::interactive::run(config).await
            } else {
                collision_map_server::run_server_with(config).await
            }
        })
    })
    .await??;
    Ok(())
}

/// Server configuration from the environment, with snapshot paths given on
/// the command line taking precedence.
#[must_use]
pub fn server_config(collisions: Option<PathBuf>, hotspots: Option<PathBuf>) -> ServerConfig {
    let mut config = ServerConfig::from_env();
    if let Some(path) = collisions {
        config.collisions_path = path;
    }
    if let Some(path) = hotspots {
        config.hotspots_path = path;
    }
    config
}
