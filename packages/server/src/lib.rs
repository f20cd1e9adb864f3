#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the collision map application.
//!
//! Loads the collision record snapshot and the precomputed hotspot
//! summaries once at startup, then serves filtered record queries,
//! aggregate statistics, and hotspot views computed on demand from the
//! in-memory record store.

mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use collision_map_hotspots_models::HotspotSummary;
use collision_map_records::store::RecordStore;
use collision_map_source::{SourceError, snapshot};

/// Server settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Records snapshot; must exist.
    pub collisions_path: PathBuf,
    /// Hotspot summaries snapshot; optional.
    pub hotspots_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            collisions_path: PathBuf::from("data/collisions.json"),
            hotspots_path: PathBuf::from("data/hotspots.json"),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `COLLISIONS_PATH`, and `HOTSPOTS_PATH`,
    /// falling back to the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            collisions_path: std::env::var_os("COLLISIONS_PATH")
                .map_or(defaults.collisions_path, PathBuf::from),
            hotspots_path: std::env::var_os("HOTSPOTS_PATH")
                .map_or(defaults.hotspots_path, PathBuf::from),
        }
    }
}

/// Shared application state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Every loaded collision record.
    pub store: RecordStore,
    /// Precomputed hotspots, most severe first.
    pub summaries: Arc<[HotspotSummary]>,
}

impl AppState {
    #[must_use]
    pub fn new(store: RecordStore, mut summaries: Vec<HotspotSummary>) -> Self {
        summaries.sort_by(|a, b| b.severity_index.total_cmp(&a.severity_index));
        Self {
            store,
            summaries: summaries.into(),
        }
    }
}

/// Loads the record store and hotspot summaries named by `config`.
///
/// A missing hotspot summaries file yields an empty list with a warning.
///
/// # Errors
///
/// Returns [`SourceError`] if the records snapshot cannot be read or
/// parsed, or the summaries file exists but cannot be parsed.
pub fn load_state(config: &ServerConfig) -> Result<AppState, SourceError> {
    log::info!("Loading records from {}...", config.collisions_path.display());
    let records = snapshot::load_records(&config.collisions_path)?;

    let summaries = if config.hotspots_path.exists() {
        snapshot::load_summaries(&config.hotspots_path)?
    } else {
        log::warn!(
            "No hotspot summaries at {}; serving an empty list",
            config.hotspots_path.display()
        );
        Vec::new()
    };

    Ok(AppState::new(RecordStore::new(records), summaries))
}

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/boroughs", web::get().to(handlers::boroughs))
            .route("/legend", web::get().to(handlers::legend))
            .route("/crashes", web::get().to(handlers::crashes))
            .route("/crashes/stats", web::get().to(handlers::crash_stats))
            .route("/crashes/search", web::get().to(handlers::search_by_location))
            .route("/crashes/{id}", web::get().to(handlers::crash_detail))
            .route("/hotspots", web::get().to(handlers::hotspots))
            .route("/hotspots/top", web::get().to(handlers::top_hotspots))
            .route("/hotspots/derived", web::get().to(handlers::derived_hotspots))
            .route("/hotspots/{id}", web::get().to(handlers::hotspot_detail)),
    );
}

/// Starts the collision map API server with [`ServerConfig::from_env`].
///
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// See [`run_server_with`].
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    run_server_with(ServerConfig::from_env()).await
}

/// Loads the snapshots named by `config` and starts the Actix-Web HTTP
/// server.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the snapshots cannot be loaded,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server_with(config: ServerConfig) -> std::io::Result<()> {
    // The CLI may already have installed its own logger.
    pretty_env_logger::try_init_custom_env("RUST_LOG").ok();

    let state = load_state(&config).map_err(|e| {
        log::error!("Failed to load collision data: {e}");
        std::io::Error::other(e)
    })?;
    log::info!(
        "Serving {} records and {} hotspot summaries",
        state.store.len(),
        state.summaries.len()
    );
    let state = web::Data::new(state);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use collision_map_collision_models::IncidentRecord;

    use super::*;

    fn summary(id: u32, severity_index: f64) -> HotspotSummary {
        HotspotSummary {
            id,
            name: format!("Hotspot {id}"),
            latitude: 40.7,
            longitude: -73.9,
            radius: 100.0,
            crash_count: 5,
            total_injured: 0,
            total_killed: 0,
            severity_index,
            generated_at: None,
        }
    }

    #[test]
    fn state_orders_summaries_by_severity() {
        let state = AppState::new(
            RecordStore::default(),
            vec![summary(1, 5.0), summary(2, 30.0), summary(3, 12.0)],
        );
        let ids: Vec<u32> = state.summaries.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn missing_summaries_are_empty() {
        let dir = std::env::temp_dir().join("collision_map_server_load_state");
        let collisions_path = dir.join("collisions.json");
        snapshot::write_json(&collisions_path, &[IncidentRecord::new(1)]).unwrap();

        let config = ServerConfig {
            collisions_path,
            hotspots_path: dir.join("absent.json"),
            ..ServerConfig::default()
        };
        let state = load_state(&config).unwrap();
        assert_eq!(state.store.len(), 1);
        assert!(state.summaries.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_records_are_fatal() {
        let config = ServerConfig {
            collisions_path: std::env::temp_dir().join("collision_map_server_absent.json"),
            ..ServerConfig::default()
        };
        assert!(matches!(load_state(&config), Err(SourceError::Io(_))));
    }
}
