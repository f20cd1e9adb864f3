#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the collision map API server.
//!
//! Configuration comes from the environment; see
//! [`collision_map_server::ServerConfig::from_env`].

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    collision_map_server::run_server().await
}
