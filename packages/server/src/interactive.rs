//! Interactive mode for the server.
//!
//! Prompts for the bind address, port, and snapshot paths before starting
//! the server.

use dialoguer::{Confirm, Input};

use crate::ServerConfig;

fn prompt(label: &str, default: String) -> String {
    Input::new()
        .with_prompt(label)
        .default(default.clone())
        .interact_text()
        .unwrap_or(default)
}

/// Runs the server in interactive mode, prompting for configuration.
///
/// Each prompt defaults to the matching field of `current`; the answers
/// are passed to [`super::run_server_with`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(current: ServerConfig) -> std::io::Result<()> {
    println!("Collision Map Server");
    println!();

    let bind_addr = prompt("Bind address", current.bind_addr);
    let port = prompt("Port", current.port.to_string())
        .trim()
        .parse()
        .unwrap_or_else(|_| {
            log::warn!("Invalid port, using {}", current.port);
            current.port
        });
    let collisions_path = prompt(
        "Collision records file",
        current.collisions_path.display().to_string(),
    );
    let hotspots_path = prompt(
        "Hotspot summaries file",
        current.hotspots_path.display().to_string(),
    );

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server_with(ServerConfig {
        bind_addr,
        port,
        collisions_path: collisions_path.into(),
        hotspots_path: hotspots_path.into(),
    })
    .await
}
