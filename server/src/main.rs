//! # Manole Server
//!
//! The stdio entry point (spec.md §4.15, §6): reads newline-delimited
//! JSON requests from stdin, dispatches them to a single [`Server`], and
//! writes newline-delimited JSON frames to stdout. Stdout carries only
//! protocol frames; every diagnostic goes to stderr.

mod config;
mod dir_id;
mod directory;
mod registry;
mod server;
mod sink;
mod stats;
mod summary;

use clap::Parser;
use config::ServerConfig;
use server::Server;
use sink::Sink;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "manole-server", about = "NeuroFind core: stdio NDJSON dispatcher")]
struct Args {
    /// Path to a TOML config file. Missing fields fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// `trace`, `debug`, `info`, `warn`, or `error`. Overrides `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,

    /// Start with `toggle_debug`'s effect already applied.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = args.log_level.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let config = ServerConfig::load(args.config.as_deref())?;
    log::info!("starting manole-server");

    let sink = Arc::new(Sink::new());
    let mut server = Server::new(config, sink.clone());

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request = match manole_protocol::parse_request(&line) {
            Ok(request) => request,
            Err(err) => {
                sink.event(
                    manole_protocol::EventType::Error,
                    serde_json::json!({"message": err.to_string()}),
                );
                continue;
            }
        };

        let frame = server.dispatch(request.id, &request.method, request.params).await;
        sink.write_response(frame);

        if !server.running {
            break;
        }
    }

    log::info!("manole-server shutting down");
    Ok(())
}
