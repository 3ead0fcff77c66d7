use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flappy_pilot::scoreboard::{configure, JsonlStore, Scoreboard};

/// Score-recording endpoint: accepts POSTed score reports and appends them
/// to a JSONL file.
#[derive(Parser, Debug)]
#[command(name = "scored")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8099")]
    listen: String,

    /// Where accepted score rows are appended
    #[arg(long, default_value = "scores.jsonl")]
    store: PathBuf,

    /// Required prefix of the submitted player token
    #[arg(long, default_value = "msaiwk24")]
    token_prefix: String,
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = JsonlStore::open(&args.store)
        .with_context(|| format!("cannot open score store {}", args.store.display()))?;
    let board = web::Data::new(Scoreboard {
        store,
        token_prefix: args.token_prefix,
    });

    info!(listen = %args.listen, store = %args.store.display(), "scored listening");
    HttpServer::new(move || App::new().app_data(board.clone()).configure(configure))
        .bind(&args.listen)
        .with_context(|| format!("cannot bind {}", args.listen))?
        .run()
        .await?;

    Ok(())
}
