//! estate - command-line client for the real-estate marketplace API
//!
//! Sends requests through the shared API client and prints the JSON payload
//! to stdout. Logs go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use estate::api::{ApiClient, ApiResponse, FilePart, RequestConfig};
use estate::cli::{parse_body, Cli, Command};
use estate::config::ApiConfig;
use estate::data::{Marketplace, PropertyQuery};
use estate::storage::{LocalStorage, MemoryTokenStore, TokenStore};

/// Sets up stderr logging; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("estate=debug,warn")
        } else {
            EnvFilter::new("estate=warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Persisted token storage, or an in-memory one when there is no home directory
fn token_store() -> Arc<dyn TokenStore> {
    match LocalStorage::new() {
        Some(storage) => Arc::new(storage),
        None => {
            warn!("no data directory available, tokens will not be persisted");
            Arc::new(MemoryTokenStore::new())
        }
    }
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ApiConfig::from_env();
    if let Some(root) = cli.api_root {
        config = config.with_api_root(root);
    }

    let client = ApiClient::new(&config, token_store())?;
    let market = Marketplace::new(client.clone());

    match cli.command {
        Command::Get {
            path,
            params,
            no_cache,
        } => {
            let mut config = RequestConfig::new();
            for (key, value) in params {
                config = config.param(key, value);
            }
            let response: ApiResponse<Value> = client.get(&path, config, !no_cache).await?;
            print_json(&response.data)?;
        }
        Command::Post { path, body } => {
            let body = parse_body(body.as_deref())?;
            let response: ApiResponse<Value> = client
                .post(&path, body.as_ref(), RequestConfig::new())
                .await?;
            print_json(&response.data)?;
        }
        Command::Put { path, body } => {
            let body = parse_body(body.as_deref())?;
            let response: ApiResponse<Value> = client
                .put(&path, body.as_ref(), RequestConfig::new())
                .await?;
            print_json(&response.data)?;
        }
        Command::Delete { path } => {
            let response: ApiResponse<Value> = client.delete(&path, RequestConfig::new()).await?;
            print_json(&response.data)?;
        }
        Command::Properties { page, limit } => {
            let properties = market.properties(PropertyQuery { page, limit }).await?;
            print_json(&serde_json::to_value(properties)?)?;
        }
        Command::Login { token } => {
            client.tokens().store_token(&token)?;
            client.clear_cache();
            eprintln!("Token stored");
        }
        Command::Logout => {
            market.logout()?;
            eprintln!("Token removed");
        }
        Command::Upload { path, files, field } => {
            let parts = files
                .iter()
                .map(|file| FilePart::from_path(field.clone(), file))
                .collect::<Result<Vec<_>, _>>()?;
            let uploaded = market.upload_media(&path, parts).await?;
            print_json(&uploaded)?;
        }
    }

    Ok(())
}
