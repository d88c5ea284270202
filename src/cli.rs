//! Command-line interface parsing for the estate CLI
//!
//! Raw verbs (`get`, `post`, `put`, `delete`) go through the shared API client
//! with its cache and retry behavior; `login`/`logout` manage the persisted
//! bearer token; `upload` sends media through a stand-alone multipart client.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--param` value is not `key=value`
    #[error("Invalid param: '{0}'. Expected key=value")]
    InvalidParam(String),

    /// A `--body` value is not valid JSON
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// estate - talk to the real-estate marketplace API
#[derive(Parser, Debug)]
#[command(name = "estate")]
#[command(about = "Marketplace API client with response caching and retries")]
#[command(version)]
pub struct Cli {
    /// Server root; requests go to <API_ROOT>/api (defaults to $ESTATE_API_ROOT)
    #[arg(long, global = true, value_name = "URL")]
    pub api_root: Option<String>,

    /// Log every request, retry and cache hit to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// GET a path, e.g. `estate get /properties -p page=1`
    Get {
        path: String,
        /// Query parameter, repeatable
        #[arg(
            short = 'p',
            long = "param",
            value_name = "KEY=VALUE",
            value_parser = parse_param
        )]
        params: Vec<(String, String)>,
        /// Skip the response cache for this read
        #[arg(long)]
        no_cache: bool,
    },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(long, value_name = "JSON")]
        body: Option<String>,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(long, value_name = "JSON")]
        body: Option<String>,
    },
    /// DELETE a path
    Delete { path: String },
    /// List property listings
    Properties {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        limit: u32,
    },
    /// Store a bearer token for later requests
    Login { token: String },
    /// Forget the stored bearer token
    Logout,
    /// Upload files as multipart/form-data
    Upload {
        path: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Form field name for the files
        #[arg(long, default_value = "images")]
        field: String,
    },
}

/// Parses a `key=value` query parameter.
pub fn parse_param(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidParam(s.to_string())),
    }
}

/// Parses an optional `--body` argument as JSON.
pub fn parse_body(body: Option<&str>) -> Result<Option<Value>, CliError> {
    body.map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(CliError::from)
}
