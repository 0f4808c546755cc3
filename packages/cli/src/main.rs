#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line client for the BLIP location platform.
//!
//! Credentials and endpoints come from the `BLIP_*` environment variables
//! (see [`blip_client::config`]). Every command prints the status code and
//! body of the platform's answer, pretty-printing JSON bodies, and exits
//! non-zero when the status is not 2xx.
//!
//! Log output goes through `pretty_env_logger`; set `RUST_LOG=debug` to see
//! individual requests.

use std::path::PathBuf;

use blip_bulk_load::BulkLoader;
use blip_client::{BlipClient, ClientConfig, HttpTransport};
use blip_client_models::{
    BlipResponse, BulkLoadRequest, DEFAULT_PROJECTION, LocationOptions, Notifications,
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "blip", about = "Client for the BLIP location platform")]
struct Cli {
    /// Platform base URL (overrides `BLIP_ENDPOINT`).
    #[arg(long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check connectivity and credentials.
    Ping,
    /// List the brands the API user may access.
    Brands,
    /// List a brand's data sources.
    Sources { brand: String },
    /// List a brand's data projections.
    Projections { brand: String },
    /// List a brand's location keys.
    LocationKeys {
        brand: String,
        #[arg(long)]
        projection: Option<String>,
    },
    /// Fetch a single location.
    Location {
        brand: String,
        location: String,
        #[arg(long, default_value = DEFAULT_PROJECTION)]
        projection: String,
        #[arg(long)]
        include_refs: bool,
    },
    /// Query a brand's locations with a JSON query document.
    Query {
        brand: String,
        query: String,
        #[arg(long, default_value = "")]
        view: String,
    },
    /// Add or replace a location from a JSON file.
    PutLocation {
        brand: String,
        location: String,
        source: String,
        file: PathBuf,
    },
    /// Delete a location.
    DeleteLocation {
        brand: String,
        location: String,
        source: String,
    },
    /// Compress, upload and ingest a bulk location file.
    BulkLoad {
        brand: String,
        source: String,
        file: PathBuf,
        /// Remove locations that are absent from the file.
        #[arg(long)]
        implicit_delete: bool,
        #[arg(long, default_value_t = 0)]
        expected_record_count: u64,
        /// Comma-separated addresses notified on success.
        #[arg(long)]
        success_email: Option<String>,
        /// Comma-separated addresses notified on failure.
        #[arg(long)]
        fail_email: Option<String>,
        /// URL called on success.
        #[arg(long)]
        success_callback: Option<String>,
        /// URL called on failure.
        #[arg(long)]
        fail_callback: Option<String>,
    },
}

/// Installs `pretty_env_logger` at `info`, overridable through `RUST_LOG`.
fn init_logger() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .try_init()
        .ok(); // Ignore error if logger was already set
}

async fn execute(
    client: &BlipClient<HttpTransport>,
    command: Command,
) -> Result<BlipResponse, Box<dyn std::error::Error>> {
    let response = match command {
        Command::Ping => client.ping().await?,
        Command::Brands => client.brand_keys().await?,
        Command::Sources { brand } => client.brand_sources(&brand).await?,
        Command::Projections { brand } => client.brand_projections(&brand).await?,
        Command::LocationKeys { brand, projection } => {
            client.location_keys(&brand, projection.as_deref()).await?
        }
        Command::Location {
            brand,
            location,
            projection,
            include_refs,
        } => {
            let options = LocationOptions {
                projection,
                include_refs,
            };
            client.location(&brand, &location, &options).await?
        }
        Command::Query { brand, query, view } => {
            client.query_locations(&brand, &query, &view).await?
        }
        Command::PutLocation {
            brand,
            location,
            source,
            file,
        } => {
            let data = std::fs::read_to_string(&file)?;
            client.put_location(&brand, &location, &source, &data).await?
        }
        Command::DeleteLocation {
            brand,
            location,
            source,
        } => client.delete_location(&brand, &location, &source).await?,
        Command::BulkLoad {
            brand,
            source,
            file,
            implicit_delete,
            expected_record_count,
            success_email,
            fail_email,
            success_callback,
            fail_callback,
        } => {
            let request = BulkLoadRequest::new(brand, source, file)
                .implicit_delete(implicit_delete)
                .expected_record_count(expected_record_count)
                .notifications(Notifications {
                    success_email,
                    fail_email,
                    success_callback,
                    fail_callback,
                });
            BulkLoader::from_http(client.transport())
                .run(&request)
                .await?
        }
    };

    Ok(response)
}

/// Renders a response body, pretty-printing it when it is JSON.
fn render_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.trim_end().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }
    log::debug!("Using {config:?}");

    let client = BlipClient::new(config)?;
    let response = execute(&client, cli.command).await?;

    println!("{}", response.status_code);
    if !response.body.trim().is_empty() {
        println!("{}", render_body(&response.body));
    }

    if !response.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
