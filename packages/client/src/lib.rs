#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the BLIP location platform.
//!
//! Requests go through two narrow seams:
//!
//! - [`Transport`] executes one platform request (`GET`/`PUT`/`POST`/`DELETE`
//!   against a path) and returns the raw [`BlipResponse`]. Non-2xx statuses
//!   are returned, never raised; only connection and I/O failures are errors.
//! - [`ObjectStore`] posts a pre-signed multipart form to an object store.
//!
//! [`HttpTransport`] implements both on top of `reqwest`. [`BlipClient`]
//! wraps any [`Transport`] with the platform's brand and location endpoints.

pub mod api;
pub mod config;
pub mod http;

use async_trait::async_trait;
use blip_client_models::{BlipResponse, Method, UploadForm};
use thiserror::Error;

pub use api::BlipClient;
pub use config::ClientConfig;
pub use http::HttpTransport;

/// Errors from loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// Environment variable set to a value that cannot be used.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Name of the environment variable.
        name: String,
        /// The rejected value.
        value: String,
    },
}

/// Errors from talking to the platform or the object store.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or I/O failure while sending or reading.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller-supplied JSON could not be parsed.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Client configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Executes a single request against the platform API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `method` to `path` (relative to the platform endpoint, query
    /// string included) with an optional body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only when no response could be obtained.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<BlipResponse, ClientError>;
}

/// Posts pre-signed multipart forms to an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Posts `form` to `url`, sending the file part last.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only when no response could be obtained.
    async fn post_form(&self, url: &str, form: UploadForm) -> Result<BlipResponse, ClientError>;
}
