#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bulk location file upload for the BLIP platform.
//!
//! A bulk load runs five steps in strict sequence:
//!
//! 1. **Validate** the optional notification fields ([`validate`]).
//! 2. **Compress** the local file with gzip and take the MD5 of the
//!    compressed bytes ([`compress`]).
//! 3. **Authorize** the upload: the platform returns a pre-signed POST
//!    descriptor for that checksum ([`authorize`]).
//! 4. **Upload** the compressed bytes to the object store as a multipart
//!    form ([`upload`]).
//! 5. **Trigger** server-side ingestion of the uploaded object ([`trigger`]).
//!
//! The first step that fails ends the run. Remote rejections come back as the
//! rejecting step's [`BlipResponse`](blip_client_models::BlipResponse),
//! untouched; local failures come back as [`BulkLoadError`]. Nothing is
//! retried, and an object uploaded before a failed trigger is left in place.

pub mod authorize;
pub mod compress;
pub mod pipeline;
pub mod trigger;
pub mod upload;
pub mod validate;

use blip_client::ClientError;
use thiserror::Error;

pub use pipeline::BulkLoader;

/// Errors that end a bulk load before a remote service could answer.
#[derive(Debug, Error)]
pub enum BulkLoadError {
    /// The source file could not be read or compressed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being processed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A request could not be completed (connection, timeout, I/O).
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),

    /// The platform answered 200 to `authorizeUpload` with a body that is not
    /// a valid upload descriptor.
    #[error("Malformed upload authorization: {source}")]
    MalformedAuthorization {
        /// Parse failure.
        source: serde_json::Error,
    },

    /// A notification email field holds an invalid address.
    #[error("Invalid email address in {field}: {value:?}")]
    InvalidEmail {
        /// Request field name (e.g. `successEmail`).
        field: &'static str,
        /// The offending list element.
        value: String,
    },

    /// A notification callback field is not an `http`/`https` URL.
    #[error("Invalid callback URL in {field}: {value:?}")]
    InvalidCallbackUrl {
        /// Request field name (e.g. `failCallback`).
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl BulkLoadError {
    /// Whether the error was detected locally, before any request was sent.
    #[must_use]
    pub const fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::InvalidEmail { .. } | Self::InvalidCallbackUrl { .. }
        )
    }
}
