#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Plain data types shared by the BLIP client and the bulk-load pipeline.
//!
//! Every platform call produces a [`BlipResponse`]: the raw status code and
//! body text, exactly as the server sent them. The bulk-load types
//! ([`BulkLoadRequest`], [`UploadAuthorization`], [`CompressedPayload`],
//! [`UploadForm`], [`ObjectLocation`]) describe the data that flows between
//! pipeline steps.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Projection used when the caller does not name one.
pub const DEFAULT_PROJECTION: &str = "universal";

/// HTTP verbs the platform API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

/// Status code and body text returned by a single request.
///
/// Non-2xx statuses are ordinary values of this type, not errors. Callers
/// decide what counts as success for each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlipResponse {
    /// Numeric HTTP status code.
    pub status_code: u16,
    /// Response body text (may be empty).
    pub body: String,
}

impl BlipResponse {
    #[must_use]
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        200 <= self.status_code && self.status_code <= 299
    }
}

impl std::fmt::Display for BlipResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code, self.body)
    }
}

/// Options for fetching a single location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOptions {
    /// Data projection used to filter the location document.
    pub projection: String,
    /// Whether objects referenced by the location are inlined.
    pub include_refs: bool,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            projection: DEFAULT_PROJECTION.to_string(),
            include_refs: false,
        }
    }
}

/// Optional notification targets for a bulk load.
///
/// Email fields hold comma-separated address lists; callback fields hold a
/// single `http`/`https` URL. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications {
    /// Addresses notified when ingestion succeeds.
    pub success_email: Option<String>,
    /// Addresses notified when ingestion fails.
    pub fail_email: Option<String>,
    /// URL called when ingestion succeeds.
    pub success_callback: Option<String>,
    /// URL called when ingestion fails.
    pub fail_callback: Option<String>,
}

/// Caller-supplied parameters for one bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLoadRequest {
    /// Brand that owns the locations.
    pub brand_key: String,
    /// Data source the file is attributed to.
    pub source: String,
    /// Local file to compress and upload.
    pub file_path: PathBuf,
    /// Remove locations that are absent from the file.
    pub implicit_delete: bool,
    /// Number of records the platform should expect in the file.
    pub expected_record_count: u64,
    /// Optional notification targets.
    pub notifications: Notifications,
}

impl BulkLoadRequest {
    /// Creates a request with `implicit_delete = false`, an expected record
    /// count of zero and no notifications.
    #[must_use]
    pub fn new(
        brand_key: impl Into<String>,
        source: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            brand_key: brand_key.into(),
            source: source.into(),
            file_path: file_path.into(),
            implicit_delete: false,
            expected_record_count: 0,
            notifications: Notifications::default(),
        }
    }

    #[must_use]
    pub const fn implicit_delete(mut self, implicit_delete: bool) -> Self {
        self.implicit_delete = implicit_delete;
        self
    }

    #[must_use]
    pub const fn expected_record_count(mut self, count: u64) -> Self {
        self.expected_record_count = count;
        self
    }

    #[must_use]
    pub fn notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }
}

/// Pre-signed POST descriptor issued by `authorizeUpload`.
///
/// Wire shape:
///
/// ```text
/// { "s3Bucket": "...", "url": "...", "data": { "acl": "...", "key": "...", ... } }
/// ```
///
/// At least one of `s3Bucket` or `url` is present in practice; when `url` is
/// missing the upload endpoint is derived from the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAuthorization {
    /// Bucket the object is uploaded into.
    #[serde(default)]
    pub s3_bucket: Option<String>,
    /// Explicit upload endpoint, when the platform supplies one.
    #[serde(default)]
    pub url: Option<String>,
    /// Form fields that must accompany the upload.
    pub data: UploadFields,
}

impl UploadAuthorization {
    /// Bucket name, preferring the top-level `s3Bucket` over the form field.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.s3_bucket.as_deref().unwrap_or(&self.data.bucket)
    }

    /// Endpoint the multipart form is posted to.
    ///
    /// Uses `url` verbatim when present, otherwise
    /// `{object_store_endpoint}/{bucket}`.
    #[must_use]
    pub fn upload_url(&self, object_store_endpoint: &str) -> String {
        self.url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                object_store_endpoint.trim_end_matches('/'),
                self.bucket()
            )
        })
    }

    /// Where the object lives once the upload succeeds.
    #[must_use]
    pub fn object_location(&self) -> ObjectLocation {
        ObjectLocation(format!("s3://{}/{}", self.bucket(), self.data.key))
    }
}

/// Signed form fields from an [`UploadAuthorization`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadFields {
    pub acl: String,
    pub bucket: String,
    pub key: String,
    #[serde(rename = "content-md5")]
    pub content_md5: String,
    pub policy: String,
    pub signature: String,
    #[serde(rename = "AWSAccessKeyId")]
    pub aws_access_key_id: String,
    /// Any further fields the signer requires, sent after the named fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl UploadFields {
    /// Extra fields as form values, in name order.
    ///
    /// Strings are sent as-is, numbers and booleans in their JSON form.
    /// Nulls, arrays and objects have no form representation and are skipped.
    #[must_use]
    pub fn extra_fields(&self) -> Vec<(String, String)> {
        self.extra
            .iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Null
                    | serde_json::Value::Array(_)
                    | serde_json::Value::Object(_) => return None,
                };
                Some((name.clone(), value))
            })
            .collect()
    }
}

/// Gzip-compressed file contents and their checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPayload {
    /// Gzip stream.
    pub bytes: Vec<u8>,
    /// MD5 of `bytes`, lowercase hex.
    pub md5: String,
    /// Best-effort MIME type of the uncompressed file.
    pub mime_type: String,
    /// File name of the original file.
    pub file_name: String,
}

/// Multipart form for a pre-signed object-store POST.
///
/// Text fields are sent in insertion order and the file part is always sent
/// last: object stores validate the policy against the fields received
/// before the file and ignore anything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    /// Ordered `(name, value)` text fields.
    pub fields: Vec<(String, String)>,
    /// File name reported for the file part.
    pub file_name: String,
    /// File part contents.
    pub file: Vec<u8>,
}

impl UploadForm {
    /// Field names in the order they are sent, ending with `file`.
    #[must_use]
    pub fn part_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(std::iter::once("file"))
            .collect()
    }

    /// Value of the first text field called `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Location of an uploaded object, in `s3://bucket/key` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation(pub String);

impl ObjectLocation {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a pipeline step that talks to a remote service.
///
/// `Rejected` carries the remote response verbatim so the caller sees the
/// exact status and body of the step that refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    /// The step succeeded and produced a value for the next step.
    Completed(T),
    /// The remote service answered with a non-success status.
    Rejected(BlipResponse),
}
