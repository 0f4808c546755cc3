//! Pre-signed multipart upload to the object store.
//!
//! Part order is fixed: `acl`, `bucket`, `key`, `content-md5`, `policy`,
//! `signature`, `AWSAccessKeyId`, any extra signed fields, `content-type`,
//! then `file`. The object store checks the policy against the fields that
//! precede the file part, so `file` must always be the final part.

use blip_client::ObjectStore;
use blip_client_models::{
    CompressedPayload, ObjectLocation, StepOutcome, UploadAuthorization, UploadForm,
};

use crate::BulkLoadError;

/// Status the object store answers a successful POST with.
pub const UPLOAD_SUCCESS_STATUS: u16 = 204;

/// Field names set by [`build_form`] itself; extra descriptor fields with
/// these names are dropped.
const RESERVED_FIELDS: &[&str] = &["content-type", "file"];

/// Builds the multipart form for `payload` from a signed descriptor.
#[must_use]
pub fn build_form(authorization: UploadAuthorization, payload: CompressedPayload) -> UploadForm {
    let data = authorization.data;
    let extra = data.extra_fields();

    let mut fields = vec![
        ("acl".to_string(), data.acl),
        ("bucket".to_string(), data.bucket),
        ("key".to_string(), data.key),
        ("content-md5".to_string(), data.content_md5),
        ("policy".to_string(), data.policy),
        ("signature".to_string(), data.signature),
        ("AWSAccessKeyId".to_string(), data.aws_access_key_id),
    ];

    fields.extend(extra.into_iter().filter(|(name, _)| {
        !RESERVED_FIELDS
            .iter()
            .any(|reserved| name.eq_ignore_ascii_case(reserved))
    }));

    fields.push(("content-type".to_string(), payload.mime_type));

    UploadForm {
        fields,
        file_name: format!("{}.gz", payload.file_name),
        file: payload.bytes,
    }
}

/// Uploads `payload` using `authorization`, in a single attempt.
///
/// The form is posted to the descriptor's `url`, or to
/// `{object_store_endpoint}/{bucket}` when it has none. A
/// [`UPLOAD_SUCCESS_STATUS`] answer yields the object's [`ObjectLocation`];
/// any other status is returned as [`StepOutcome::Rejected`] with the store's
/// body.
///
/// # Errors
///
/// Returns [`BulkLoadError::Transport`] if the POST cannot be completed.
pub async fn upload<S: ObjectStore + ?Sized>(
    store: &S,
    object_store_endpoint: &str,
    authorization: UploadAuthorization,
    payload: CompressedPayload,
) -> Result<StepOutcome<ObjectLocation>, BulkLoadError> {
    let url = authorization.upload_url(object_store_endpoint);
    let location = authorization.object_location();
    let size = payload.bytes.len();

    let response = store
        .post_form(&url, build_form(authorization, payload))
        .await?;

    if response.status_code != UPLOAD_SUCCESS_STATUS {
        log::warn!(
            "Upload of {location} to {url} rejected: {}",
            response.status_code
        );
        return Ok(StepOutcome::Rejected(response));
    }

    log::debug!("Uploaded {size} bytes to {location}");

    Ok(StepOutcome::Completed(location))
}
