//! Pre-signed upload authorization.

use blip_client::Transport;
use blip_client_models::{Method, StepOutcome, UploadAuthorization};
use urlencoding::encode;

use crate::BulkLoadError;

/// Asks the platform for permission to upload a file with checksum `md5`
/// into `brand_key`.
///
/// Issues `GET /brand/{brand}/authorizeUpload?fileMD5={md5}`. A 200 answer is
/// parsed into an [`UploadAuthorization`]; any other status is returned as
/// [`StepOutcome::Rejected`] unchanged.
///
/// # Errors
///
/// Returns [`BulkLoadError::Transport`] if the request fails and
/// [`BulkLoadError::MalformedAuthorization`] if a 200 body is not a valid
/// descriptor.
pub async fn authorize_upload<T: Transport + ?Sized>(
    transport: &T,
    brand_key: &str,
    md5: &str,
) -> Result<StepOutcome<UploadAuthorization>, BulkLoadError> {
    let path = format!(
        "/brand/{}/authorizeUpload?fileMD5={}",
        encode(brand_key),
        encode(md5)
    );
    let response = transport.execute(Method::Get, &path, None).await?;

    if response.status_code != 200 {
        log::warn!(
            "Upload authorization for brand {brand_key} rejected: {}",
            response.status_code
        );
        return Ok(StepOutcome::Rejected(response));
    }

    let authorization: UploadAuthorization = serde_json::from_str(&response.body)
        .map_err(|source| BulkLoadError::MalformedAuthorization { source })?;

    log::debug!(
        "Authorized upload of {} to bucket {}",
        authorization.data.key,
        authorization.bucket()
    );

    Ok(StepOutcome::Completed(authorization))
}
