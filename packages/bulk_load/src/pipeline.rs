//! Sequencing of the bulk-load steps.

use blip_client::{HttpTransport, ObjectStore, Transport};
use blip_client_models::{BlipResponse, BulkLoadRequest, StepOutcome};

use crate::authorize::authorize_upload;
use crate::compress::compress_file_async;
use crate::trigger::trigger_ingestion;
use crate::upload::upload;
use crate::validate::validate_notifications;
use crate::BulkLoadError;

/// Runs bulk loads against a platform [`Transport`] and an [`ObjectStore`].
///
/// Holds only shared references, so one loader can serve any number of
/// concurrent runs; each run owns its own buffers.
pub struct BulkLoader<'a, T: ?Sized, S: ?Sized> {
    transport: &'a T,
    store: &'a S,
    object_store_endpoint: String,
}

impl<'a> BulkLoader<'a, HttpTransport, HttpTransport> {
    /// Uses `http` for both the platform and the object store, with the
    /// object store endpoint from its configuration.
    #[must_use]
    pub fn from_http(http: &'a HttpTransport) -> Self {
        Self::new(http, http, http.config().object_store_endpoint.clone())
    }
}

impl<'a, T, S> BulkLoader<'a, T, S>
where
    T: Transport + ?Sized,
    S: ObjectStore + ?Sized,
{
    /// Creates a loader over separate platform and object-store backends.
    #[must_use]
    pub fn new(transport: &'a T, store: &'a S, object_store_endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            store,
            object_store_endpoint: object_store_endpoint.into(),
        }
    }

    /// Compresses, authorizes, uploads and triggers ingestion of
    /// `request.file_path`.
    ///
    /// Returns the response of the first remote step that did not succeed
    /// (authorization other than 200, upload other than 204), or the trigger's
    /// response when every earlier step succeeded. Later steps never run
    /// after a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`BulkLoadError`] for invalid notification fields or an
    /// unreadable file (both before any request), a malformed authorization,
    /// or a transport failure.
    pub async fn run(&self, request: &BulkLoadRequest) -> Result<BlipResponse, BulkLoadError> {
        validate_notifications(&request.notifications)?;

        log::info!(
            "Bulk loading {} into brand {} (source {})",
            request.file_path.display(),
            request.brand_key,
            request.source
        );

        let payload = compress_file_async(request.file_path.clone()).await?;
        log::info!(
            "Compressed to {} bytes, md5 {}",
            payload.bytes.len(),
            payload.md5
        );

        let authorization =
            match authorize_upload(self.transport, &request.brand_key, &payload.md5).await? {
                StepOutcome::Completed(authorization) => authorization,
                StepOutcome::Rejected(response) => return Ok(response),
            };

        let location = match upload(
            self.store,
            &self.object_store_endpoint,
            authorization,
            payload,
        )
        .await?
        {
            StepOutcome::Completed(location) => location,
            StepOutcome::Rejected(response) => return Ok(response),
        };
        log::info!("Uploaded to {location}, triggering ingestion");

        trigger_ingestion(self.transport, request, &location).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use blip_client::ClientError;
    use blip_client_models::{Method, Notifications, UploadForm};
    use flate2::read::GzDecoder;

    use super::*;
    use crate::compress::md5_hex;

    const DESCRIPTOR: &str = r#"{
        "s3Bucket": "blip-uploads",
        "data": {
            "acl": "private",
            "bucket": "blip-uploads",
            "key": "acme/locations.gz",
            "content-md5": "b64",
            "policy": "policy",
            "signature": "sig",
            "AWSAccessKeyId": "AKIA"
        }
    }"#;

    /// Scripted platform plus object store that records every call.
    struct FakePlatform {
        authorize: BlipResponse,
        upload: BlipResponse,
        trigger: BlipResponse,
        authorize_unreachable: bool,
        store_unreachable: bool,
        platform_calls: Mutex<Vec<String>>,
        uploads: Mutex<Vec<(String, UploadForm)>>,
    }

    impl FakePlatform {
        fn new(authorize: (u16, &str), upload: (u16, &str), trigger: (u16, &str)) -> Self {
            Self {
                authorize: BlipResponse::new(authorize.0, authorize.1),
                upload: BlipResponse::new(upload.0, upload.1),
                trigger: BlipResponse::new(trigger.0, trigger.1),
                authorize_unreachable: false,
                store_unreachable: false,
                platform_calls: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn happy() -> Self {
            Self::new((200, DESCRIPTOR), (204, ""), (202, "accepted"))
        }

        fn authorize_unreachable(mut self) -> Self {
            self.authorize_unreachable = true;
            self
        }

        fn store_unreachable(mut self) -> Self {
            self.store_unreachable = true;
            self
        }

        fn platform_calls(&self) -> Vec<String> {
            self.platform_calls.lock().unwrap().clone()
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for FakePlatform {
        async fn execute(
            &self,
            method: Method,
            path: &str,
            _body: Option<String>,
        ) -> Result<BlipResponse, ClientError> {
            assert_eq!(method, Method::Get);
            self.platform_calls.lock().unwrap().push(path.to_string());
            if path.contains("/authorizeUpload?") {
                if self.authorize_unreachable {
                    return Err(connection_error());
                }
                Ok(self.authorize.clone())
            } else if path.contains("/bulkLoad?") {
                Ok(self.trigger.clone())
            } else {
                panic!("unexpected request {path}");
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FakePlatform {
        async fn post_form(&self, url: &str, form: UploadForm) -> Result<BlipResponse, ClientError> {
            self.uploads.lock().unwrap().push((url.to_string(), form));
            if self.store_unreachable {
                return Err(connection_error());
            }
            Ok(self.upload.clone())
        }
    }

    fn connection_error() -> ClientError {
        ClientError::Http(reqwest::Client::new().get("not a url").build().unwrap_err())
    }

    fn source_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("blip_pipeline_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"locationKey,name\nstore-1,Main St\nstore-2,Elm St\n").unwrap();
        path
    }

    fn loader(platform: &FakePlatform) -> BulkLoader<'_, FakePlatform, FakePlatform> {
        BulkLoader::new(platform, platform, "https://s3.amazonaws.com")
    }

    #[tokio::test]
    async fn full_run_returns_trigger_response() {
        let platform = FakePlatform::happy();
        let path = source_file("full_run.csv");
        let request = BulkLoadRequest::new("acme", "pos", &path)
            .implicit_delete(true)
            .expected_record_count(2);

        let response = loader(&platform).run(&request).await.unwrap();

        assert_eq!(response, BlipResponse::new(202, "accepted"));
        let calls = platform.platform_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("/brand/acme/authorizeUpload?fileMD5="));
        assert_eq!(
            calls[1],
            "/brand/acme/bulkLoad?s3Path=s3%3A%2F%2Fblip-uploads%2Facme%2Flocations.gz\
             &source=pos&implicitDelete=true&expectedRecordCount=2"
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn authorized_checksum_matches_uploaded_bytes() {
        let platform = FakePlatform::happy();
        let path = source_file("checksum.csv");

        loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap();

        let authorized_md5 = platform.platform_calls()[0]
            .rsplit_once("fileMD5=")
            .map(|(_, md5)| md5.to_string())
            .unwrap();
        let uploads = platform.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        let (url, form) = &uploads[0];
        assert_eq!(url, "https://s3.amazonaws.com/blip-uploads");
        assert_eq!(authorized_md5, md5_hex(&form.file));
        assert_eq!(form.field("content-type"), Some("text/csv"));

        let mut original = Vec::new();
        GzDecoder::new(form.file.as_slice())
            .read_to_end(&mut original)
            .unwrap();
        assert_eq!(original, std::fs::read(&path).unwrap());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn rejected_authorization_stops_the_run() {
        let platform = FakePlatform::new((403, "forbidden"), (204, ""), (202, "accepted"));
        let path = source_file("forbidden.csv");

        let response = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap();

        assert_eq!(response, BlipResponse::new(403, "forbidden"));
        assert_eq!(platform.upload_count(), 0);
        assert_eq!(platform.platform_calls().len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn rejected_upload_skips_trigger_and_keeps_store_body() {
        let body = "<Error><Code>SignatureDoesNotMatch</Code></Error>";
        let platform = FakePlatform::new((200, DESCRIPTOR), (403, body), (202, "accepted"));
        let path = source_file("bad_signature.csv");

        let response = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap();

        assert_eq!(response, BlipResponse::new(403, body));
        assert_eq!(platform.upload_count(), 1);
        let calls = platform.platform_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("/authorizeUpload?"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn rejected_trigger_is_returned_verbatim() {
        let platform = FakePlatform::new((200, DESCRIPTOR), (204, ""), (409, "load in progress"));
        let path = source_file("conflict.csv");

        let response = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap();

        assert_eq!(response, BlipResponse::new(409, "load in progress"));
        assert_eq!(platform.upload_count(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn invalid_notification_makes_no_requests() {
        let platform = FakePlatform::happy();
        let path = source_file("bad_email.csv");
        let request = BulkLoadRequest::new("acme", "pos", &path).notifications(Notifications {
            fail_email: Some("a@b.com,bad".to_string()),
            ..Notifications::default()
        });

        let err = loader(&platform).run(&request).await.unwrap_err();

        assert!(matches!(err, BulkLoadError::InvalidEmail { .. }));
        assert!(err.is_client_side());
        assert!(platform.platform_calls().is_empty());
        assert_eq!(platform.upload_count(), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn valid_notifications_reach_the_trigger() {
        let platform = FakePlatform::happy();
        let path = source_file("notify.csv");
        let request = BulkLoadRequest::new("acme", "pos", &path).notifications(Notifications {
            success_email: Some("a@b.com,c@d.org".to_string()),
            success_callback: Some("https://x.com/hook".to_string()),
            ..Notifications::default()
        });

        let response = loader(&platform).run(&request).await.unwrap();

        assert_eq!(response.status_code, 202);
        let calls = platform.platform_calls();
        let trigger = &calls[1];
        assert!(trigger.contains("&successEmail=a%40b.com%2Cc%40d.org"));
        assert!(trigger.contains("&successCallback=https%3A%2F%2Fx.com%2Fhook"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unreadable_file_makes_no_requests() {
        let platform = FakePlatform::happy();
        let path = std::env::temp_dir().join("blip_pipeline_test_missing.csv");

        let err = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap_err();

        assert!(matches!(err, BulkLoadError::Io { .. }));
        assert!(platform.platform_calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_authorization_is_an_error_not_a_response() {
        let platform = FakePlatform::new((200, "<html>oops</html>"), (204, ""), (202, "accepted"));
        let path = source_file("malformed.csv");

        let err = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap_err();

        assert!(matches!(err, BulkLoadError::MalformedAuthorization { .. }));
        assert!(!err.is_client_side());
        assert_eq!(platform.upload_count(), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn store_transport_failure_ends_the_run_without_retry() {
        let platform = FakePlatform::happy().store_unreachable();
        let path = source_file("store_down.csv");

        let err = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap_err();

        assert!(matches!(err, BulkLoadError::Transport(ClientError::Http(_))));
        assert!(!err.is_client_side());
        assert_eq!(platform.upload_count(), 1);
        let calls = platform.platform_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls.iter().all(|path| !path.contains("/bulkLoad?")));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn authorization_transport_failure_ends_the_run_without_retry() {
        let platform = FakePlatform::happy().authorize_unreachable();
        let path = source_file("platform_down.csv");

        let err = loader(&platform)
            .run(&BulkLoadRequest::new("acme", "pos", &path))
            .await
            .unwrap_err();

        assert!(matches!(err, BulkLoadError::Transport(ClientError::Http(_))));
        assert_eq!(platform.platform_calls().len(), 1);
        assert_eq!(platform.upload_count(), 0);

        let _ = std::fs::remove_file(&path);
    }
}
