//! Server-side ingestion of an uploaded bulk file.

use std::fmt::Write as _;

use blip_client::Transport;
use blip_client_models::{BlipResponse, BulkLoadRequest, Method, ObjectLocation};
use urlencoding::encode;

use crate::BulkLoadError;
use crate::validate::{normalize_email_list, present, validate_notifications};

/// Builds the `bulkLoad` request path for an uploaded object.
///
/// Blank notification fields are omitted; email lists are sent with each
/// address trimmed.
#[must_use]
pub fn bulk_load_path(request: &BulkLoadRequest, location: &ObjectLocation) -> String {
    let mut path = format!(
        "/brand/{}/bulkLoad?s3Path={}&source={}&implicitDelete={}&expectedRecordCount={}",
        encode(&request.brand_key),
        encode(location.as_str()),
        encode(&request.source),
        request.implicit_delete,
        request.expected_record_count,
    );

    let notifications = &request.notifications;
    let emails = |list: &Option<String>| present(list.as_deref()).map(normalize_email_list);
    let callback = |url: &Option<String>| present(url.as_deref()).map(String::from);
    let optional = [
        ("successEmail", emails(&notifications.success_email)),
        ("failEmail", emails(&notifications.fail_email)),
        ("successCallback", callback(&notifications.success_callback)),
        ("failCallback", callback(&notifications.fail_callback)),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            write!(path, "&{name}={}", encode(&value)).unwrap();
        }
    }

    path
}

/// Asks the platform to ingest the object at `location`.
///
/// Notification fields are validated first; an invalid field fails the call
/// before any request is sent. The platform's answer is returned unchanged,
/// whatever its status.
///
/// # Errors
///
/// Returns [`BulkLoadError::InvalidEmail`] or
/// [`BulkLoadError::InvalidCallbackUrl`] for bad notification fields, and
/// [`BulkLoadError::Transport`] if the request fails.
pub async fn trigger_ingestion<T: Transport + ?Sized>(
    transport: &T,
    request: &BulkLoadRequest,
    location: &ObjectLocation,
) -> Result<BlipResponse, BulkLoadError> {
    validate_notifications(&request.notifications)?;

    let path = bulk_load_path(request, location);
    let response = transport.execute(Method::Get, &path, None).await?;

    if response.is_success() {
        log::info!(
            "Bulk load of {location} for brand {} accepted: {}",
            request.brand_key,
            response.status_code
        );
    } else {
        log::warn!(
            "Bulk load of {location} for brand {} rejected: {}",
            request.brand_key,
            response.status_code
        );
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use blip_client::ClientError;
    use blip_client_models::Notifications;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        paths: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn execute(
            &self,
            method: Method,
            path: &str,
            _body: Option<String>,
        ) -> Result<BlipResponse, ClientError> {
            assert_eq!(method, Method::Get);
            self.paths.lock().unwrap().push(path.to_string());
            Ok(BlipResponse::new(202, "accepted"))
        }
    }

    fn location() -> ObjectLocation {
        ObjectLocation("s3://blip-uploads/acme/locations.gz".to_string())
    }

    #[test]
    fn path_carries_required_parameters() {
        let request = BulkLoadRequest::new("acme", "pos feed", "/tmp/locations.csv")
            .implicit_delete(true)
            .expected_record_count(1200);

        assert_eq!(
            bulk_load_path(&request, &location()),
            "/brand/acme/bulkLoad?s3Path=s3%3A%2F%2Fblip-uploads%2Facme%2Flocations.gz\
             &source=pos%20feed&implicitDelete=true&expectedRecordCount=1200"
        );
    }

    #[test]
    fn present_notifications_are_appended_in_order() {
        let request = BulkLoadRequest::new("acme", "pos", "/tmp/locations.csv").notifications(
            Notifications {
                success_email: Some("a@b.com,c@d.org".to_string()),
                fail_email: Some(String::new()),
                success_callback: None,
                fail_callback: Some("https://x.com/hook".to_string()),
            },
        );

        let path = bulk_load_path(&request, &location());

        assert!(path.ends_with(
            "&implicitDelete=false&expectedRecordCount=0\
             &successEmail=a%40b.com%2Cc%40d.org\
             &failCallback=https%3A%2F%2Fx.com%2Fhook"
        ));
        assert!(!path.contains("failEmail"));
        assert!(!path.contains("successCallback"));
    }

    #[test]
    fn email_lists_are_sent_as_validated() {
        let request = BulkLoadRequest::new("acme", "pos", "/tmp/locations.csv").notifications(
            Notifications {
                fail_email: Some(" a@b.com , c@d.org ".to_string()),
                ..Notifications::default()
            },
        );

        assert!(
            bulk_load_path(&request, &location()).ends_with("&failEmail=a%40b.com%2Cc%40d.org")
        );
    }

    #[tokio::test]
    async fn response_is_returned_unchanged() {
        let transport = Recorder::default();
        let request = BulkLoadRequest::new("acme", "pos", "/tmp/locations.csv");

        let response = trigger_ingestion(&transport, &request, &location())
            .await
            .unwrap();

        assert_eq!(response, BlipResponse::new(202, "accepted"));
        assert_eq!(transport.paths.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_email_sends_nothing() {
        let transport = Recorder::default();
        let request = BulkLoadRequest::new("acme", "pos", "/tmp/locations.csv").notifications(
            Notifications {
                success_email: Some("a@b.com,bad".to_string()),
                ..Notifications::default()
            },
        );

        let result = trigger_ingestion(&transport, &request, &location()).await;

        assert!(matches!(result, Err(BulkLoadError::InvalidEmail { .. })));
        assert!(transport.paths.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_callback_sends_nothing() {
        let transport = Recorder::default();
        let request = BulkLoadRequest::new("acme", "pos", "/tmp/locations.csv").notifications(
            Notifications {
                success_callback: Some("ftp://x.com".to_string()),
                ..Notifications::default()
            },
        );

        let result = trigger_ingestion(&transport, &request, &location()).await;

        assert!(matches!(result, Err(BulkLoadError::InvalidCallbackUrl { .. })));
        assert!(transport.paths.lock().unwrap().is_empty());
    }
}
