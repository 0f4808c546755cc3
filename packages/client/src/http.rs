//! `reqwest`-backed [`Transport`] and [`ObjectStore`].
//!
//! Platform requests carry `Authorization: Basic base64(api_key:secret_key)`
//! and JSON content negotiation headers. Object-store posts carry no platform
//! credentials; the pre-signed form fields authorize them.

use async_trait::async_trait;
use blip_client_models::{BlipResponse, Method, UploadForm};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart;

use crate::{ClientConfig, ClientError, ObjectStore, Transport};

/// HTTP transport for the platform API and the object store.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Builds a transport with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Configuration this transport was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint)
    }
}

const fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<BlipResponse, ClientError> {
        let url = self.build_url(path);
        log::debug!("{method} {url}");

        let mut request = self
            .client
            .request(to_reqwest(method), &url)
            .basic_auth(&self.config.api_key, Some(&self.config.secret_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let body = response.text().await?;

        log::debug!("{method} {url} -> {status_code}");

        Ok(BlipResponse { status_code, body })
    }
}

#[async_trait]
impl ObjectStore for HttpTransport {
    async fn post_form(&self, url: &str, form: UploadForm) -> Result<BlipResponse, ClientError> {
        log::debug!(
            "POST {url} (multipart, {} bytes, parts: {})",
            form.file.len(),
            form.part_names().join(",")
        );

        let mut body = multipart::Form::new();
        for (name, value) in form.fields {
            body = body.text(name, value);
        }
        // Must stay the final part.
        body = body.part("file", multipart::Part::bytes(form.file).file_name(form.file_name));

        let response = self.client.post(url).multipart(body).send().await?;
        let status_code = response.status().as_u16();
        let body = response.text().await?;

        log::debug!("POST {url} -> {status_code}");

        Ok(BlipResponse { status_code, body })
    }
}
