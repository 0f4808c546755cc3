//! Brand and location endpoints.
//!
//! Each method maps to exactly one platform request and returns the raw
//! [`BlipResponse`]; interpreting the status code is left to the caller.

use blip_client_models::{BlipResponse, DEFAULT_PROJECTION, LocationOptions, Method};
use urlencoding::encode;

use crate::{ClientConfig, ClientError, HttpTransport, Transport};

/// Client for the BLIP platform API over any [`Transport`].
#[derive(Debug, Clone)]
pub struct BlipClient<T = HttpTransport> {
    transport: T,
}

impl BlipClient<HttpTransport> {
    /// Creates a client backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    /// Creates a client from `BLIP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if required variables are missing.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> BlipClient<T> {
    /// Creates a client over an existing transport.
    #[must_use]
    pub const fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// The transport requests are sent through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Checks that the platform is reachable and the credentials are valid.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn ping(&self) -> Result<BlipResponse, ClientError> {
        self.transport.execute(Method::Get, "/ping", None).await
    }

    /// Lists the brand keys the API user may access.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn brand_keys(&self) -> Result<BlipResponse, ClientError> {
        self.transport.execute(Method::Get, "/brand", None).await
    }

    /// Lists the data sources available to a brand.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn brand_sources(&self, brand_key: &str) -> Result<BlipResponse, ClientError> {
        let path = format!("/brand/{}/source", encode(brand_key));
        self.transport.execute(Method::Get, &path, None).await
    }

    /// Lists the data projections available to a brand.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn brand_projections(&self, brand_key: &str) -> Result<BlipResponse, ClientError> {
        let path = format!("/brand/{}/projection", encode(brand_key));
        self.transport.execute(Method::Get, &path, None).await
    }

    /// Lists the location keys of a brand, filtered by `projection`
    /// (`universal` when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn location_keys(
        &self,
        brand_key: &str,
        projection: Option<&str>,
    ) -> Result<BlipResponse, ClientError> {
        let path = format!(
            "/brand/{}/location?projection={}",
            encode(brand_key),
            encode(projection.unwrap_or(DEFAULT_PROJECTION)),
        );
        self.transport.execute(Method::Get, &path, None).await
    }

    /// Fetches a single location document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn location(
        &self,
        brand_key: &str,
        location_key: &str,
        options: &LocationOptions,
    ) -> Result<BlipResponse, ClientError> {
        let path = format!(
            "/brand/{}/location/{}?projection={}&includeRefs={}",
            encode(brand_key),
            encode(location_key),
            encode(&options.projection),
            options.include_refs,
        );
        self.transport.execute(Method::Get, &path, None).await
    }

    /// Runs a platform query against a brand's locations.
    ///
    /// `query` is a JSON document in the platform query language; `view`
    /// names the result view.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidJson`] without sending anything if
    /// `query` is not valid JSON, or [`ClientError`] if no response could be
    /// obtained.
    pub async fn query_locations(
        &self,
        brand_key: &str,
        query: &str,
        view: &str,
    ) -> Result<BlipResponse, ClientError> {
        let query: serde_json::Value = serde_json::from_str(query)?;
        let body = serde_json::json!({ "query": query, "view": view }).to_string();
        let path = format!("/brand/{}/locationList", encode(brand_key));
        self.transport.execute(Method::Post, &path, Some(body)).await
    }

    /// Adds or replaces a location.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn put_location(
        &self,
        brand_key: &str,
        location_key: &str,
        source: &str,
        location_data: &str,
    ) -> Result<BlipResponse, ClientError> {
        let path = location_path(brand_key, location_key, source);
        self.transport
            .execute(Method::Put, &path, Some(location_data.to_string()))
            .await
    }

    /// Deletes a location.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if no response could be obtained.
    pub async fn delete_location(
        &self,
        brand_key: &str,
        location_key: &str,
        source: &str,
    ) -> Result<BlipResponse, ClientError> {
        let path = location_path(brand_key, location_key, source);
        self.transport.execute(Method::Delete, &path, None).await
    }
}

fn location_path(brand_key: &str, location_key: &str, source: &str) -> String {
    format!(
        "/brand/{}/location/{}?source={}",
        encode(brand_key),
        encode(location_key),
        encode(source),
    )
}
