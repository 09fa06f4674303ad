//! HTTP client for communicating with the content backend

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart::Form};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use studio_core::{Error, Result, config::ApiConfig};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response body, bare or wrapped in a `{ "data": ... }` envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// API client for making HTTP requests to the content backend
///
/// Clones share the bearer token, so logging in through one clone
/// authorizes every resource group created from it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new API client with an explicit request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a client from the `[api]` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(config.base_url.clone(), config.timeout())
    }

    /// Set the bearer token for authentication
    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// Replace or clear the bearer token
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Current bearer token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, "api request");

        let request = self.client.request(method, url);
        match self.token.read().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder, path: &str, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport_error(&e, what))?;
        check_status(response, path).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, what: &str) -> Result<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e, what))?;

        let payload: Payload<T> = serde_json::from_slice(&body)?;
        Ok(payload.into_inner())
    }

    fn transport_error(&self, err: &reqwest::Error, what: &str) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Network(format!("Failed to {what}: {err}"))
        }
    }

    /// `GET` a JSON document
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the response cannot be parsed.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let what = format!("fetch {path}");
        let response = self
            .execute(self.request(Method::GET, path), path, &what)
            .await?;
        self.decode(response, &what).await
    }

    /// `POST` a JSON body and decode the reply
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the response cannot be parsed.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let what = format!("post to {path}");
        let response = self
            .execute(self.request(Method::POST, path).json(body), path, &what)
            .await?;
        self.decode(response, &what).await
    }

    /// `PUT` a JSON body and decode the reply
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the response cannot be parsed.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let what = format!("update {path}");
        let response = self
            .execute(self.request(Method::PUT, path).json(body), path, &what)
            .await?;
        self.decode(response, &what).await
    }

    /// `PUT` a JSON body, ignoring whatever the backend replies with
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    pub async fn put_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        let what = format!("update {path}");
        self.execute(self.request(Method::PUT, path).json(body), path, &what)
            .await
            .map(drop)
    }

    /// `DELETE` a document
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let what = format!("delete {path}");
        self.execute(self.request(Method::DELETE, path), path, &what)
            .await
            .map(drop)
    }

    /// Send a multipart form and decode the reply
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the response cannot be parsed.
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<T> {
        let what = format!("upload to {path}");
        let response = self
            .execute(self.request(method, path).multipart(form), path, &what)
            .await?;
        self.decode(response, &what).await
    }
}

/// Map a non-success status to the matching [`Error`] variant
async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(match status {
        StatusCode::UNAUTHORIZED => Error::Authentication(message),
        StatusCode::NOT_FOUND => Error::NotFound {
            resource: path.trim_start_matches('/').to_string(),
        },
        _ => Error::Http {
            status: status.as_u16(),
            message,
        },
    })
}

/// The `message` or `error` string the backend puts in error bodies
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(ToString::to_string)
}
