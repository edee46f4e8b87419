use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lfs_api::{ApiError, DecodeTarget, Endpoint, Lifecycle, Method, RequestSchema};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::{HttpConfig, HttpResponse};

/// Media type of every request and response body.
pub const MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

/// Longest server-supplied text copied into an [`ApiError::Status`] message.
const MAX_MESSAGE_CHARS: usize = 256;

/// [`Lifecycle`] that carries request descriptors over HTTP.
#[derive(Debug)]
pub struct HttpLifecycle {
    client: reqwest::Client,
    slots: Arc<Semaphore>,
}

/// An HTTP request that holds a connection slot.
#[derive(Debug)]
pub struct HttpRequest {
    inner: reqwest::Request,
    slot: OwnedSemaphorePermit,
}

impl HttpRequest {
    /// Returns the fully resolved URL.
    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &reqwest::Method {
        self.inner.method()
    }
}

impl HttpLifecycle {
    /// Creates a lifecycle with the limits and timeouts in `config`.
    ///
    /// Request paths are resolved against the endpoint of whichever client
    /// drives the lifecycle, so one lifecycle can serve several clients.
    ///
    /// Fails with [`ApiError::Construction`] if `config` is unusable.
    pub fn new(config: &HttpConfig) -> Result<Self, ApiError> {
        let construction_error = |message: String| ApiError::Construction {
            endpoint: String::new(),
            message,
        };

        if config.max_in_flight == 0 || config.max_in_flight > Semaphore::MAX_PERMITS {
            return Err(construction_error(format!(
                "max_in_flight must be between 1 and {}",
                Semaphore::MAX_PERMITS
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| construction_error(err.to_string()))?;

        Ok(Self {
            client,
            slots: Arc::new(Semaphore::new(config.max_in_flight)),
        })
    }

    /// Returns the number of connection slots currently free.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Appends `schema`'s path to the path of `base` and sets its query.
    fn resolve(base: &Endpoint, schema: &RequestSchema) -> Result<Url, &'static str> {
        let relative = schema
            .path()
            .strip_prefix('/')
            .ok_or("path must start with '/'")?;

        for segment in relative.split('/') {
            if segment.is_empty() {
                return Err("path contains an empty segment");
            }
            if segment == "." || segment == ".." {
                return Err("path contains a relative segment");
            }
            if segment
                .chars()
                .any(|c| c.is_control() || c.is_whitespace() || matches!(c, '?' | '#' | '\\'))
            {
                return Err("path contains a reserved character");
            }
            if !escapes_are_well_formed(segment) {
                return Err("path contains a malformed percent escape");
            }
        }

        let mut url = base.as_url().clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), schema.path());
        url.set_path(&joined);
        url.set_fragment(None);
        url.set_query(None);
        if !schema.query().is_empty() {
            url.query_pairs_mut().extend_pairs(schema.query());
        }
        Ok(url)
    }
}

/// Every `%` must start a `%XX` escape.
fn escapes_are_well_formed(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(err: &reqwest::Error) -> ApiError {
    ApiError::Transport {
        message: err.to_string(),
        timed_out: err.is_timeout(),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn status_error(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ApiError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                text.chars().take(MAX_MESSAGE_CHARS).collect()
            }
        }
    };

    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    ApiError::Status {
        status: status.as_u16(),
        message,
        retry_after,
    }
}

#[async_trait]
impl Lifecycle for HttpLifecycle {
    type Request = HttpRequest;
    type Response = HttpResponse;

    async fn build(
        &self,
        base: &Endpoint,
        schema: &RequestSchema,
    ) -> Result<HttpRequest, ApiError> {
        let build_error = |message: String| ApiError::Build {
            method: schema.method(),
            path: schema.path().to_string(),
            message,
        };

        let url = Self::resolve(base, schema)
            .map_err(|message| build_error(message.to_string()))?;

        let mut builder = self
            .client
            .request(http_method(schema.method()), url)
            .header(ACCEPT, MEDIA_TYPE);
        if let Some(body) = schema.body() {
            let encoded = body.to_json().map_err(|err| build_error(err.to_string()))?;
            builder = builder.header(CONTENT_TYPE, MEDIA_TYPE).body(encoded);
        }
        let inner = builder.build().map_err(|err| build_error(err.to_string()))?;

        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| build_error("transport has been shut down".to_string()))?;

        debug!(url = %inner.url(), "HTTP request built");
        Ok(HttpRequest { inner, slot })
    }

    async fn execute(
        &self,
        request: HttpRequest,
        into: Option<&dyn DecodeTarget>,
    ) -> Result<HttpResponse, ApiError> {
        let HttpRequest { inner, slot } = request;

        let response = self
            .client
            .execute(inner)
            .await
            .map_err(|err| transport_error(&err))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error(&err))?;
        debug!(status = status.as_u16(), bytes = body.len(), "HTTP response received");

        if !status.is_success() {
            return Err(status_error(status, &headers, &body));
        }
        if let Some(target) = into {
            target.decode(&body)?;
        }

        Ok(HttpResponse::new(status, headers, body, slot))
    }

    async fn cleanup(&self, response: &HttpResponse) -> Result<(), ApiError> {
        if response.release() {
            Ok(())
        } else {
            Err(ApiError::Cleanup {
                message: "connection slot was already released".to_string(),
            })
        }
    }
}
