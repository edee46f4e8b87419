//! HTTP transport for the locking API.
//!
//! Implements the [`lfs_api::Lifecycle`] trait over `reqwest`. Request
//! descriptors are mapped onto JSON-over-HTTP calls relative to the base
//! endpoint the driving client passes to `build`, using the
//! `application/vnd.git-lfs+json` media type.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, body encoding, status handling,
//! timeouts and connection limiting all live here. The [`lfs_api`] crate sees
//! only [`lfs_api::Lifecycle`] and [`lfs_api::ApiResponse`].
//!
//! ## Connection slots
//!
//! At most [`HttpConfig::max_in_flight`] calls hold a connection at once.
//! A slot is taken in `build`, carried by the request into the response, and
//! given back in `cleanup`. If `execute` fails the slot is dropped with the
//! request, so a failed call never leaks one.

mod config;
mod lifecycle;
mod response;

use std::sync::Arc;

use lfs_api::{ApiError, Client, Endpoint};

pub use config::HttpConfig;
pub use lifecycle::{HttpLifecycle, HttpRequest, MEDIA_TYPE};
pub use response::HttpResponse;

/// Creates a [`Client`] that talks HTTP to `root`.
///
/// Fails with [`ApiError::Construction`] if `root` is not a valid base URL or
/// `config` cannot be turned into an HTTP client.
///
/// This is the usual way to build an HTTP client. To share one transport (and
/// its connection slots) between several endpoints, create the
/// [`HttpLifecycle`] once and pass it to [`Client::from_parts`] for each.
pub fn client(root: &str, config: &HttpConfig) -> Result<Client<HttpLifecycle>, ApiError> {
    let base = Endpoint::parse(root)?;
    let lifecycle = HttpLifecycle::new(config).map_err(|err| match err {
        ApiError::Construction { message, .. } => ApiError::Construction {
            endpoint: root.to_string(),
            message,
        },
        other => other,
    })?;
    Ok(Client::from_parts(base, Arc::new(lifecycle)))
}
