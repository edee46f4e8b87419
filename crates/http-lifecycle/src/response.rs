use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use lfs_api::ApiResponse;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::sync::OwnedSemaphorePermit;

/// A completed HTTP call.
///
/// The body is read in full during `execute`, so status, headers and body
/// stay available after cleanup has given the connection slot back.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    slot: Mutex<Option<OwnedSemaphorePermit>>,
}

impl HttpResponse {
    pub(crate) fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        slot: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            slot: Mutex::new(Some(slot)),
        }
    }

    /// Returns the typed status code.
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns `true` once cleanup has given the connection slot back.
    pub fn is_released(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Gives the connection slot back. Returns `false` if it already was.
    pub(crate) fn release(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}

impl ApiResponse for HttpResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}
