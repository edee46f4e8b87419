//! The call orchestrator.
//!
//! [`Client`] owns a base [`Endpoint`] and a shared [`Lifecycle`]. Every
//! request is addressed relative to the client's endpoint, which is handed to
//! [`Lifecycle::build`]. Both are fixed at construction, so a client (or any
//! of its clones) can be used from many tasks at once without locking.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn, Instrument};

use crate::{ApiError, Endpoint, Lifecycle, RequestId, RequestSchema};

/// Executes request descriptors against one endpoint through one lifecycle.
///
/// ```ignore
/// let client = Client::new("https://git-server.com/repo.git/info/lfs", lifecycle)?;
/// let (slot, schema) = LockService.lock(request);
/// client.call(schema).await?;
/// let response = slot.take();
/// ```
pub struct Client<L> {
    /// Root URL all requests are made against.
    base: Endpoint,
    /// Transport used by every call through this client.
    lifecycle: Arc<L>,
}

impl<L: Lifecycle> Client<L> {
    /// Parses `root` and creates a client that drives `lifecycle`.
    ///
    /// Fails with [`ApiError::Construction`] if `root` is not a valid base
    /// URL; no client is produced in that case.
    pub fn new(root: &str, lifecycle: L) -> Result<Self, ApiError> {
        Ok(Self::from_parts(Endpoint::parse(root)?, Arc::new(lifecycle)))
    }

    /// Creates a client from an already parsed endpoint and a lifecycle that
    /// may be shared with other clients.
    pub fn from_parts(base: Endpoint, lifecycle: Arc<L>) -> Self {
        Self { base, lifecycle }
    }

    /// Returns the base endpoint.
    pub fn base(&self) -> &Endpoint {
        &self.base
    }

    /// Returns the lifecycle.
    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Performs the request described by `schema`.
    ///
    /// Drives the lifecycle through build, execute and cleanup, in that
    /// order. The first error is returned as-is and later phases are skipped.
    /// On error, whichever phase failed, the schema's decode target is
    /// emptied and the call must be treated as not having taken effect.
    ///
    /// On success the decode target holds the decoded body, cleanup has
    /// completed, and the returned response can still be inspected.
    ///
    /// Exactly one attempt is made.
    pub async fn call(&self, schema: RequestSchema) -> Result<L::Response, ApiError> {
        let span = tracing::debug_span!(
            "lfs_api.call",
            request_id = %RequestId::new_random(),
            method = %schema.method(),
            path = schema.path(),
        );
        let result = self.run_phases(&schema).instrument(span).await;
        if result.is_err() {
            if let Some(target) = schema.decode_target() {
                target.discard();
            }
        }
        result
    }

    async fn run_phases(&self, schema: &RequestSchema) -> Result<L::Response, ApiError> {
        let request = self
            .lifecycle
            .build(&self.base, schema)
            .await
            .inspect_err(|err| warn!(phase = "build", error = %err, "Request could not be built"))?;
        debug!(phase = "build", "Request built");

        let response = self
            .lifecycle
            .execute(request, schema.decode_target())
            .await
            .inspect_err(|err| warn!(phase = "execute", error = %err, "Request failed"))?;
        debug!(phase = "execute", "Response received");

        self.lifecycle
            .cleanup(&response)
            .await
            .inspect_err(|err| warn!(phase = "cleanup", error = %err, "Response cleanup failed"))?;
        debug!(phase = "cleanup", "Call complete");

        Ok(response)
    }
}

impl<L> Clone for Client<L> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<L> fmt::Debug for Client<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
