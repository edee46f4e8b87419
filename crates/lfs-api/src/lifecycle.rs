//! The transport port.
//!
//! A [`Lifecycle`] is one way of carrying a [`RequestSchema`] to the lock
//! authority and back. [`crate::Client`] drives every call through the same
//! three phases, so any transport that implements them can be dropped in
//! without touching call sites.
//!
//! ## Phase contract
//!
//! | Phase | Receives | Produces | Errors |
//! |-------|----------|----------|--------|
//! | [`build`](Lifecycle::build) | the base endpoint, the descriptor | a transport request | [`ApiError::Build`] |
//! | [`execute`](Lifecycle::execute) | the transport request, the decode target | a response | [`ApiError::Transport`], [`ApiError::Status`], [`ApiError::Decode`] |
//! | [`cleanup`](Lifecycle::cleanup) | the response | nothing | [`ApiError::Cleanup`] |
//!
//! Anything acquired by `build` must travel inside the transport request and
//! then the response, so that it is released either by `cleanup` or by being
//! dropped when a later phase fails.

use async_trait::async_trait;

use crate::{ApiError, DecodeTarget, Endpoint, RequestSchema};

/// Transport-agnostic view of a completed call.
///
/// A response must stay inspectable after [`Lifecycle::cleanup`] has run:
/// cleanup releases transport resources, not data already read.
pub trait ApiResponse: Send + Sync {
    /// Status code of the call, using HTTP semantics (`200`, `404`, ...).
    fn status(&self) -> u16;

    /// Raw response body.
    fn body(&self) -> &[u8];

    /// Returns `true` for a `2xx` status.
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

/// A transport strategy, driven by [`crate::Client`] through three phases.
///
/// Implementations are shared between concurrent calls; any mutable state
/// (connection pools, sockets) must be synchronised internally.
#[async_trait]
pub trait Lifecycle: Send + Sync + 'static {
    /// Transport-specific request produced by [`Lifecycle::build`].
    type Request: Send;

    /// Transport-specific response produced by [`Lifecycle::execute`].
    type Response: ApiResponse;

    /// Translates `schema` into a transport request addressed relative to
    /// `base`, the endpoint of the calling [`crate::Client`].
    ///
    /// Fails with [`ApiError::Build`] when the schema cannot be expressed in
    /// the transport's addressing or encoding scheme.
    async fn build(
        &self,
        base: &Endpoint,
        schema: &RequestSchema,
    ) -> Result<Self::Request, ApiError>;

    /// Performs the round trip and, when `into` is present, decodes the
    /// response body into it.
    async fn execute(
        &self,
        request: Self::Request,
        into: Option<&dyn DecodeTarget>,
    ) -> Result<Self::Response, ApiError>;

    /// Releases the resources held by `response`.
    async fn cleanup(&self, response: &Self::Response) -> Result<(), ApiError>;
}
