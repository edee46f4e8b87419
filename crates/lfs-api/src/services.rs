//! Per-operation request constructors.
//!
//! Service methods perform no I/O. Each returns the caller's handle to the
//! response (an empty [`ResponseSlot`]) together with the [`RequestSchema`]
//! that will fill it, leaving the caller to decide when to pass the schema to
//! [`crate::Client::call`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    ListLocksRequest, LockList, LockRequest, LockResponse, Method, RequestBody, RequestSchema,
    ResponseSlot, UnlockRequest, UnlockResponse,
};

/// Bytes escaped when a value is placed in a single path segment: everything
/// except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Constructors for the locking endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockService;

impl LockService {
    /// `POST /locks` with the request as body.
    pub fn lock(&self, request: LockRequest) -> (ResponseSlot<LockResponse>, RequestSchema) {
        let slot = ResponseSlot::<LockResponse>::new();
        let schema = RequestSchema::new(Method::Post, "/locks")
            .with_body(RequestBody::Lock(request))
            .decoding_into(&slot);
        (slot, schema)
    }

    /// `POST /locks/{id}/unlock` with `{force}` as body.
    ///
    /// The id is opaque and is percent-encoded into exactly one segment.
    pub fn unlock(&self, request: UnlockRequest) -> (ResponseSlot<UnlockResponse>, RequestSchema) {
        let slot = ResponseSlot::<UnlockResponse>::new();
        let id = utf8_percent_encode(request.id.as_str(), PATH_SEGMENT);
        let schema = RequestSchema::new(Method::Post, format!("/locks/{id}/unlock"))
            .with_body(RequestBody::Unlock {
                force: request.force,
            })
            .decoding_into(&slot);
        (slot, schema)
    }

    /// `GET /locks`, with the present filters as query parameters.
    pub fn list(&self, request: &ListLocksRequest) -> (ResponseSlot<LockList>, RequestSchema) {
        let slot = ResponseSlot::<LockList>::new();
        let schema = RequestSchema::new(Method::Get, "/locks")
            .with_query(request.query_pairs())
            .decoding_into(&slot);
        (slot, schema)
    }
}
