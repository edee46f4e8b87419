//! Transport-agnostic request descriptors and decode targets.
//!
//! A [`RequestSchema`] is built once by a service method, consumed once by
//! [`crate::Client::call`], and never changed in between. The only thing a
//! transport writes to is the schema's decode target: a [`ResponseSlot`] whose
//! other handle was returned to the caller together with the schema.

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ApiError, LockRequest, Method};

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// The payload of an outgoing request.
///
/// Serialised without a tag: each variant encodes exactly as its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Body of a lock request.
    Lock(LockRequest),
    /// Body of an unlock request. The lock id travels in the path.
    Unlock {
        /// Release a lock owned by someone else.
        force: bool,
    },
}

impl RequestBody {
    /// Encodes the body as JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ---------------------------------------------------------------------------
// Decode target
// ---------------------------------------------------------------------------

/// Somewhere a response body can be decoded into.
///
/// Implemented by the shared half of a [`ResponseSlot`]. Transports call
/// [`DecodeTarget::decode`] from [`crate::Lifecycle::execute`].
pub trait DecodeTarget: Send + Sync {
    /// Deserialises `body` and stores the result, replacing any previous value.
    ///
    /// On failure the target is left empty.
    fn decode(&self, body: &[u8]) -> Result<(), ApiError>;

    /// Drops any stored value.
    fn discard(&self);

    /// Name of the decoded type, for diagnostics.
    fn target_name(&self) -> &'static str;
}

struct SlotCell<T> {
    value: Mutex<Option<T>>,
}

impl<T> SlotCell<T> {
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // The guarded value is a plain Option; a panic while holding the lock
        // cannot leave it half-written.
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> DecodeTarget for SlotCell<T>
where
    T: DeserializeOwned + Send,
{
    fn decode(&self, body: &[u8]) -> Result<(), ApiError> {
        let mut slot = self.lock();
        *slot = None;
        let value = serde_json::from_slice::<T>(body).map_err(|err| ApiError::Decode {
            target: self.target_name(),
            message: err.to_string(),
        })?;
        *slot = Some(value);
        Ok(())
    }

    fn discard(&self) {
        self.lock().take();
    }

    fn target_name(&self) -> &'static str {
        short_type_name::<T>()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// The caller's handle to a decode target.
///
/// Cloning a slot yields another handle to the same storage. After a
/// successful [`crate::Client::call`] the slot holds the decoded response;
/// after a failed one it is empty.
pub struct ResponseSlot<T> {
    cell: Arc<SlotCell<T>>,
}

impl<T> ResponseSlot<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(SlotCell {
                value: Mutex::new(None),
            }),
        }
    }

    /// Returns the decode target to attach to a [`RequestSchema`].
    pub fn target(&self) -> Arc<dyn DecodeTarget> {
        self.cell.clone()
    }

    /// Returns `true` if `schema` decodes into this slot.
    pub fn is_target_of(&self, schema: &RequestSchema) -> bool {
        schema
            .decode_target()
            .is_some_and(|target| {
                std::ptr::addr_eq(Arc::as_ptr(&self.cell), std::ptr::from_ref(target))
            })
    }
}

impl<T> ResponseSlot<T> {
    /// Returns `true` once a value has been decoded into the slot.
    pub fn is_filled(&self) -> bool {
        self.cell.lock().is_some()
    }

    /// Removes and returns the decoded value.
    pub fn take(&self) -> Option<T> {
        self.cell.lock().take()
    }

    /// Returns a copy of the decoded value.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.cell.lock().clone()
    }
}

impl<T> Clone for ResponseSlot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Default for ResponseSlot<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ResponseSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSlot")
            .field("target", &short_type_name::<T>())
            .field("filled", &self.is_filled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Request descriptor
// ---------------------------------------------------------------------------

/// Immutable description of one protocol operation.
///
/// Construct with [`RequestSchema::new`] and the `with_*` builders; the
/// builders consume the schema, so once it is handed to a client nothing can
/// alter it.
#[derive(Clone)]
pub struct RequestSchema {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    body: Option<RequestBody>,
    target: Option<Arc<dyn DecodeTarget>>,
}

impl RequestSchema {
    /// Starts a descriptor for `method` on `path` (relative to the client's
    /// base endpoint, starting with `/`). `path` is already percent-encoded:
    /// `/` separates segments and `%XX` stands for an escaped byte.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            target: None,
        }
    }

    /// Adds query parameters. Later keys overwrite earlier ones.
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Decodes the response body into `slot`.
    pub fn decoding_into<T>(mut self, slot: &ResponseSlot<T>) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.target = Some(slot.target());
        self
    }

    /// Returns the method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the path relative to the base endpoint.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters, sorted by key. Empty means no query.
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Returns the body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns the decode target, if any.
    pub fn decode_target(&self) -> Option<&dyn DecodeTarget> {
        self.target.as_deref()
    }
}

impl fmt::Debug for RequestSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSchema")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("into", &self.target.as_ref().map(|t| t.target_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Echo {
        value: u32,
    }

    #[test]
    fn decode_fills_every_handle_of_the_slot() {
        let slot = ResponseSlot::<Echo>::new();
        let other = slot.clone();
        slot.target().decode(br#"{"value": 7}"#).unwrap();

        assert!(other.is_filled());
        assert_eq!(other.get(), Some(Echo { value: 7 }));
        assert_eq!(slot.take(), Some(Echo { value: 7 }));
        assert!(!other.is_filled());
    }

    #[test]
    fn failed_decode_leaves_the_slot_empty() {
        let slot = ResponseSlot::<Echo>::new();
        let target = slot.target();
        target.decode(br#"{"value": 1}"#).unwrap();

        let err = target.decode(br#"{"value": "one"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode { target: "Echo", .. }));
        assert!(!slot.is_filled());
    }

    #[test]
    fn discard_empties_the_slot() {
        let slot = ResponseSlot::<Echo>::new();
        slot.target().decode(br#"{"value": 2}"#).unwrap();
        slot.target().discard();
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn schema_knows_which_slot_it_decodes_into() {
        let slot = ResponseSlot::<Echo>::new();
        let unrelated = ResponseSlot::<Echo>::new();
        let schema = RequestSchema::new(Method::Get, "/echo").decoding_into(&slot);

        assert!(slot.is_target_of(&schema));
        assert!(slot.clone().is_target_of(&schema));
        assert!(!unrelated.is_target_of(&schema));
        assert!(!slot.is_target_of(&RequestSchema::new(Method::Get, "/echo")));
    }

    #[test]
    fn unlock_body_encodes_only_force() {
        let json = RequestBody::Unlock { force: true }.to_json().unwrap();
        assert_eq!(json, br#"{"force":true}"#);
    }

    #[test]
    fn query_keys_are_deduplicated_and_sorted() {
        let schema = RequestSchema::new(Method::Get, "/locks")
            .with_query([("path", "/b"), ("cursor", "c1")])
            .with_query([("path", "/a")]);
        let pairs: Vec<_> = schema.query().iter().collect();
        assert_eq!(
            pairs,
            vec![
                (&"cursor".to_string(), &"c1".to_string()),
                (&"path".to_string(), &"/a".to_string())
            ]
        );
    }
}
