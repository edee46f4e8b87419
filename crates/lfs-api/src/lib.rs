//! Core of the large-file locking API client.
//!
//! This crate contains every payload type, the request descriptor, the schema
//! validator, and the transport port ([`Lifecycle`]) used to talk to a remote
//! lock authority. Transport crates implement [`Lifecycle`]; they never add
//! protocol rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. It
//! defines *what* a request looks like and *in which order* a transport is
//! driven; transport crates define *how* bytes move.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`LockId`, `CommitSha`, `RequestId`) |
//! | [`types`] | Shared value types (`Timestamp`, `Committer`, `Endpoint`, `Method`) |
//! | [`locks`] | Lock payloads and their decoded outcomes |
//! | [`schema`] | The [`Validate`] trait and [`SchemaViolation`] |
//! | [`request`] | [`RequestSchema`] and the decode-target slot |
//! | [`lifecycle`] | The [`Lifecycle`] and [`ApiResponse`] transport traits |
//! | [`client`] | [`Client`], which drives a lifecycle through one call |
//! | [`services`] | Pure request constructors ([`LockService`]) |
//! | [`errors`] | Error taxonomy and retry classification |
//!
//! ## Usage
//!
//! ```ignore
//! let (slot, schema) = LockService.lock(request);
//! client.call(schema).await?;
//! match slot.take().map(LockResponse::outcome).transpose()? {
//!     Some(LockOutcome::Granted(lock)) => println!("locked {}", lock.path),
//!     other => println!("{other:?}"),
//! }
//! ```

pub mod client;
pub mod errors;
pub mod identifiers;
pub mod lifecycle;
pub mod locks;
pub mod request;
pub mod schema;
pub mod services;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::Client;
pub use errors::{ApiError, RetryPolicy};
pub use identifiers::{CommitSha, LockId, RequestId};
pub use lifecycle::{ApiResponse, Lifecycle};
pub use locks::{
    ListLocksRequest, Lock, LockList, LockOutcome, LockRequest, LockResponse, LockState,
    ReleasedLock, UnlockOutcome, UnlockRequest, UnlockResponse,
};
pub use request::{DecodeTarget, RequestBody, RequestSchema, ResponseSlot};
pub use schema::{SchemaViolation, Validate};
pub use services::LockService;
pub use types::{Committer, Endpoint, Method, Timestamp};
