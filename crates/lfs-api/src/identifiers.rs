//! Newtype identifiers.
//!
//! Lock ids and commit SHAs are both plain strings on the wire. Keeping them as
//! distinct newtypes prevents passing a commit where a lock id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the identifier is empty.
            ///
            /// Only reachable for values decoded from the wire; [`Self::new`]
            /// never produces one. The schema validator rejects them.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies a lock record issued by the remote lock authority.
    ///
    /// Opaque to the client. A path that is locked, released and locked again
    /// gets a new id each time.
    LockId
}

string_id! {
    /// A Git commit SHA as reported by the remote.
    ///
    /// Used both as the client's claimed `latest_remote_commit` and as the
    /// server's `commit_needed` answer.
    CommitSha
}

/// Correlates all tracing output of a single [`crate::Client::call`].
///
/// Generated fresh for every call; never sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
