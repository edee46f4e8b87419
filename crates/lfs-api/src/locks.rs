//! Lock payloads exchanged with the remote lock authority.
//!
//! The wire encodes results as structs of optional fields ([`LockResponse`],
//! [`UnlockResponse`]). Calling code should not inspect those fields directly;
//! [`LockResponse::outcome`] and [`UnlockResponse::outcome`] validate the
//! payload and turn it into exactly one variant of a sum type.
//!
//! The authority alone decides whether a lock is granted. A path goes from
//! unlocked to [`LockState::Held`] when a [`LockRequest`] is granted, and back
//! to unlocked when the lock is released; the released record is terminal and a
//! later lock on the same path produces a new record with a new [`LockId`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{SchemaViolation, Validate};
use crate::{CommitSha, Committer, LockId, Timestamp};

// ---------------------------------------------------------------------------
// Lock record
// ---------------------------------------------------------------------------

/// A server-held exclusive claim on a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Identifier assigned by the authority.
    pub id: LockId,
    /// Repository-relative path the lock covers.
    pub path: String,
    /// Owner of the lock.
    pub committer: Committer,
    /// When the authority granted the lock.
    pub locked_at: Timestamp,
    /// When the lock was released. `None` while the lock is held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<Timestamp>,
}

/// Whether a [`Lock`] record is still in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// No `unlocked_at`: the owner still holds the path.
    Held,
    /// `unlocked_at` is set. Terminal for this record.
    Released,
}

impl Lock {
    /// Returns the state of this record.
    pub fn state(&self) -> LockState {
        match self.unlocked_at {
            None => LockState::Held,
            Some(_) => LockState::Released,
        }
    }

    /// Returns `true` while the lock is in force.
    pub fn is_held(&self) -> bool {
        self.state() == LockState::Held
    }

    /// Returns the release time, if the lock has been released.
    pub fn released_at(&self) -> Option<Timestamp> {
        self.unlocked_at
    }
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

/// A claim on `path` based on the client's view of the remote history.
///
/// `latest_remote_commit` is the newest remote commit the client has seen.
/// If the authority requires a newer one, it answers with `commit_needed`
/// instead of granting the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    /// Repository-relative path to lock.
    pub path: String,
    /// Newest remote commit observed by the client.
    pub latest_remote_commit: CommitSha,
    /// Who the lock is for.
    pub committer: Committer,
}

/// Wire form of the answer to a [`LockRequest`].
///
/// Exactly one field is expected to be present; see [`LockResponse::outcome`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockResponse {
    /// The granted lock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<Lock>,
    /// Commit the client must incorporate before asking again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_needed: Option<CommitSha>,
    /// Why the lock was denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Decoded result of a lock attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LockOutcome {
    /// The authority granted the lock.
    Granted(Lock),
    /// The authority refused, typically because another committer holds the path.
    Denied {
        /// Server-supplied reason.
        reason: String,
    },
    /// The client's history is behind; fetch `commit` and retry.
    StaleHistory {
        /// The commit the authority requires.
        commit: CommitSha,
    },
}

impl LockResponse {
    /// Validates the payload and converts it into a [`LockOutcome`].
    ///
    /// Fails if no field, or more than one field, is present.
    pub fn outcome(self) -> Result<LockOutcome, SchemaViolation> {
        self.validate()?;
        match (self.lock, self.err, self.commit_needed) {
            (Some(lock), None, None) => Ok(LockOutcome::Granted(lock)),
            (None, Some(reason), None) => Ok(LockOutcome::Denied { reason }),
            (None, None, Some(commit)) => Ok(LockOutcome::StaleHistory { commit }),
            // validate() has already rejected every other combination.
            _ => Err(SchemaViolation::NoneOf {
                payload: "LockResponse",
                fields: &["lock", "err", "commit_needed"],
            }),
        }
    }
}

impl From<LockOutcome> for LockResponse {
    fn from(outcome: LockOutcome) -> Self {
        match outcome {
            LockOutcome::Granted(lock) => Self {
                lock: Some(lock),
                ..Self::default()
            },
            LockOutcome::Denied { reason } => Self {
                err: Some(reason),
                ..Self::default()
            },
            LockOutcome::StaleHistory { commit } => Self {
                commit_needed: Some(commit),
                ..Self::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Unlock
// ---------------------------------------------------------------------------

/// Request to release the lock identified by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRequest {
    /// The lock to release.
    pub id: LockId,
    /// Release the lock even if it is owned by another committer.
    #[serde(default)]
    pub force: bool,
}

/// The lock record carried by an [`UnlockResponse`].
///
/// Only `id` is guaranteed. Authorities may omit the other fields or send them
/// zero-valued (empty strings, `0001-01-01T00:00:00Z`); either way they decode
/// to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasedLock {
    /// Identifier of the released lock.
    pub id: LockId,
    /// Path the lock covered.
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,
    /// Owner of the lock.
    #[serde(
        default,
        deserialize_with = "non_empty_committer",
        skip_serializing_if = "Option::is_none"
    )]
    pub committer: Option<Committer>,
    /// When the lock was granted.
    #[serde(
        default,
        deserialize_with = "set_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub locked_at: Option<Timestamp>,
    /// When the lock was released.
    #[serde(
        default,
        deserialize_with = "set_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub unlocked_at: Option<Timestamp>,
}

impl From<Lock> for ReleasedLock {
    fn from(lock: Lock) -> Self {
        Self {
            id: lock.id,
            path: Some(lock.path),
            committer: Some(lock.committer),
            locked_at: Some(lock.locked_at),
            unlocked_at: lock.unlocked_at,
        }
    }
}

fn non_empty_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.is_empty()))
}

fn non_empty_committer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Committer>, D::Error> {
    let committer = Option::<Committer>::deserialize(d)?;
    Ok(committer.filter(|c| !(c.name.is_empty() && c.email.is_empty())))
}

fn set_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    Ok(Option::<Timestamp>::deserialize(d)?.filter(|ts| !ts.is_unset()))
}

/// Wire form of the answer to an [`UnlockRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockResponse {
    /// The released lock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<ReleasedLock>,
    /// Why the lock could not be released.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Decoded result of an unlock attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnlockOutcome {
    /// The lock was released.
    Released(ReleasedLock),
    /// The authority refused to release the lock.
    Denied {
        /// Server-supplied reason.
        reason: String,
    },
}

impl UnlockResponse {
    /// Validates the payload and converts it into an [`UnlockOutcome`].
    pub fn outcome(self) -> Result<UnlockOutcome, SchemaViolation> {
        self.validate()?;
        match (self.lock, self.err) {
            (Some(lock), None) => Ok(UnlockOutcome::Released(lock)),
            (None, Some(reason)) => Ok(UnlockOutcome::Denied { reason }),
            _ => Err(SchemaViolation::NoneOf {
                payload: "UnlockResponse",
                fields: &["lock", "err"],
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Filters for listing locks. Absent filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLocksRequest {
    /// Only return the lock on this path.
    pub path: Option<String>,
    /// Only return the lock with this id.
    pub id: Option<LockId>,
    /// Resume from a cursor returned by a previous page.
    pub cursor: Option<String>,
    /// Maximum number of locks per page. Must be positive.
    pub limit: Option<u32>,
}

impl ListLocksRequest {
    /// Returns the present filters as query parameters, in a stable order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(path) = &self.path {
            pairs.push(("path".to_string(), path.clone()));
        }
        if let Some(id) = &self.id {
            pairs.push(("id".to_string(), id.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor".to_string(), cursor.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// One page of locks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockList {
    /// Locks on this page.
    #[serde(default)]
    pub locks: Vec<Lock>,
    /// Cursor for the next page; `None` on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
