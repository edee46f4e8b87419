//! Structural rules for every payload exchanged with the lock authority.
//!
//! Serde enforces the shape of a payload (types and non-optional fields). The
//! rules here cover what serde cannot express:
//!
//! - required string fields must be non-empty;
//! - result fields are mutually exclusive, and a result payload must carry
//!   exactly one of them;
//! - a released lock cannot have been released before it was taken.
//!
//! Rules are applied symmetrically: callers validate outgoing requests before
//! handing them to [`crate::Client::call`], and incoming responses are
//! validated by [`crate::LockResponse::outcome`] and
//! [`crate::UnlockResponse::outcome`] before calling code sees them.

use thiserror::Error;

use crate::{
    Committer, ListLocksRequest, Lock, LockId, LockList, LockRequest, LockResponse,
    ReleasedLock, Timestamp, UnlockRequest, UnlockResponse,
};

/// A payload that broke a structural rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// A required field is absent or empty.
    #[error("{payload}: required field '{field}' is missing or empty")]
    MissingField {
        /// Payload type name.
        payload: &'static str,
        /// Offending field.
        field: &'static str,
    },

    /// Two fields that must never appear together are both present.
    #[error("{payload}: {first} and {second} both present")]
    MutuallyExclusive {
        /// Payload type name.
        payload: &'static str,
        /// First offending field.
        first: &'static str,
        /// Second offending field.
        second: &'static str,
    },

    /// None of the fields of which exactly one is required is present.
    #[error("{payload}: none of {} present", .fields.join(", "))]
    NoneOf {
        /// Payload type name.
        payload: &'static str,
        /// The candidate fields.
        fields: &'static [&'static str],
    },

    /// A lock's release time precedes its lock time.
    #[error("Lock '{id}': unlocked_at precedes locked_at")]
    ReleasedBeforeLocked {
        /// Id of the offending lock.
        id: String,
    },

    /// A field holds a value outside its permitted range.
    #[error("{payload}: field '{field}' {reason}")]
    InvalidValue {
        /// Payload type name.
        payload: &'static str,
        /// Offending field.
        field: &'static str,
        /// What is wrong with the value.
        reason: &'static str,
    },
}

/// Implemented by every payload type.
pub trait Validate {
    /// Checks field presence and cross-field rules.
    fn validate(&self) -> Result<(), SchemaViolation>;
}

fn require(payload: &'static str, field: &'static str, value: &str) -> Result<(), SchemaViolation> {
    if value.trim().is_empty() {
        return Err(SchemaViolation::MissingField { payload, field });
    }
    Ok(())
}

/// Fails if more than one of `fields` is present, naming the first clashing
/// pair; or, when `required`, if none is.
fn exclusive(
    payload: &'static str,
    fields: &'static [&'static str],
    present: &[bool],
    required: bool,
) -> Result<(), SchemaViolation> {
    let mut set = fields.iter().zip(present).filter(|(_, p)| **p).map(|(f, _)| *f);
    match (set.next(), set.next()) {
        (Some(first), Some(second)) => Err(SchemaViolation::MutuallyExclusive {
            payload,
            first,
            second,
        }),
        (None, _) if required => Err(SchemaViolation::NoneOf { payload, fields }),
        _ => Ok(()),
    }
}

impl Validate for Committer {
    fn validate(&self) -> Result<(), SchemaViolation> {
        require("Committer", "name", &self.name)?;
        require("Committer", "email", &self.email)
    }
}

fn released_in_order(
    id: &LockId,
    locked_at: Option<Timestamp>,
    unlocked_at: Option<Timestamp>,
) -> Result<(), SchemaViolation> {
    match (locked_at, unlocked_at) {
        (Some(locked_at), Some(unlocked_at)) if unlocked_at < locked_at => {
            Err(SchemaViolation::ReleasedBeforeLocked { id: id.to_string() })
        }
        _ => Ok(()),
    }
}

impl Validate for Lock {
    fn validate(&self) -> Result<(), SchemaViolation> {
        require("Lock", "id", self.id.as_str())?;
        require("Lock", "path", &self.path)?;
        self.committer.validate()?;
        released_in_order(&self.id, Some(self.locked_at), self.unlocked_at)
    }
}

impl Validate for ReleasedLock {
    fn validate(&self) -> Result<(), SchemaViolation> {
        require("ReleasedLock", "id", self.id.as_str())?;
        if let Some(committer) = &self.committer {
            committer.validate()?;
        }
        released_in_order(&self.id, self.locked_at, self.unlocked_at)
    }
}

impl Validate for LockRequest {
    fn validate(&self) -> Result<(), SchemaViolation> {
        require("LockRequest", "path", &self.path)?;
        require(
            "LockRequest",
            "latest_remote_commit",
            self.latest_remote_commit.as_str(),
        )?;
        self.committer.validate()
    }
}

impl Validate for LockResponse {
    fn validate(&self) -> Result<(), SchemaViolation> {
        // err/commit_needed is the pair callers most often get wrong, so it is
        // checked (and reported) first.
        exclusive(
            "LockResponse",
            &["err", "commit_needed", "lock"],
            &[
                self.err.is_some(),
                self.commit_needed.is_some(),
                self.lock.is_some(),
            ],
            true,
        )?;
        if let Some(err) = &self.err {
            require("LockResponse", "err", err)?;
        }
        if let Some(commit) = &self.commit_needed {
            require("LockResponse", "commit_needed", commit.as_str())?;
        }
        self.lock.as_ref().map_or(Ok(()), Validate::validate)
    }
}

impl Validate for UnlockRequest {
    fn validate(&self) -> Result<(), SchemaViolation> {
        require("UnlockRequest", "id", self.id.as_str())
    }
}

impl Validate for UnlockResponse {
    fn validate(&self) -> Result<(), SchemaViolation> {
        exclusive(
            "UnlockResponse",
            &["lock", "err"],
            &[self.lock.is_some(), self.err.is_some()],
            true,
        )?;
        if let Some(err) = &self.err {
            require("UnlockResponse", "err", err)?;
        }
        self.lock.as_ref().map_or(Ok(()), Validate::validate)
    }
}

impl Validate for ListLocksRequest {
    fn validate(&self) -> Result<(), SchemaViolation> {
        if self.limit == Some(0) {
            return Err(SchemaViolation::InvalidValue {
                payload: "ListLocksRequest",
                field: "limit",
                reason: "must be positive",
            });
        }
        if let Some(path) = &self.path {
            require("ListLocksRequest", "path", path)?;
        }
        Ok(())
    }
}

impl Validate for LockList {
    fn validate(&self) -> Result<(), SchemaViolation> {
        self.locks.iter().try_for_each(Validate::validate)
    }
}
