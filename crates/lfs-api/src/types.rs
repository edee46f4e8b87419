//! Shared value types for the locking API.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry values
//! with invariants (a parseable base endpoint, an HTTP-style method) or group
//! several wire fields together ([`Committer`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ApiError;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serialised as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns `true` for `0001-01-01T00:00:00Z`, the instant some servers
    /// send in place of an absent time.
    pub fn is_unset(self) -> bool {
        self.0.timestamp() == UNSET_EPOCH_SECS
    }
}

/// `0001-01-01T00:00:00Z` in seconds since the Unix epoch.
const UNSET_EPOCH_SECS: i64 = -62_135_596_800;

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Committer
// ---------------------------------------------------------------------------

/// The person on whose behalf a lock is requested or held.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Committer {
    /// Display name, as in `user.name`.
    pub name: String,
    /// Email address, as in `user.email`.
    pub email: String,
}

impl Committer {
    /// Creates a new [`Committer`].
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Committer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// The root URL every request of a [`crate::Client`] is made against.
///
/// Parsed once at construction; a value of this type is always an absolute
/// URL that can carry a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Parses `root` into an [`Endpoint`].
    ///
    /// Fails with [`ApiError::Construction`] if `root` is not an absolute URL,
    /// or if it is one that cannot carry a path (e.g. `mailto:`).
    pub fn parse(root: &str) -> Result<Self, ApiError> {
        let url = Url::parse(root).map_err(|err| ApiError::Construction {
            endpoint: root.to_string(),
            message: err.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(ApiError::Construction {
                endpoint: root.to_string(),
                message: "endpoint cannot be used as a base URL".to_string(),
            });
        }

        Ok(Self(url))
    }

    /// Returns the parsed URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the endpoint as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Endpoint {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The verb of a request descriptor.
///
/// Named after HTTP methods because the wire protocol was designed over HTTP;
/// other transports map them onto their own operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read-only query.
    Get,
    /// Create or act on a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// Returns the canonical upper-case name (`"POST"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
