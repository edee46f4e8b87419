//! Tuning knobs for [`crate::HttpLifecycle`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings applied to every call made through one [`crate::HttpLifecycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Limit on one whole round trip, from connect to the last body byte.
    pub timeout: Duration,
    /// Limit on establishing a connection.
    pub connect_timeout: Duration,
    /// Maximum number of calls holding a connection at once. Must be positive.
    pub max_in_flight: usize,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_in_flight: 8,
            user_agent: concat!("git-lfs-locks/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
