use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while installing or removing hooks and filters.
#[derive(Debug, Error)]
pub enum SetupError {
    /// `git config` could not be run or exited unsuccessfully.
    #[error("git config {args} failed: {message}")]
    GitConfig {
        /// Arguments passed to `git config`.
        args: String,
        /// Captured stderr, or the spawn error.
        message: String,
    },

    /// A filter is already set to a value this client does not manage.
    ///
    /// Re-run with `force` to overwrite it.
    #[error("The {key} filter should be \"{expected}\" but is \"{actual}\"")]
    FilterMismatch {
        /// Full configuration key.
        key: String,
        /// Value this client would set.
        expected: String,
        /// Value currently configured.
        actual: String,
    },

    /// A hook exists that was not written by this client.
    ///
    /// Re-run with `force` to overwrite it.
    #[error("Hook already exists: {}", .path.display())]
    HookConflict {
        /// Path of the existing hook.
        path: PathBuf,
    },

    /// Reading or writing a hook failed.
    #[error("Cannot access {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
