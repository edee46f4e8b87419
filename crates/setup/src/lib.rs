//! Local Git environment setup for the locking client.
//!
//! Before any lock is requested, the repository needs a `pre-push` hook that
//! hands over to the client, and global `filter.lfs.*` configuration. This
//! crate installs and removes both.
//!
//! ## Managed entries
//!
//! Nothing here is process-wide state. The hooks and filters to manage are
//! listed in a [`SetupConfig`] built by the caller and passed to every
//! function, so install and uninstall always agree on what is managed.
//! [`SetupConfig::standard`] returns the default list.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Reads and writes `git config` and the hooks directory.
//! No locking protocol logic lives here.

mod config;
mod errors;
mod filters;
mod git_config;
mod hooks;

pub use config::{Filter, Hook, HookKind, SetupConfig};
pub use errors::SetupError;
pub use filters::{setup_filters, teardown_filters, FILTER_SECTION};
pub use git_config::{GitCommand, GitConfig};
pub use hooks::{install_hooks, uninstall_hooks, HookAction};
