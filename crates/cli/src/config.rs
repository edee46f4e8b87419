//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use http_lifecycle::HttpConfig;

/// Request, release and list file locks on a Git LFS server.
#[derive(Debug, Parser)]
#[command(name = "git-lfs-locks", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Base URL of the LFS API, e.g. https://git-server.com/repo.git/info/lfs
    #[arg(long, env = "LFS_API_URL", global = true)]
    pub endpoint: Option<String>,

    /// Limit on one request, in seconds.
    #[arg(long, env = "LFS_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Maximum number of requests holding a connection at once.
    #[arg(long, env = "LFS_MAX_IN_FLIGHT", default_value_t = 8, global = true)]
    pub max_in_flight: usize,

    /// Format of log output on stderr.
    #[arg(long, env = "LFS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

impl GlobalArgs {
    /// HTTP transport settings derived from the flags.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_in_flight: self.max_in_flight,
            ..HttpConfig::default()
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable single lines.
    Compact,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Claim an exclusive lock on a path.
    Lock {
        /// Repository-relative path to lock.
        path: String,
        /// Newest remote commit this clone has seen.
        #[arg(long)]
        commit: String,
        /// Committer name.
        #[arg(long, env = "GIT_AUTHOR_NAME")]
        name: String,
        /// Committer email.
        #[arg(long, env = "GIT_AUTHOR_EMAIL")]
        email: String,
    },

    /// Release a lock by id.
    Unlock {
        /// Id of the lock to release.
        id: String,
        /// Release the lock even if someone else owns it.
        #[arg(long)]
        force: bool,
    },

    /// List locks.
    Locks {
        /// Only the lock on this path.
        #[arg(long)]
        path: Option<String>,
        /// Only the lock with this id.
        #[arg(long)]
        id: Option<String>,
        /// Cursor returned by a previous page.
        #[arg(long)]
        cursor: Option<String>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Install the pre-push hook and the global filter configuration.
    Install {
        /// Overwrite hooks and filters not written by git-lfs.
        #[arg(long)]
        force: bool,
        /// Hooks directory of the repository.
        #[arg(long, default_value = ".git/hooks")]
        hooks_dir: PathBuf,
        /// Only configure filters.
        #[arg(long)]
        skip_hooks: bool,
    },

    /// Remove the hooks and filters installed by `install`.
    Uninstall {
        /// Hooks directory of the repository.
        #[arg(long, default_value = ".git/hooks")]
        hooks_dir: PathBuf,
    },
}
