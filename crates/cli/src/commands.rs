//! Subcommand implementations.
//!
//! Every protocol command validates its request before sending it, performs
//! exactly one call, validates the decoded response, and prints the outcome
//! as JSON on stdout. A denial is a successful call with a non-zero exit code.

use std::process::ExitCode;

use anyhow::{bail, Context};
use http_lifecycle::HttpLifecycle;
use lfs_api::{
    Client, CommitSha, Committer, ListLocksRequest, LockId, LockOutcome, LockRequest, LockService,
    UnlockOutcome, UnlockRequest, Validate,
};
use serde::Serialize;
use setup::{
    install_hooks, setup_filters, teardown_filters, uninstall_hooks, GitCommand, HookAction,
    SetupConfig,
};
use tracing::info;

use crate::config::{Cli, Command, GlobalArgs};

/// Exit code for a call the server answered with a denial.
const EXIT_DENIED: u8 = 2;

fn connect(global: &GlobalArgs) -> anyhow::Result<Client<HttpLifecycle>> {
    let Some(endpoint) = global.endpoint.as_deref() else {
        bail!("no endpoint configured; pass --endpoint or set LFS_API_URL");
    };
    Ok(http_lifecycle::client(endpoint, &global.http_config())?)
}

fn list_request(
    path: Option<String>,
    id: Option<String>,
    cursor: Option<String>,
    limit: Option<u32>,
) -> anyhow::Result<ListLocksRequest> {
    let id = id
        .map(|id| LockId::new(id).context("--id must not be empty"))
        .transpose()?;
    let request = ListLocksRequest {
        path,
        id,
        cursor,
        limit,
    };
    request.validate()?;
    Ok(request)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn report(actions: &[HookAction]) {
    for action in actions {
        match action {
            HookAction::Installed(path) => println!("Installed {}", path.display()),
            HookAction::Upgraded(path) => println!("Updated {}", path.display()),
            HookAction::Unchanged(path) => println!("Up to date: {}", path.display()),
            HookAction::Removed(path) => println!("Removed {}", path.display()),
            HookAction::Skipped(path) => println!("Left in place: {}", path.display()),
        }
    }
}

/// Runs the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let Cli { global, command } = cli;
    match command {
        Command::Lock {
            path,
            commit,
            name,
            email,
        } => {
            let request = LockRequest {
                path,
                latest_remote_commit: CommitSha::new(commit).context("--commit must not be empty")?,
                committer: Committer::new(name, email),
            };
            request.validate()?;

            let client = connect(&global)?;
            let (slot, schema) = LockService.lock(request);
            client.call(schema).await.context("lock request failed")?;
            let outcome = slot.take().context("lock response was empty")?.outcome()?;

            print_json(&outcome)?;
            Ok(match outcome {
                LockOutcome::Granted(lock) => {
                    info!(id = %lock.id, path = %lock.path, "Lock granted");
                    ExitCode::SUCCESS
                }
                LockOutcome::Denied { .. } | LockOutcome::StaleHistory { .. } => {
                    ExitCode::from(EXIT_DENIED)
                }
            })
        }

        Command::Unlock { id, force } => {
            let request = UnlockRequest {
                id: LockId::new(id).context("lock id must not be empty")?,
                force,
            };
            request.validate()?;

            let client = connect(&global)?;
            let (slot, schema) = LockService.unlock(request);
            client.call(schema).await.context("unlock request failed")?;
            let outcome = slot.take().context("unlock response was empty")?.outcome()?;

            print_json(&outcome)?;
            Ok(match outcome {
                UnlockOutcome::Released(_) => ExitCode::SUCCESS,
                UnlockOutcome::Denied { .. } => ExitCode::from(EXIT_DENIED),
            })
        }

        Command::Locks {
            path,
            id,
            cursor,
            limit,
        } => {
            let request = list_request(path, id, cursor, limit)?;

            let client = connect(&global)?;
            let (slot, schema) = LockService.list(&request);
            client.call(schema).await.context("list request failed")?;
            let page = slot.take().context("list response was empty")?;
            page.validate()?;

            print_json(&page)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Install {
            force,
            hooks_dir,
            skip_hooks,
        } => {
            let managed = SetupConfig::standard();
            setup_filters(&managed.filters, &mut GitCommand::default(), force)?;
            if !skip_hooks {
                report(&install_hooks(&hooks_dir, &managed.hooks, force)?);
            }
            println!("Git LFS initialized.");
            Ok(ExitCode::SUCCESS)
        }

        Command::Uninstall { hooks_dir } => {
            let managed = SetupConfig::standard();
            report(&uninstall_hooks(&hooks_dir, &managed.hooks)?);
            teardown_filters(&mut GitCommand::default())?;
            println!("Git LFS uninstalled.");
            Ok(ExitCode::SUCCESS)
        }
    }
}
