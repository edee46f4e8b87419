use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{Hook, SetupError};

/// What happened to one hook during install or uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Written where no hook existed.
    Installed(PathBuf),
    /// An earlier managed version (or, with `force`, a foreign hook) was replaced.
    Upgraded(PathBuf),
    /// Already up to date.
    Unchanged(PathBuf),
    /// Removed by uninstall.
    Removed(PathBuf),
    /// Left in place by uninstall because this client did not write it.
    Skipped(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SetupError + '_ {
    move |source| SetupError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_existing(path: &Path) -> Result<Option<String>, SetupError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path)(err)),
    }
}

fn write_hook(path: &Path, contents: &str) -> Result<(), SetupError> {
    fs::write(path, contents).map_err(io_error(path))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_error(path))?;
    }
    Ok(())
}

fn install(hooks_dir: &Path, hook: &Hook, force: bool) -> Result<HookAction, SetupError> {
    let path = hooks_dir.join(hook.kind.file_name());

    let action = match read_existing(&path)? {
        None => {
            write_hook(&path, &hook.contents)?;
            HookAction::Installed(path)
        }
        Some(existing) if existing.trim() == hook.contents.trim() => HookAction::Unchanged(path),
        Some(existing) if force || hook.is_managed(&existing) => {
            write_hook(&path, &hook.contents)?;
            HookAction::Upgraded(path)
        }
        Some(_) => return Err(SetupError::HookConflict { path }),
    };

    info!(hook = %hook.kind, ?action, "Hook installed");
    Ok(action)
}

/// Installs every hook in `hooks` into `hooks_dir`, creating the directory if
/// needed and stopping at the first failure.
///
/// A hook that was written by this client (any version) is brought up to
/// date. A foreign hook is an error unless `force` is set.
pub fn install_hooks(
    hooks_dir: &Path,
    hooks: &[Hook],
    force: bool,
) -> Result<Vec<HookAction>, SetupError> {
    fs::create_dir_all(hooks_dir).map_err(io_error(hooks_dir))?;
    hooks
        .iter()
        .map(|hook| install(hooks_dir, hook, force))
        .collect()
}

/// Removes every hook in `hooks` from `hooks_dir` that this client wrote.
///
/// Foreign hooks are left in place and reported as [`HookAction::Skipped`].
pub fn uninstall_hooks(hooks_dir: &Path, hooks: &[Hook]) -> Result<Vec<HookAction>, SetupError> {
    let mut actions = Vec::new();
    for hook in hooks {
        let path = hooks_dir.join(hook.kind.file_name());
        match read_existing(&path)? {
            None => {}
            Some(existing) if hook.is_managed(&existing) => {
                fs::remove_file(&path).map_err(io_error(&path))?;
                info!(hook = %hook.kind, "Hook removed");
                actions.push(HookAction::Removed(path));
            }
            Some(_) => {
                warn!(hook = %hook.kind, path = %path.display(), "Leaving hook not written by git-lfs");
                actions.push(HookAction::Skipped(path));
            }
        }
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SetupConfig;

    fn pre_push() -> Hook {
        SetupConfig::standard().hooks.remove(0)
    }

    #[test]
    fn installs_into_a_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let hooks_dir = dir.path().join("hooks");
        let hook = pre_push();

        let actions = install_hooks(&hooks_dir, std::slice::from_ref(&hook), false).unwrap();

        let path = hooks_dir.join("pre-push");
        assert_eq!(actions, vec![HookAction::Installed(path.clone())]);
        assert_eq!(fs::read_to_string(&path).unwrap(), hook.contents);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn reinstall_leaves_the_hook_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = [pre_push()];
        install_hooks(dir.path(), &hooks, false).unwrap();

        let actions = install_hooks(dir.path(), &hooks, false).unwrap();

        assert!(matches!(actions.as_slice(), [HookAction::Unchanged(_)]));
    }

    #[test]
    fn upgrades_hooks_written_by_earlier_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pre-push");
        fs::write(&path, "#!/bin/sh\ngit lfs push --stdin \"$@\"\n").unwrap();
        let hook = pre_push();

        let actions = install_hooks(dir.path(), std::slice::from_ref(&hook), false).unwrap();

        assert_eq!(actions, vec![HookAction::Upgraded(path.clone())]);
        assert_eq!(fs::read_to_string(&path).unwrap(), hook.contents);
    }

    #[test]
    fn refuses_to_overwrite_foreign_hooks_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pre-push");
        fs::write(&path, "#!/bin/sh\nmake lint\n").unwrap();
        let hooks = [pre_push()];

        let err = install_hooks(dir.path(), &hooks, false).unwrap_err();
        assert!(matches!(err, SetupError::HookConflict { path: ref p } if *p == path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\nmake lint\n");

        let actions = install_hooks(dir.path(), &hooks, true).unwrap();
        assert_eq!(actions, vec![HookAction::Upgraded(path)]);
    }

    #[test]
    fn uninstall_removes_managed_hooks_and_keeps_foreign_ones() {
        let dir = tempfile::tempdir().unwrap();
        let hooks = [pre_push()];
        install_hooks(dir.path(), &hooks, false).unwrap();

        let removed = uninstall_hooks(dir.path(), &hooks).unwrap();
        assert!(matches!(removed.as_slice(), [HookAction::Removed(_)]));
        assert!(!dir.path().join("pre-push").exists());

        fs::write(dir.path().join("pre-push"), "#!/bin/sh\nmake lint\n").unwrap();
        let skipped = uninstall_hooks(dir.path(), &hooks).unwrap();
        assert!(matches!(skipped.as_slice(), [HookAction::Skipped(_)]));
        assert!(dir.path().join("pre-push").exists());
    }

    #[test]
    fn uninstall_without_hooks_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(uninstall_hooks(dir.path(), &[pre_push()]).unwrap().is_empty());
    }
}
