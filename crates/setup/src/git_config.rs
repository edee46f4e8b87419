use std::process::Command;

use tracing::debug;

use crate::SetupError;

/// Access to Git's global configuration.
///
/// [`GitCommand`] is the real implementation; tests substitute an in-memory
/// map.
pub trait GitConfig {
    /// Returns the value of `key`, or an empty string if it is unset.
    fn find(&self, key: &str) -> Result<String, SetupError>;

    /// Sets `key` to `value`.
    fn set_global(&mut self, key: &str, value: &str) -> Result<(), SetupError>;

    /// Removes `key`. Removing an unset key is not an error.
    fn unset_global(&mut self, key: &str) -> Result<(), SetupError>;

    /// Removes every key in `section`. Removing a missing section is not an
    /// error.
    fn unset_global_section(&mut self, section: &str) -> Result<(), SetupError>;
}

/// [`GitConfig`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: String,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

// `git config` exits 1 when asked about a key or section that is not there.
const EXIT_NOT_FOUND: i32 = 1;
const EXIT_NO_KEY: i32 = 5;
const EXIT_NO_SECTION: i32 = 128;

impl GitCommand {
    /// Uses the `git` executable at `program` instead of the one on `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `git config <args>`, returning stdout, or `None` when git exits
    /// with one of `tolerated` codes.
    fn run(&self, args: &[&str], tolerated: &[i32]) -> Result<Option<String>, SetupError> {
        debug!(program = %self.program, ?args, "Running git config");
        let output = Command::new(&self.program)
            .arg("config")
            .args(args)
            .output()
            .map_err(|err| SetupError::GitConfig {
                args: args.join(" "),
                message: err.to_string(),
            })?;

        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }
        match output.status.code() {
            Some(code) if tolerated.contains(&code) => Ok(None),
            _ => Err(SetupError::GitConfig {
                args: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

impl GitConfig for GitCommand {
    fn find(&self, key: &str) -> Result<String, SetupError> {
        let value = self.run(&["--get", key], &[EXIT_NOT_FOUND])?;
        Ok(value.map(|v| v.trim_end().to_string()).unwrap_or_default())
    }

    fn set_global(&mut self, key: &str, value: &str) -> Result<(), SetupError> {
        self.run(&["--global", key, value], &[]).map(|_| ())
    }

    fn unset_global(&mut self, key: &str) -> Result<(), SetupError> {
        self.run(&["--global", "--unset", key], &[EXIT_NOT_FOUND, EXIT_NO_KEY])
            .map(|_| ())
    }

    fn unset_global_section(&mut self, section: &str) -> Result<(), SetupError> {
        self.run(
            &["--global", "--remove-section", section],
            &[EXIT_NOT_FOUND, EXIT_NO_SECTION],
        )
        .map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::BTreeMap;

    use super::*;

    /// In-memory stand-in for global git configuration.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryConfig {
        pub(crate) values: BTreeMap<String, String>,
        pub(crate) writes: usize,
    }

    impl GitConfig for MemoryConfig {
        fn find(&self, key: &str) -> Result<String, SetupError> {
            Ok(self.values.get(key).cloned().unwrap_or_default())
        }

        fn set_global(&mut self, key: &str, value: &str) -> Result<(), SetupError> {
            self.writes += 1;
            self.values.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn unset_global(&mut self, key: &str) -> Result<(), SetupError> {
            self.values.remove(key);
            Ok(())
        }

        fn unset_global_section(&mut self, section: &str) -> Result<(), SetupError> {
            let prefix = format!("{section}.");
            self.values.retain(|key, _| !key.starts_with(&prefix));
            Ok(())
        }
    }
}
