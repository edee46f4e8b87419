use serde::{Deserialize, Serialize};

/// Git hook types the client installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    /// Runs before `git push` sends anything.
    PrePush,
}

impl HookKind {
    /// File name of the hook inside the hooks directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::PrePush => "pre-push",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A hook script managed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Which hook this is.
    pub kind: HookKind,
    /// Script to install.
    pub contents: String,
    /// Scripts written by earlier versions, which may be overwritten freely.
    #[serde(default)]
    pub upgradeables: Vec<String>,
}

impl Hook {
    /// Returns `true` if `existing` was written by this or an earlier version.
    pub fn is_managed(&self, existing: &str) -> bool {
        let existing = existing.trim();
        existing == self.contents.trim()
            || self
                .upgradeables
                .iter()
                .any(|old| existing == old.trim())
    }
}

/// A `filter.lfs.<name>` configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Key suffix, e.g. `clean`.
    pub name: String,
    /// Value to set.
    pub value: String,
}

impl Filter {
    /// Creates a filter entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Full configuration key, e.g. `filter.lfs.clean`.
    pub fn key(&self) -> String {
        format!("{}.{}", crate::FILTER_SECTION, self.name)
    }
}

/// The hooks and filters a setup run manages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Hooks to install in the repository.
    #[serde(default)]
    pub hooks: Vec<Hook>,
    /// Global filter entries.
    #[serde(default)]
    pub filters: Vec<Filter>,
}

const PRE_PUSH: &str = "#!/bin/sh\n\
command -v git-lfs >/dev/null 2>&1 || { echo >&2 \"\\nThis repository is configured for Git LFS but 'git-lfs' was not found on your path. If you no longer wish to use Git LFS, remove this hook by deleting .git/hooks/pre-push.\\n\"; exit 2; }\n\
git lfs pre-push \"$@\"\n";

const PRE_PUSH_UPGRADEABLES: [&str; 5] = [
    "#!/bin/sh\ngit lfs push --stdin $*",
    "#!/bin/sh\ngit lfs push --stdin \"$@\"",
    "#!/bin/sh\ngit lfs pre-push \"$@\"",
    "#!/bin/sh\ncommand -v git-lfs >/dev/null 2>&1 || { echo >&2 \"\\nThis repository has been set up with Git LFS but Git LFS is not installed.\\n\"; exit 0; }\ngit lfs pre-push \"$@\"",
    "#!/bin/sh\ncommand -v git-lfs >/dev/null 2>&1 || { echo >&2 \"\\nThis repository has been set up with Git LFS but Git LFS is not installed.\\n\"; exit 2; }\ngit lfs pre-push \"$@\"",
];

impl SetupConfig {
    /// The default managed set: the `pre-push` hook (with every earlier
    /// version of it marked upgradeable) and the `clean` and `required`
    /// filters.
    pub fn standard() -> Self {
        Self {
            hooks: vec![Hook {
                kind: HookKind::PrePush,
                contents: PRE_PUSH.to_string(),
                upgradeables: PRE_PUSH_UPGRADEABLES.iter().map(|s| s.to_string()).collect(),
            }],
            filters: vec![
                Filter::new("clean", "git lfs clean %f"),
                Filter::new("required", "true"),
            ],
        }
    }
}
