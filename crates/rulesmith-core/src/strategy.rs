//! Selection strategy names shared by configuration and the selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a target chooses its rules. Mutually exclusive per target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Rules whose source directory is under one of the include dirs.
    Directory,
    /// Rules whose effective globs match one of the context files.
    Glob,
    /// Rules carrying at least one of the include tags.
    Tag,
    /// Every rule, budgeted in priority order.
    Priority,
    /// Every rule.
    #[default]
    All,
}

impl Strategy {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Directory,
        Self::Glob,
        Self::Tag,
        Self::Priority,
        Self::All,
    ];

    /// Lowercase name as used in the config document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Glob => "glob",
            Self::Tag => "tag",
            Self::Priority => "priority",
            Self::All => "all",
        }
    }

    /// Whether rules are filtered before ordering.
    pub const fn filters(self) -> bool {
        matches!(self, Self::Directory | Self::Glob | Self::Tag)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}
