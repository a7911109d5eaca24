//! The build tool and runtime a fetch is aimed at

use semver::Version;
use serde::{Deserialize, Serialize};

/// Versions of the external build tool and the runtime executing it.
///
/// Passed to every [`ModelDefQuery`](crate::ModelDefQuery) so that an
/// extension can ask for different data depending on what the tool
/// supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildTarget {
    pub tool_version: Version,
    pub runtime_version: String,
}

impl BuildTarget {
    pub fn new(tool_version: Version, runtime_version: impl Into<String>) -> Self {
        Self {
            tool_version,
            runtime_version: runtime_version.into(),
        }
    }

    /// Whether the tool is at least `major.minor`.
    pub fn tool_at_least(&self, major: u64, minor: u64) -> bool {
        self.tool_version >= Version::new(major, minor, 0)
    }
}

impl Default for BuildTarget {
    fn default() -> Self {
        Self::new(Version::new(8, 5, 0), "17")
    }
}
