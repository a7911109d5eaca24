//! Case- and separator-normalized module directories

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How letter case takes part in path identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCase {
    /// `A/b` and `a/B` are different directories.
    Sensitive,
    /// `A/b` and `a/B` are the same directory.
    Insensitive,
}

impl PathCase {
    /// Case handling of the host filesystem.
    pub fn platform() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }
}

/// The identity of a module: its directory, normalized.
///
/// The display form keeps the caller's letter case and uses forward
/// slashes, with repeated separators collapsed and trailing separators
/// removed. Equality, hashing and ordering use a key that is additionally
/// lowercased when the path was built with [`PathCase::Insensitive`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ModulePath {
    display: String,
    key: String,
    case: PathCase,
}

impl ModulePath {
    /// Normalize `path` using the host filesystem's case rules.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_case(path, PathCase::platform())
    }

    /// Normalize `path` with explicit case rules.
    pub fn with_case(path: impl AsRef<Path>, case: PathCase) -> Self {
        let display = normalize(&path.as_ref().to_string_lossy());
        let key = match case {
            PathCase::Sensitive => display.clone(),
            PathCase::Insensitive => display.to_lowercase(),
        };
        Self { display, key, case }
    }

    /// Resolve an existing directory to its canonical form.
    ///
    /// Fails if the directory does not exist or is not a directory.
    pub fn canonicalize(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let canonical = dunce::canonicalize(path).map_err(|e| Error::io(path, e))?;
        if !canonical.is_dir() {
            return Err(Error::NotADirectory { path: canonical });
        }
        Ok(Self::new(canonical))
    }

    /// The normalized display form.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The identity key used for comparisons.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.display)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let joined = if self.display.is_empty() || self.display.ends_with('/') {
            format!("{}{}", self.display, segment)
        } else {
            format!("{}/{}", self.display, segment)
        };
        self.rebuild(joined)
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.display.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) if trimmed.len() > 1 => Some(self.rebuild("/".to_string())),
            Some(idx) if idx > 0 => {
                let parent = &trimmed[..idx];
                // "//server" has no meaningful parent
                if parent == "/" || parent.is_empty() {
                    return None;
                }
                Some(self.rebuild(parent.to_string()))
            }
            _ => None,
        }
    }

    /// This directory followed by each of its ancestors, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = ModulePath> {
        std::iter::successors(Some(self.clone()), ModulePath::parent)
    }

    /// Get the last path component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.display.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    fn rebuild(&self, raw: String) -> Self {
        Self::with_case(raw, self.case)
    }
}

/// Forward slashes, no repeated or trailing separators.
///
/// A leading `//` (UNC share) is preserved; `C:/` keeps its slash so it
/// still names the drive root.
fn normalize(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let (prefix, rest) = if replaced.starts_with("//") && !replaced.starts_with("///") {
        ("//", &replaced[2..])
    } else if replaced.starts_with('/') {
        ("/", replaced.trim_start_matches('/'))
    } else {
        ("", replaced.as_str())
    };

    let body = rest
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    let is_drive = prefix.is_empty() && body.len() == 2 && body.ends_with(':');
    if is_drive && rest.len() > 2 {
        format!("{body}/")
    } else {
        format!("{prefix}{body}")
    }
}

impl PartialEq for ModulePath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ModulePath {}

impl Hash for ModulePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ModulePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModulePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl AsRef<Path> for ModulePath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.display)
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for ModulePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModulePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for ModulePath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for ModulePath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<ModulePath> for String {
    fn from(path: ModulePath) -> Self {
        path.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("foo/bar/baz", "foo/bar/baz")]
    #[case("foo\\bar\\baz", "foo/bar/baz")]
    #[case("/work//app///lib/", "/work/app/lib")]
    #[case("//server/share/", "//server/share")]
    #[case("///rooted", "/rooted")]
    #[case("/", "/")]
    #[case("C:\\", "C:/")]
    #[case("C:\\work\\app\\", "C:/work/app")]
    fn test_normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ModulePath::new(raw).as_str(), expected);
    }

    #[test]
    fn test_case_insensitive_identity() {
        let a = ModulePath::with_case("/Work/App", PathCase::Insensitive);
        let b = ModulePath::with_case("/work/app/", PathCase::Insensitive);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "/Work/App");
        assert_eq!(a.key(), "/work/app");
    }

    #[test]
    fn test_case_sensitive_identity() {
        let a = ModulePath::with_case("/Work/App", PathCase::Sensitive);
        let b = ModulePath::with_case("/work/app", PathCase::Sensitive);
        assert_ne!(a, b);
    }

    #[test]
    fn test_join_keeps_case_rules() {
        let base = ModulePath::with_case("/Work", PathCase::Insensitive);
        let joined = base.join("App");
        assert_eq!(joined, ModulePath::with_case("/work/app", PathCase::Insensitive));
    }

    #[test]
    fn test_parent_chain() {
        let path = ModulePath::new("/work/root/app");
        let chain: Vec<String> = path.ancestors().map(String::from).collect();
        assert_eq!(chain, vec!["/work/root/app", "/work/root", "/work", "/"]);
    }

    #[test]
    fn test_relative_parent_ends() {
        let path = ModulePath::new("root/app");
        assert_eq!(path.parent().unwrap().as_str(), "root");
        assert!(path.parent().unwrap().parent().is_none());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(ModulePath::new("/work/root/app").file_name(), Some("app"));
        assert_eq!(ModulePath::new("/").file_name(), None);
    }

    #[test]
    fn test_serde_as_plain_string() {
        let path = ModulePath::new("/work/app");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/work/app\"");
        let back: ModulePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_canonicalize_rejects_missing_directory() {
        let err = ModulePath::canonicalize("/nonexistent/path/that/does/not/exist").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_canonicalize_rejects_file() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("build.gradle");
        std::fs::write(&file, "").unwrap();
        let err = ModulePath::canonicalize(&file).unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }
}
