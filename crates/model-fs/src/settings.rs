//! Locating the settings file that defines a multi-module build

use crate::ModulePath;

/// Settings file names probed when no explicit list is configured.
pub const DEFAULT_SETTINGS_FILES: &[&str] = &["settings.gradle", "settings.gradle.kts"];

/// Find the settings file governing `project_dir`.
///
/// Probes `project_dir` and then each ancestor, innermost first, for any of
/// `names` (in order). Returns `None` for a standalone module.
pub fn find_settings_file<S: AsRef<str>>(project_dir: &ModulePath, names: &[S]) -> Option<ModulePath> {
    for dir in project_dir.ancestors() {
        for name in names {
            let candidate = dir.join(name.as_ref());
            if candidate.is_file() {
                tracing::debug!(settings = %candidate, project = %project_dir, "Found settings file");
                return Some(candidate);
            }
        }
    }
    None
}
