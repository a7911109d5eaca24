//! Project-wide diagnostics shown to the user

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The most recent load failed as a whole.
    LoadFailed,
    /// The project was set up inconsistently, e.g. two extensions share a name.
    Configuration,
}

/// A persistent, user-visible problem with a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl ProjectDiagnostic {
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::LoadFailed, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Configuration, message)
    }

    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }
}

impl fmt::Display for ProjectDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The single load-error slot plus the configuration errors of a project.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    load_error: Mutex<Option<ProjectDiagnostic>>,
    configuration: Mutex<Vec<ProjectDiagnostic>>,
}

impl Diagnostics {
    /// Replace the load error.
    pub(crate) fn set_load_error(&self, diagnostic: ProjectDiagnostic) {
        *self.load_error.lock() = Some(diagnostic);
    }

    pub(crate) fn clear_load_error(&self) {
        *self.load_error.lock() = None;
    }

    pub(crate) fn load_error(&self) -> Option<ProjectDiagnostic> {
        self.load_error.lock().clone()
    }

    pub(crate) fn add_configuration_error(&self, diagnostic: ProjectDiagnostic) {
        self.configuration.lock().push(diagnostic);
    }

    pub(crate) fn configuration_errors(&self) -> Vec<ProjectDiagnostic> {
        self.configuration.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_slot_holds_latest() {
        let diagnostics = Diagnostics::default();
        diagnostics.set_load_error(ProjectDiagnostic::load_failed("first"));
        diagnostics.set_load_error(ProjectDiagnostic::load_failed("second"));

        assert_eq!(diagnostics.load_error().unwrap().message, "second");
        diagnostics.clear_load_error();
        assert!(diagnostics.load_error().is_none());
    }

    #[test]
    fn test_configuration_errors_accumulate() {
        let diagnostics = Diagnostics::default();
        diagnostics.add_configuration_error(ProjectDiagnostic::configuration("a"));
        diagnostics.add_configuration_error(ProjectDiagnostic::configuration("b"));

        let errors = diagnostics.configuration_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == DiagnosticKind::Configuration));
    }

    #[test]
    fn test_diagnostic_serializes_kind() {
        let json = serde_json::to_value(ProjectDiagnostic::load_failed("offline")).unwrap();
        assert_eq!(json["kind"], "load_failed");
        assert_eq!(json["message"], "offline");
    }
}
