//! Recoverable problems found while fetching or parsing

use std::fmt;

use model_fs::ModulePath;
use serde::Serialize;

use crate::{BuilderIssue, FetchedProjectModels, ModuleFetchIssue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// Where an issue originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The build tool could not fully load a module.
    ModuleLoad,
    /// A project-info query failed for a module.
    Builder,
    /// An extension failed to parse its model.
    ExtensionParse,
}

/// A recoverable problem scoped to a module and, optionally, an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    pub module: ModulePath,
    pub extension: Option<String>,
    pub severity: IssueSeverity,
    pub kind: IssueKind,
    pub message: String,
}

impl LoadIssue {
    pub fn module_load_error(models: &FetchedProjectModels, issue: &ModuleFetchIssue) -> Self {
        Self {
            module: models.project_dir().clone(),
            extension: None,
            severity: IssueSeverity::Error,
            kind: IssueKind::ModuleLoad,
            message: issue.message.clone(),
        }
    }

    pub fn builder_error(models: &FetchedProjectModels, extension: &str, issue: &BuilderIssue) -> Self {
        Self {
            module: models.project_dir().clone(),
            extension: Some(extension.to_string()),
            severity: IssueSeverity::Warning,
            kind: IssueKind::Builder,
            message: issue.to_string(),
        }
    }

    pub fn extension_error(module: &ModulePath, extension: &str, message: impl Into<String>) -> Self {
        Self {
            module: module.clone(),
            extension: Some(extension.to_string()),
            severity: IssueSeverity::Error,
            kind: IssueKind::ExtensionParse,
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extension {
            Some(extension) => write!(f, "[{}] {} ({}): {}", extension, self.module, kind_label(self.kind), self.message),
            None => write!(f, "{} ({}): {}", self.module, kind_label(self.kind), self.message),
        }
    }
}

fn kind_label(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::ModuleLoad => "module load",
        IssueKind::Builder => "query",
        IssueKind::ExtensionParse => "parse",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_extension_and_module() {
        let issue = LoadIssue::extension_error(&ModulePath::new("/work/app"), "java", "boom");
        let display = issue.to_string();
        assert!(display.contains("[java]"), "got: {display}");
        assert!(display.contains("/work/app"), "got: {display}");
        assert!(display.contains("boom"), "got: {display}");
    }
}
