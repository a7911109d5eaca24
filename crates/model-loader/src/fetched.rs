//! Raw results of one round trip to the build tool

use std::collections::HashMap;
use std::fmt;

use model_extensions::{MultiModuleDef, RawModel, ToolingType};
use model_fs::ModulePath;

/// A problem reported by the build tool while evaluating one project-info
/// query for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderIssue {
    /// Name of the query (builder) that failed.
    pub name: String,
    pub message: String,
}

impl BuilderIssue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for BuilderIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// The outcome of one project-info query for one module: a result, an
/// issue, or both (a partial result).
#[derive(Clone, Default)]
pub struct BuilderResult {
    pub result: Option<RawModel>,
    pub issue: Option<BuilderIssue>,
}

impl BuilderResult {
    pub fn ok(result: RawModel) -> Self {
        Self {
            result: Some(result),
            issue: None,
        }
    }

    pub fn failed(issue: BuilderIssue) -> Self {
        Self {
            result: None,
            issue: Some(issue),
        }
    }
}

impl fmt::Debug for BuilderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderResult")
            .field("has_result", &self.result.is_some())
            .field("issue", &self.issue)
            .finish()
    }
}

/// A module-level failure: the module is still present, with whatever data
/// could be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFetchIssue {
    pub message: String,
}

impl ModuleFetchIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw data fetched for one module.
#[derive(Clone)]
pub struct FetchedProjectModels {
    /// Generic metadata and the module tree, seen from this module.
    pub project_def: MultiModuleDef,
    /// Project-info results, keyed by the name of the extension that asked.
    pub project_info_results: HashMap<String, Vec<BuilderResult>>,
    /// Tooling objects, keyed by their declared type.
    pub tooling_models: HashMap<ToolingType, RawModel>,
    pub issue: Option<ModuleFetchIssue>,
}

impl FetchedProjectModels {
    pub fn new(project_def: MultiModuleDef) -> Self {
        Self {
            project_def,
            project_info_results: HashMap::new(),
            tooling_models: HashMap::new(),
            issue: None,
        }
    }

    pub fn with_tooling_model(mut self, tooling_type: ToolingType, model: RawModel) -> Self {
        self.tooling_models.insert(tooling_type, model);
        self
    }

    pub fn with_project_info_result(mut self, extension: impl Into<String>, result: BuilderResult) -> Self {
        self.project_info_results
            .entry(extension.into())
            .or_default()
            .push(result);
        self
    }

    pub fn with_issue(mut self, issue: ModuleFetchIssue) -> Self {
        self.issue = Some(issue);
        self
    }

    pub fn project_dir(&self) -> &ModulePath {
        self.project_def.project_dir()
    }
}

impl fmt::Debug for FetchedProjectModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedProjectModels")
            .field("project_dir", self.project_dir())
            .field("project_info_results", &self.project_info_results)
            .field("tooling_models", &self.tooling_models.keys().collect::<Vec<_>>())
            .field("issue", &self.issue)
            .finish()
    }
}

/// Everything one round trip returned: the module the fetch was issued for
/// plus every other module of the same build.
#[derive(Debug, Clone)]
pub struct FetchedModels {
    pub default_project: FetchedProjectModels,
    pub other_projects: Vec<FetchedProjectModels>,
}

impl FetchedModels {
    pub fn new(default_project: FetchedProjectModels) -> Self {
        Self {
            default_project,
            other_projects: Vec::new(),
        }
    }

    pub fn with_other(mut self, other: FetchedProjectModels) -> Self {
        self.other_projects.push(other);
        self
    }

    /// Number of module entries, duplicates included.
    pub fn module_count(&self) -> usize {
        1 + self.other_projects.len()
    }
}
