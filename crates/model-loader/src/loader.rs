//! Fetch followed by parse

use model_extensions::{BuildTarget, ExtensionRegistry};
use model_fs::{DEFAULT_SETTINGS_FILES, ModulePath, find_settings_file};
use tracing::info;

use crate::{BuildConnection, LoadIssue, ModelFetcher, ModelParser, ProjectModel, Result};

/// Outcome of one successful load.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Model of the module the load was issued for.
    pub main_model: ProjectModel,
    /// Models of the other modules of the same build, in fetch order.
    pub other_models: Vec<ProjectModel>,
    /// Recoverable problems, in the order they were found.
    pub issues: Vec<LoadIssue>,
}

impl LoadResult {
    /// Main model first, then the others.
    pub fn all_models(&self) -> impl Iterator<Item = &ProjectModel> {
        std::iter::once(&self.main_model).chain(&self.other_models)
    }

    /// The model of the module rooted at `dir`.
    pub fn model_for(&self, dir: &ModulePath) -> Option<&ProjectModel> {
        self.all_models().find(|model| model.project_dir() == dir)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Loads the models of a multi-module build with one round trip.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    target: BuildTarget,
    settings_files: Vec<String>,
}

impl ModelLoader {
    pub fn new(target: BuildTarget) -> Self {
        Self {
            target,
            settings_files: DEFAULT_SETTINGS_FILES.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Replace the settings file names probed for the enclosing build.
    pub fn with_settings_files(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.settings_files = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    pub fn settings_files(&self) -> &[String] {
        &self.settings_files
    }

    /// Fetch and parse the models of the build containing `project_dir`.
    ///
    /// Fails only when the round trip as a whole fails; every other
    /// problem is reported in [`LoadResult::issues`].
    pub async fn load_models(
        &self,
        project_dir: &ModulePath,
        registry: &ExtensionRegistry,
        connection: &dyn BuildConnection,
    ) -> Result<LoadResult> {
        let settings_file = find_settings_file(project_dir, &self.settings_files);
        let fetcher = ModelFetcher::new(project_dir.clone(), settings_file, registry, &self.target);

        let fetched = fetcher.fetch(connection).await?;
        let result = ModelParser::new(registry, &fetcher).parse_model(fetched);

        info!(
            project = %project_dir,
            modules = 1 + result.other_models.len(),
            issues = result.issues.len(),
            "Loaded project models"
        );
        Ok(result)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(BuildTarget::default())
    }
}
