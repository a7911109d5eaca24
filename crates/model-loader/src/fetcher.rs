//! One round trip to the build tool for a whole multi-module build

use std::collections::{HashMap, HashSet};

use model_extensions::{BuildTarget, ExtensionRegistry, RawModel, ToolingType, model_def_of};
use model_fs::ModulePath;
use tracing::debug;

use crate::{BuildConnection, FetchRequest, FetchedModels, FetchedProjectModels, Result};

/// Aggregates the needs of every registered extension into a single
/// [`FetchRequest`] and executes it.
///
/// The needs are computed once, when the fetcher is created. Each call to
/// [`fetch`](Self::fetch) is exactly one call to the connection, whatever the
/// number of extensions or modules.
#[derive(Debug, Clone)]
pub struct ModelFetcher {
    request: FetchRequest,
    tooling_needs: HashMap<String, Vec<ToolingType>>,
}

impl ModelFetcher {
    pub fn new(
        project_dir: ModulePath,
        settings_file: Option<ModulePath>,
        registry: &ExtensionRegistry,
        target: &BuildTarget,
    ) -> Self {
        let mut request = FetchRequest::new(project_dir);
        request.settings_file = settings_file;

        let mut seen = HashSet::new();
        let mut tooling_needs = HashMap::new();
        for extension in registry.iter() {
            let def = model_def_of(extension.as_ref(), target);
            for tooling_type in &def.tooling_types {
                if seen.insert(tooling_type.clone()) {
                    request.tooling_types.push(tooling_type.clone());
                }
            }
            if !def.project_info_queries.is_empty() {
                request
                    .project_info_queries
                    .push((extension.name().to_string(), def.project_info_queries));
            }
            tooling_needs.insert(extension.name().to_string(), def.tooling_types);
        }

        Self {
            request,
            tooling_needs,
        }
    }

    /// The aggregated request sent on every fetch.
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn settings_file(&self) -> Option<&ModulePath> {
        self.request.settings_file.as_ref()
    }

    /// Tooling types declared by `extension`, in declaration order.
    pub fn tooling_needs_of(&self, extension: &str) -> &[ToolingType] {
        self.tooling_needs
            .get(extension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The fetched tooling objects `extension` asked for; types the build
    /// tool did not deliver for this module are skipped.
    pub fn tooling_models_for(&self, extension: &str, models: &FetchedProjectModels) -> Vec<RawModel> {
        self.tooling_needs_of(extension)
            .iter()
            .filter_map(|tooling_type| models.tooling_models.get(tooling_type).cloned())
            .collect()
    }

    /// Execute the request against `connection`.
    ///
    /// A failure of the round trip as a whole is returned as is; nothing is
    /// retried.
    pub async fn fetch(&self, connection: &dyn BuildConnection) -> Result<FetchedModels> {
        debug!(
            project = %self.request.project_dir,
            tooling_types = self.request.tooling_types.len(),
            query_sets = self.request.project_info_queries.len(),
            "Fetching project models"
        );
        let models = connection.fetch_models(&self.request).await?;
        debug!(
            project = %self.request.project_dir,
            modules = models.module_count(),
            "Fetched project models"
        );
        Ok(models)
    }
}
