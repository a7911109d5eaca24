//! The external build tool, as seen by the loader

use async_trait::async_trait;
use model_extensions::{ProjectInfoQuery, ToolingType};
use model_fs::ModulePath;

use crate::{FetchedModels, Result};

/// The aggregated needs of every registered extension, sent in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Directory of the module the fetch is issued for.
    pub project_dir: ModulePath,
    /// Settings file of the enclosing multi-module build, if any.
    pub settings_file: Option<ModulePath>,
    /// Union of the tooling types all extensions need, without duplicates,
    /// in first-requested order.
    pub tooling_types: Vec<ToolingType>,
    /// Project-info queries per extension, in registration order.
    /// Extensions without queries are left out.
    pub project_info_queries: Vec<(String, Vec<ProjectInfoQuery>)>,
}

impl FetchRequest {
    pub fn new(project_dir: ModulePath) -> Self {
        Self {
            project_dir,
            settings_file: None,
            tooling_types: Vec::new(),
            project_info_queries: Vec::new(),
        }
    }

    /// Whether no extension needs anything beyond generic metadata.
    pub fn is_empty(&self) -> bool {
        self.tooling_types.is_empty() && self.project_info_queries.is_empty()
    }

    /// Queries registered by `extension`.
    pub fn queries_of(&self, extension: &str) -> &[ProjectInfoQuery] {
        self.project_info_queries
            .iter()
            .find(|(name, _)| name == extension)
            .map(|(_, queries)| queries.as_slice())
            .unwrap_or(&[])
    }
}

/// Connection to the external build tool.
///
/// One call covers the whole multi-module build. A failure of the call as
/// a whole is returned as an error ([`Error::Connection`](crate::Error::Connection));
/// failures affecting a single module belong inside the returned bundle.
#[async_trait]
pub trait BuildConnection: Send + Sync {
    async fn fetch_models(&self, request: &FetchRequest) -> Result<FetchedModels>;
}
