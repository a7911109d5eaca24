//! Where a project gets its models from

use std::sync::Arc;

use async_trait::async_trait;
use model_extensions::ExtensionRegistry;
use model_fs::ModulePath;
use model_loader::{BuildConnection, LoadResult, ModelLoader};

/// Produces the models of the build containing a project directory.
///
/// The coordinator calls this at most once at a time per project.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn load(&self, project_dir: &ModulePath, registry: &ExtensionRegistry) -> model_loader::Result<LoadResult>;
}

/// A [`ModelSource`] running a [`ModelLoader`] against a build tool
/// connection.
pub struct ConnectionModelSource {
    loader: ModelLoader,
    connection: Arc<dyn BuildConnection>,
}

impl ConnectionModelSource {
    pub fn new(loader: ModelLoader, connection: Arc<dyn BuildConnection>) -> Self {
        Self { loader, connection }
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }
}

#[async_trait]
impl ModelSource for ConnectionModelSource {
    async fn load(&self, project_dir: &ModulePath, registry: &ExtensionRegistry) -> model_loader::Result<LoadResult> {
        self.loader
            .load_models(project_dir, registry, self.connection.as_ref())
            .await
    }
}
