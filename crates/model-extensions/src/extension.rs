//! The extension contract

use std::any::Any;
use std::sync::Arc;

use model_fs::ModulePath;
use tracing::warn;

use crate::{BuildTarget, ModelDef, ModelDefQuery, ModelLoadResult, Result, ToolingType};

/// A model built by an extension. Opaque to the loader.
pub type ExtensionModel = Arc<dyn Any + Send + Sync>;

/// Output of one [`ProjectExtension::parse_model`] call.
///
/// Besides the model of the module being parsed, an extension may hand back
/// models for other modules it resolved along the way; those are reused
/// instead of invoking the extension again for them.
#[derive(Clone, Default)]
pub struct ParsedModel {
    main: Option<ExtensionModel>,
    others: Vec<(ModulePath, ExtensionModel)>,
}

impl ParsedModel {
    /// The extension has nothing for this module.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<T: Any + Send + Sync>(main: T) -> Self {
        Self::from_model(Arc::new(main))
    }

    pub fn from_model(main: ExtensionModel) -> Self {
        Self {
            main: Some(main),
            others: Vec::new(),
        }
    }

    /// Also provide the model of another module.
    pub fn with_other<T: Any + Send + Sync>(mut self, module: ModulePath, model: T) -> Self {
        self.others.push((module, Arc::new(model)));
        self
    }

    pub fn main_model(&self) -> Option<&ExtensionModel> {
        self.main.as_ref()
    }

    pub fn other_models(&self) -> &[(ModulePath, ExtensionModel)] {
        &self.others
    }

    pub fn into_parts(self) -> (Option<ExtensionModel>, Vec<(ModulePath, ExtensionModel)>) {
        (self.main, self.others)
    }
}

impl std::fmt::Debug for ParsedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedModel")
            .field("has_main", &self.main.is_some())
            .field(
                "others",
                &self.others.iter().map(|(dir, _)| dir.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A pluggable component contributing a typed model for each module.
pub trait ProjectExtension: Send + Sync {
    /// Key of this extension's cells in every project model. Unique within
    /// a registry.
    fn name(&self) -> &str;

    /// Queries describing what to fetch. When empty,
    /// [`basic_tooling_types`](Self::basic_tooling_types) is used instead.
    fn model_queries(&self) -> Vec<Arc<dyn ModelDefQuery>> {
        Vec::new()
    }

    /// Tooling types needed by an extension without explicit queries.
    fn basic_tooling_types(&self, _target: &BuildTarget) -> Vec<ToolingType> {
        Vec::new()
    }

    /// Build the model of `input.main_module()`.
    ///
    /// Must depend only on `input`. An `Err` (or a panic) is isolated to
    /// this extension and module.
    fn parse_model(&self, input: &ModelLoadResult) -> Result<ParsedModel>;

    /// Called on the project's serialized context whenever a new model is
    /// installed, with this extension's cell (`None` when absent).
    fn activate(&self, _model: Option<&ExtensionModel>) {}
}

/// Everything `extension` needs fetched for `target`.
///
/// Several queries are merged in order; a query returning `None` is
/// logged and contributes nothing.
pub fn model_def_of(extension: &dyn ProjectExtension, target: &BuildTarget) -> ModelDef {
    let queries = extension.model_queries();
    if queries.is_empty() {
        let tooling = extension.basic_tooling_types(target);
        return if tooling.is_empty() {
            ModelDef::default()
        } else {
            ModelDef::tooling(tooling)
        };
    }

    let mut merged = ModelDef::default();
    for query in queries {
        match query.model_def(target) {
            Some(def) => merged.merge(def),
            None => warn!(
                extension = extension.name(),
                "ModelDefQuery returned no definition; treating it as empty"
            ),
        }
    }
    merged
}
