//! [`FnExtension`], a closure-backed extension that records how it is used.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use model_extensions::{
    BuildTarget, ExtensionModel, ModelDef, ModelDefQuery, ModelLoadResult, ParsedModel, ProjectExtension,
    ProjectInfoQuery, Result, ToolingType,
};
use model_fs::ModulePath;
use parking_lot::Mutex;

type ParseFn = dyn Fn(&ModelLoadResult) -> Result<ParsedModel> + Send + Sync;

/// An extension whose parse function is a closure.
///
/// Counts parse calls per module and records every activation, so tests
/// can assert how often (and for which modules) the loader invoked it.
pub struct FnExtension {
    name: String,
    tooling: Vec<ToolingType>,
    queries: Vec<ProjectInfoQuery>,
    parse: Box<ParseFn>,
    calls: Mutex<HashMap<ModulePath, usize>>,
    activations: Mutex<Vec<Option<ExtensionModel>>>,
}

impl FnExtension {
    pub fn new(
        name: impl Into<String>,
        parse: impl Fn(&ModelLoadResult) -> Result<ParsedModel> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            tooling: Vec::new(),
            queries: Vec::new(),
            parse: Box::new(parse),
            calls: Mutex::new(HashMap::new()),
            activations: Mutex::new(Vec::new()),
        }
    }

    /// An extension that needs nothing and produces its own name for every
    /// module.
    pub fn constant(name: impl Into<String>) -> Self {
        let name = name.into();
        let value = name.clone();
        Self::new(name, move |_| Ok(ParsedModel::new(value.clone())))
    }

    /// An extension that needs tooling type `T` and produces the fetched
    /// `T` as its model, or nothing when the module has no `T`.
    pub fn requiring<T>(name: impl Into<String>) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        Self::new(name, |input| {
            Ok(match input.main_lookup().lookup::<T>() {
                Some(value) => ParsedModel::new(value.clone()),
                None => ParsedModel::empty(),
            })
        })
        .needs(ToolingType::of::<T>())
    }

    /// An extension whose parse function always fails.
    pub fn failing(name: impl Into<String>) -> Self {
        let name = name.into();
        let owner = name.clone();
        Self::new(name, move |input| {
            Err(model_extensions::Error::parse_failed(
                owner.clone(),
                format!("cannot parse {}", input.main_module()),
            ))
        })
    }

    /// An extension whose parse function always panics.
    pub fn panicking(name: impl Into<String>) -> Self {
        Self::new(name, |input| panic!("extension bug while parsing {}", input.main_module()))
    }

    /// Declare a needed tooling type.
    pub fn needs(mut self, tooling_type: ToolingType) -> Self {
        self.tooling.push(tooling_type);
        self
    }

    /// Declare a project-info query.
    pub fn query(mut self, query: ProjectInfoQuery) -> Self {
        self.queries.push(query);
        self
    }

    /// Parse calls made for `module`.
    pub fn calls_for(&self, module: &ModulePath) -> usize {
        self.calls.lock().get(module).copied().unwrap_or(0)
    }

    /// Parse calls made for any module.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Cells received by [`ProjectExtension::activate`], in order.
    pub fn activations(&self) -> Vec<Option<ExtensionModel>> {
        self.activations.lock().clone()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl ProjectExtension for FnExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn model_queries(&self) -> Vec<Arc<dyn ModelDefQuery>> {
        if self.queries.is_empty() {
            return Vec::new();
        }
        let def = ModelDef::new(self.tooling.clone(), self.queries.clone());
        let query: Arc<dyn ModelDefQuery> = Arc::new(move |_: &BuildTarget| Some(def.clone()));
        vec![query]
    }

    fn basic_tooling_types(&self, _target: &BuildTarget) -> Vec<ToolingType> {
        self.tooling.clone()
    }

    fn parse_model(&self, input: &ModelLoadResult) -> Result<ParsedModel> {
        *self.calls.lock().entry(input.main_module().clone()).or_default() += 1;
        (self.parse)(input)
    }

    fn activate(&self, model: Option<&ExtensionModel>) {
        self.activations.lock().push(model.cloned());
    }
}
