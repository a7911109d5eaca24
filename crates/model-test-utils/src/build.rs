//! [`TestBuild`] builder for fetched multi-module bundles.

use std::any::Any;
use std::sync::Arc;

use model_extensions::{GenericProperties, ModuleTree, MultiModuleDef, ToolingType};
use model_fs::ModulePath;
use model_loader::{BuilderResult, FetchedModels, FetchedProjectModels, ModuleFetchIssue};

struct TestModule {
    name: String,
    dir: ModulePath,
    models: Vec<(ToolingType, Arc<dyn Any + Send + Sync>)>,
    results: Vec<(String, BuilderResult)>,
    issue: Option<String>,
}

/// A multi-module build rooted at one directory, described module by
/// module and turned into the [`FetchedModels`] a build tool would return.
///
/// The root module is named after the last segment of its directory;
/// child modules live in `<root>/<name>`. Unless
/// [`fetched_for`](Self::fetched_for) says otherwise, the bundle is the one
/// fetched for the root.
///
/// # Example
///
/// ```rust,no_run
/// use model_test_utils::TestBuild;
///
/// let fetched = TestBuild::new("/work/app")
///     .module("core")
///     .tooling("core", 42u32)
///     .build();
/// assert_eq!(fetched.module_count(), 2);
/// ```
pub struct TestBuild {
    modules: Vec<TestModule>,
    default_module: usize,
}

impl TestBuild {
    pub fn new(root_dir: &str) -> Self {
        let dir = ModulePath::new(root_dir);
        let name = dir.file_name().unwrap_or_default().to_string();
        Self {
            modules: vec![TestModule::new(name, dir)],
            default_module: 0,
        }
    }

    /// Directory of the root module.
    pub fn root_dir(&self) -> ModulePath {
        self.modules[0].dir.clone()
    }

    /// Directory of the module called `name`.
    ///
    /// # Panics
    /// Panics if no such module was declared.
    pub fn dir(&self, name: &str) -> ModulePath {
        self.modules[self.index(name)].dir.clone()
    }

    /// Add a child module of the root.
    pub fn module(mut self, name: &str) -> Self {
        let dir = self.modules[0].dir.join(name);
        self.modules.push(TestModule::new(name.to_string(), dir));
        self
    }

    /// Issue the fetch for `name` instead of the root.
    pub fn fetched_for(mut self, name: &str) -> Self {
        self.default_module = self.index(name);
        self
    }

    /// Give `module` a tooling object keyed by the type of `value`.
    pub fn tooling<T: Any + Send + Sync>(mut self, module: &str, value: T) -> Self {
        let index = self.index(module);
        self.modules[index]
            .models
            .push((ToolingType::of::<T>(), Arc::new(value)));
        self
    }

    /// Add a project-info result for `extension` to `module`.
    pub fn info_result(mut self, module: &str, extension: &str, result: BuilderResult) -> Self {
        let index = self.index(module);
        self.modules[index].results.push((extension.to_string(), result));
        self
    }

    /// Mark `module` as only partially loaded.
    pub fn module_issue(mut self, module: &str, message: &str) -> Self {
        let index = self.index(module);
        self.modules[index].issue = Some(message.to_string());
        self
    }

    /// The module tree, rooted at the root module.
    pub fn tree(&self) -> ModuleTree {
        self.modules[1..]
            .iter()
            .fold(self.modules[0].tree(":"), |root, child| {
                root.with_child(child.tree(&format!(":{}", child.name)))
            })
    }

    pub fn build(&self) -> FetchedModels {
        let root = self.tree();
        let mut fetched = FetchedModels::new(self.fetched_module(&root, self.default_module));
        for index in 0..self.modules.len() {
            if index != self.default_module {
                fetched = fetched.with_other(self.fetched_module(&root, index));
            }
        }
        fetched
    }

    fn fetched_module(&self, root: &ModuleTree, index: usize) -> FetchedProjectModels {
        let module = &self.modules[index];
        let main = root.find(&module.dir).cloned().unwrap_or_else(|| root.clone());
        let mut models = FetchedProjectModels::new(MultiModuleDef::new(root.clone(), main));
        for (tooling_type, value) in &module.models {
            models = models.with_tooling_model(tooling_type.clone(), Arc::clone(value));
        }
        for (extension, result) in &module.results {
            models = models.with_project_info_result(extension.clone(), result.clone());
        }
        if let Some(message) = &module.issue {
            models = models.with_issue(ModuleFetchIssue::new(message.clone()));
        }
        models
    }

    fn index(&self, name: &str) -> usize {
        self.modules
            .iter()
            .position(|module| module.name == name)
            .unwrap_or_else(|| panic!("TestBuild: unknown module '{name}'"))
    }
}

impl TestModule {
    fn new(name: String, dir: ModulePath) -> Self {
        Self {
            name,
            dir,
            models: Vec::new(),
            results: Vec::new(),
            issue: None,
        }
    }

    fn tree(&self, full_name: &str) -> ModuleTree {
        ModuleTree::leaf(GenericProperties::new(self.name.clone(), full_name, self.dir.clone()))
    }
}
