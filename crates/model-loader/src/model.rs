//! The per-project model snapshot

use std::any::Any;
use std::collections::HashMap;

use model_extensions::{ExtensionModel, GenericProperties, ModuleTree, MultiModuleDef};
use model_fs::ModulePath;

/// Extension-independent part of a [`ProjectModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericModelInfo {
    pub project_def: MultiModuleDef,
    pub settings_file: Option<ModulePath>,
}

impl GenericModelInfo {
    pub fn new(project_def: MultiModuleDef, settings_file: Option<ModulePath>) -> Self {
        Self {
            project_def,
            settings_file,
        }
    }
}

/// One module's view of a multi-module build: the module tree plus one
/// cell per extension holding that extension's model, if it produced one.
///
/// Immutable once built; a reload produces a new instance.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    info: GenericModelInfo,
    extension_models: HashMap<String, ExtensionModel>,
}

impl ProjectModel {
    /// The model of a project that has not been loaded yet: a childless
    /// module named after its directory, with no extension data.
    pub fn empty(project_dir: &ModulePath) -> Self {
        let name = project_dir.file_name().unwrap_or_default();
        let module = ModuleTree::leaf(GenericProperties::new(name, ":", project_dir.clone()));
        Self {
            info: GenericModelInfo::new(MultiModuleDef::single(module), None),
            extension_models: HashMap::new(),
        }
    }

    pub fn builder(info: GenericModelInfo) -> ProjectModelBuilder {
        ProjectModelBuilder {
            info,
            extension_models: HashMap::new(),
        }
    }

    pub fn info(&self) -> &GenericModelInfo {
        &self.info
    }

    pub fn project_dir(&self) -> &ModulePath {
        self.info.project_def.project_dir()
    }

    /// The module this model was loaded for.
    pub fn main_module(&self) -> &ModuleTree {
        &self.info.project_def.main
    }

    /// The root of the build the main module belongs to.
    pub fn root_module(&self) -> &ModuleTree {
        &self.info.project_def.root
    }

    pub fn display_name(&self) -> &str {
        self.main_module().display_name()
    }

    pub fn description(&self) -> Option<&str> {
        self.main_module().generic.description.as_deref()
    }

    pub fn settings_file(&self) -> Option<&ModulePath> {
        self.info.settings_file.as_ref()
    }

    /// The cell of `extension`; `None` when it produced nothing.
    pub fn model_of(&self, extension: &str) -> Option<&ExtensionModel> {
        self.extension_models.get(extension)
    }

    /// The cell of `extension`, downcast to its concrete type.
    pub fn model_as<T: Any>(&self, extension: &str) -> Option<&T> {
        self.model_of(extension)?.downcast_ref::<T>()
    }

    /// Names of extensions with a model, sorted.
    pub fn extension_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extension_models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects extension cells for a [`ProjectModel`].
#[derive(Debug)]
pub struct ProjectModelBuilder {
    info: GenericModelInfo,
    extension_models: HashMap<String, ExtensionModel>,
}

impl ProjectModelBuilder {
    /// Set (or, with `None`, clear) the cell of `extension`.
    pub fn set_model(&mut self, extension: &str, model: Option<ExtensionModel>) -> &mut Self {
        match model {
            Some(model) => {
                self.extension_models.insert(extension.to_string(), model);
            }
            None => {
                self.extension_models.remove(extension);
            }
        }
        self
    }

    pub fn build(self) -> ProjectModel {
        ProjectModel {
            info: self.info,
            extension_models: self.extension_models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_model_has_no_children_and_no_cells() {
        let model = ProjectModel::empty(&ModulePath::new("/work/app"));

        assert_eq!(model.project_dir(), &ModulePath::new("/work/app"));
        assert_eq!(model.display_name(), "app");
        assert!(model.main_module().children.is_empty());
        assert!(model.extension_names().is_empty());
        assert!(model.model_of("java").is_none());
        assert!(model.settings_file().is_none());
    }

    #[test]
    fn test_builder_sets_and_clears_cells() {
        let info = ProjectModel::empty(&ModulePath::new("/work/app")).info().clone();
        let mut builder = ProjectModel::builder(info);
        builder
            .set_model("java", Some(Arc::new("jdk17".to_string())))
            .set_model("kotlin", Some(Arc::new(1u8)))
            .set_model("kotlin", None);
        let model = builder.build();

        assert_eq!(model.model_as::<String>("java").map(String::as_str), Some("jdk17"));
        assert!(model.model_as::<u8>("java").is_none());
        assert_eq!(model.extension_names(), vec!["java"]);
    }
}
