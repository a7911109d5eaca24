//! Generic module metadata and the module tree of a multi-module build

use model_fs::ModulePath;
use serde::{Deserialize, Serialize};

/// Build metadata every module has, independent of any extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericProperties {
    /// Short name of the module, e.g. `core`.
    pub name: String,
    /// Path of the module within the build, e.g. `:libs:core`.
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_dir: ModulePath,
}

impl GenericProperties {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, project_dir: ModulePath) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            description: None,
            project_dir,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A module and the modules declared beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTree {
    pub generic: GenericProperties,
    #[serde(default)]
    pub children: Vec<ModuleTree>,
}

impl ModuleTree {
    pub fn leaf(generic: GenericProperties) -> Self {
        Self {
            generic,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ModuleTree) -> Self {
        self.children.push(child);
        self
    }

    pub fn project_dir(&self) -> &ModulePath {
        &self.generic.project_dir
    }

    /// Name shown to users: the short name, or the build path for an
    /// unnamed module.
    pub fn display_name(&self) -> &str {
        if self.generic.name.is_empty() {
            &self.generic.full_name
        } else {
            &self.generic.name
        }
    }

    /// Depth-first search for the module rooted at `dir`.
    pub fn find(&self, dir: &ModulePath) -> Option<&ModuleTree> {
        if self.project_dir() == dir {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(dir))
    }

    /// This module and every descendant, depth-first.
    pub fn iter(&self) -> Vec<&ModuleTree> {
        let mut result = vec![self];
        for child in &self.children {
            result.extend(child.iter());
        }
        result
    }
}

/// The module tree of a build, as seen from one of its modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiModuleDef {
    /// The root of the whole build.
    pub root: ModuleTree,
    /// The module this definition was fetched for.
    pub main: ModuleTree,
}

impl MultiModuleDef {
    pub fn new(root: ModuleTree, main: ModuleTree) -> Self {
        Self { root, main }
    }

    /// A build consisting of a single module.
    pub fn single(module: ModuleTree) -> Self {
        Self {
            root: module.clone(),
            main: module,
        }
    }

    pub fn project_dir(&self) -> &ModulePath {
        self.main.project_dir()
    }

    pub fn is_root(&self) -> bool {
        self.root.project_dir() == self.main.project_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, dir: &str) -> ModuleTree {
        ModuleTree::leaf(GenericProperties::new(name, format!(":{name}"), ModulePath::new(dir)))
    }

    #[test]
    fn test_find_nested_module() {
        let tree = module("root", "/work/root")
            .with_child(module("app", "/work/root/app").with_child(module("ui", "/work/root/app/ui")));

        let found = tree.find(&ModulePath::new("/work/root/app/ui")).unwrap();
        assert_eq!(found.display_name(), "ui");
        assert!(tree.find(&ModulePath::new("/elsewhere")).is_none());
        assert_eq!(tree.iter().len(), 3);
    }

    #[test]
    fn test_display_name_falls_back_to_full_name() {
        let tree = ModuleTree::leaf(GenericProperties::new("", ":", ModulePath::new("/work/root")));
        assert_eq!(tree.display_name(), ":");
    }

    #[test]
    fn test_single_module_build_is_root() {
        let def = MultiModuleDef::single(module("solo", "/work/solo"));
        assert!(def.is_root());
        assert_eq!(def.project_dir(), &ModulePath::new("/work/solo"));
    }
}
