//! Per-fetch cache of extension models

use std::collections::HashMap;

use model_extensions::ExtensionModel;
use model_fs::ModulePath;

/// Module → extension name → model, filled while parsing one fetch.
///
/// When an extension, parsing module N, also hands back the model of module
/// M, that model is stored here and the extension is not invoked again for
/// M. A cache lives for a single parse pass; it is never shared between
/// fetches.
#[derive(Debug, Default)]
pub struct ExtensionModelCache {
    modules: HashMap<ModulePath, HashMap<String, ExtensionModel>>,
}

impl ExtensionModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &ModulePath, extension: &str) -> Option<&ExtensionModel> {
        self.modules.get(module)?.get(extension)
    }

    /// Store a model, replacing any earlier one for the same cell.
    pub fn insert(&mut self, module: ModulePath, extension: &str, model: ExtensionModel) {
        self.modules
            .entry(module)
            .or_default()
            .insert(extension.to_string(), model);
    }

    /// Number of cached cells.
    pub fn len(&self) -> usize {
        self.modules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
