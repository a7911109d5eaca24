//! Opaque, type-keyed inputs handed to an extension's parse function

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use model_fs::ModulePath;

/// A raw object fetched from the build tool.
pub type RawModel = Arc<dyn Any + Send + Sync>;

static EMPTY_LOOKUP: ModelLookup = ModelLookup::empty();

/// The inputs one extension receives for one module.
///
/// Contains the extension's project-info results, the tooling objects it
/// asked for and the module's [`GenericProperties`](crate::GenericProperties).
/// Objects are found by type, so an extension only has to know the types
/// it declared.
#[derive(Clone, Default)]
pub struct ModelLookup {
    items: Vec<RawModel>,
}

impl ModelLookup {
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub fn new(items: Vec<RawModel>) -> Self {
        Self { items }
    }

    /// The first object of type `T`.
    pub fn lookup<T: Any>(&self) -> Option<&T> {
        self.items.iter().find_map(|item| item.downcast_ref::<T>())
    }

    /// Every object of type `T`, in insertion order.
    pub fn lookup_all<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|item| item.downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for ModelLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLookup")
            .field("items", &self.items.len())
            .finish()
    }
}

/// What an extension's parse function sees: its own inputs for every
/// module of the fetch, with one module marked as the one being parsed.
///
/// Access to sibling modules lets an extension resolve cross-module
/// information (a dependency on a sibling, say) in a single pass.
#[derive(Debug, Clone)]
pub struct ModelLoadResult {
    main_module: ModulePath,
    lookups: Arc<HashMap<ModulePath, ModelLookup>>,
}

impl ModelLoadResult {
    pub fn new(main_module: ModulePath, lookups: HashMap<ModulePath, ModelLookup>) -> Self {
        Self {
            main_module,
            lookups: Arc::new(lookups),
        }
    }

    /// The same inputs, re-targeted at another module.
    pub fn with_main_module(&self, main_module: ModulePath) -> Self {
        Self {
            main_module,
            lookups: Arc::clone(&self.lookups),
        }
    }

    /// The module being parsed.
    pub fn main_module(&self) -> &ModulePath {
        &self.main_module
    }

    /// Inputs for the module being parsed; empty if the fetch had none.
    pub fn main_lookup(&self) -> &ModelLookup {
        self.lookup_for(&self.main_module)
    }

    /// Inputs for any module of the fetch; empty for unknown modules.
    pub fn lookup_for(&self, module: &ModulePath) -> &ModelLookup {
        self.lookups.get(module).unwrap_or(&EMPTY_LOOKUP)
    }

    /// Every module of the fetch.
    pub fn modules(&self) -> impl Iterator<Item = &ModulePath> {
        self.lookups.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Dependencies(Vec<&'static str>);

    #[test]
    fn test_lookup_by_type() {
        let lookup = ModelLookup::new(vec![
            Arc::new(Dependencies(vec!["core"])),
            Arc::new(42u32),
            Arc::new(Dependencies(vec!["util"])),
        ]);

        assert_eq!(lookup.lookup::<Dependencies>(), Some(&Dependencies(vec!["core"])));
        assert_eq!(lookup.lookup::<u32>(), Some(&42));
        assert_eq!(lookup.lookup::<String>(), None);
        assert_eq!(lookup.lookup_all::<Dependencies>().count(), 2);
    }

    #[test]
    fn test_load_result_retargets_without_copying() {
        let app = ModulePath::new("/work/app");
        let core = ModulePath::new("/work/core");
        let mut lookups = HashMap::new();
        lookups.insert(app.clone(), ModelLookup::new(vec![Arc::new(1u8)]));
        lookups.insert(core.clone(), ModelLookup::new(vec![Arc::new(2u8)]));

        let for_app = ModelLoadResult::new(app.clone(), lookups);
        let for_core = for_app.with_main_module(core.clone());

        assert_eq!(for_app.main_lookup().lookup::<u8>(), Some(&1));
        assert_eq!(for_core.main_lookup().lookup::<u8>(), Some(&2));
        assert_eq!(for_core.lookup_for(&app).lookup::<u8>(), Some(&1));
        assert!(Arc::ptr_eq(&for_app.lookups, &for_core.lookups));
    }

    #[test]
    fn test_unknown_module_has_empty_lookup() {
        let result = ModelLoadResult::new(ModulePath::new("/work/app"), HashMap::new());
        assert!(result.main_lookup().is_empty());
        assert!(result.lookup_for(&ModulePath::new("/nowhere")).is_empty());
    }
}
