//! Ordered registry of the extensions attached to a project.

use std::sync::Arc;

use tracing::error;

use crate::{Error, ProjectExtension, Result};

/// Registry of project extensions, in registration order.
///
/// Order is significant: the loader runs extensions in this order for every
/// module, so models an earlier extension hands back for other modules are
/// visible to later iterations of the same pass. Once shared (it is
/// normally wrapped in an `Arc`), the registry is not modified again.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn ProjectExtension>>,
}

impl ExtensionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Build a registry from `extensions`, keeping the first of any
    /// duplicated names.
    ///
    /// Rejected extensions are reported, not merged: the returned errors
    /// describe every extension that was left out.
    pub fn from_extensions(
        extensions: impl IntoIterator<Item = Arc<dyn ProjectExtension>>,
    ) -> (Self, Vec<Error>) {
        let mut registry = Self::new();
        let mut rejected = Vec::new();
        for extension in extensions {
            if let Err(err) = registry.register(extension) {
                error!(error = %err, "Extension rejected");
                rejected.push(err);
            }
        }
        (registry, rejected)
    }

    /// Append an extension.
    pub fn register(&mut self, extension: Arc<dyn ProjectExtension>) -> Result<()> {
        let name = extension.name();
        if name.trim().is_empty() {
            return Err(Error::InvalidName {
                name: name.to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.contains(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        self.extensions.push(extension);
        Ok(())
    }

    /// Look up an extension by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ProjectExtension>> {
        self.extensions.iter().find(|ext| ext.name() == name)
    }

    /// Check if an extension is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProjectExtension>> {
        self.extensions.iter()
    }

    /// Extension names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.names())
            .finish()
    }
}
