//! Sharing models loaded for one project with the others

use std::sync::Arc;

use model_loader::ProjectModel;
use tracing::debug;

use crate::{ListenerRegistration, Listeners};

/// Distributes models of sibling modules that came back with some other
/// project's fetch.
///
/// Opened projects subscribe; each picks up the models for its own
/// directory and installs them without a round trip of its own.
#[derive(Default)]
pub struct LoadedModelHub {
    listeners: Listeners<Arc<ProjectModel>>,
}

impl LoadedModelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `model` to every subscriber.
    pub fn publish(&self, model: Arc<ProjectModel>) {
        debug!(module = %model.project_dir(), subscribers = self.listeners.len(), "Publishing loaded model");
        self.listeners.fire(&model);
    }

    pub fn add_listener(
        &self,
        listener: impl Fn(&Arc<ProjectModel>) + Send + Sync + 'static,
    ) -> ListenerRegistration {
        self.listeners.add(listener)
    }

    pub fn subscribers(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for LoadedModelHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModelHub")
            .field("subscribers", &self.subscribers())
            .finish()
    }
}
