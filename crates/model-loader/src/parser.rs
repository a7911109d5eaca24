//! The parse/merge pass over one fetch

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use model_extensions::{
    ExtensionModel, ExtensionRegistry, ModelLoadResult, ModelLookup, ProjectExtension, RawModel,
};
use tracing::{debug, error, warn};

use crate::{
    ExtensionModelCache, FetchedModels, FetchedProjectModels, GenericModelInfo, LoadIssue, LoadResult,
    ModelFetcher, ProjectModel,
};

/// Turns one [`FetchedModels`] bundle into a [`ProjectModel`] per module.
///
/// A parser is consumed by [`parse_model`](Self::parse_model); its
/// [`ExtensionModelCache`] lives exactly as long as that call.
pub struct ModelParser<'a> {
    registry: &'a ExtensionRegistry,
    fetcher: &'a ModelFetcher,
    cache: ExtensionModelCache,
    issues: Vec<LoadIssue>,
}

impl<'a> ModelParser<'a> {
    pub fn new(registry: &'a ExtensionRegistry, fetcher: &'a ModelFetcher) -> Self {
        Self {
            registry,
            fetcher,
            cache: ExtensionModelCache::new(),
            issues: Vec::new(),
        }
    }

    /// Parse every module of `fetched`, default module first.
    ///
    /// Each module is parsed once: other-module entries repeating an
    /// already seen directory are skipped. For every module the extensions
    /// run in registration order; a model an extension handed back for
    /// another module is used in place of invoking it for that module.
    /// Failures become [`LoadIssue`]s and never abort the pass.
    pub fn parse_model(mut self, fetched: FetchedModels) -> LoadResult {
        let FetchedModels {
            default_project,
            other_projects,
        } = fetched;

        let mut seen = HashSet::new();
        seen.insert(default_project.project_dir().clone());
        let mut others = Vec::with_capacity(other_projects.len());
        for other in other_projects {
            if seen.insert(other.project_dir().clone()) {
                others.push(other);
            } else {
                debug!(module = %other.project_dir(), "Skipping duplicate module entry");
            }
        }

        let modules: Vec<&FetchedProjectModels> = std::iter::once(&default_project).chain(&others).collect();
        let inputs = self.extension_inputs(&modules);

        let main_model = self.parse_module(&default_project, &inputs);
        let other_models = others
            .iter()
            .map(|models| self.parse_module(models, &inputs))
            .collect();

        LoadResult {
            main_model,
            other_models,
            issues: self.issues,
        }
    }

    /// One composite input per extension, covering every module.
    fn extension_inputs(
        &mut self,
        modules: &[&FetchedProjectModels],
    ) -> Vec<(Arc<dyn ProjectExtension>, ModelLoadResult)> {
        let Some(first) = modules.first() else {
            return Vec::new();
        };
        let main_module = first.project_dir().clone();

        let registry = self.registry;
        let mut inputs = Vec::with_capacity(registry.len());
        for extension in registry.iter() {
            let mut lookups = HashMap::with_capacity(modules.len());
            for &models in modules {
                let lookup = self.module_lookup(extension.name(), models);
                lookups.insert(models.project_dir().clone(), lookup);
            }
            inputs.push((
                Arc::clone(extension),
                ModelLoadResult::new(main_module.clone(), lookups),
            ));
        }
        inputs
    }

    /// What `extension` gets to see of one module.
    fn module_lookup(&mut self, extension: &str, models: &FetchedProjectModels) -> ModelLookup {
        let mut items: Vec<RawModel> = Vec::new();

        if let Some(results) = models.project_info_results.get(extension) {
            for result in results {
                if let Some(issue) = &result.issue {
                    warn!(
                        module = %models.project_dir(),
                        extension,
                        issue = %issue,
                        "Project info query reported an issue"
                    );
                    self.issues.push(LoadIssue::builder_error(models, extension, issue));
                }
                if let Some(value) = &result.result {
                    items.push(Arc::clone(value));
                }
            }
        }

        items.extend(self.fetcher.tooling_models_for(extension, models));
        items.push(Arc::new(models.project_def.main.generic.clone()));

        ModelLookup::new(items)
    }

    fn parse_module(
        &mut self,
        models: &FetchedProjectModels,
        inputs: &[(Arc<dyn ProjectExtension>, ModelLoadResult)],
    ) -> ProjectModel {
        let module = models.project_dir();
        if let Some(issue) = &models.issue {
            warn!(module = %module, issue = %issue.message, "Module was not fully loaded");
            self.issues.push(LoadIssue::module_load_error(models, issue));
        }

        let info = GenericModelInfo::new(models.project_def.clone(), self.fetcher.settings_file().cloned());
        let mut builder = ProjectModel::builder(info);
        for (extension, input) in inputs {
            let name = extension.name();
            let model = match self.cache.get(module, name) {
                Some(cached) => {
                    debug!(module = %module, extension = name, "Using model provided while parsing another module");
                    Some(Arc::clone(cached))
                }
                None => self.parse_extension(extension.as_ref(), input.with_main_module(module.clone())),
            };
            builder.set_model(name, model);
        }
        builder.build()
    }

    /// Run one extension for one module, isolating its failures.
    fn parse_extension(&mut self, extension: &dyn ProjectExtension, input: ModelLoadResult) -> Option<ExtensionModel> {
        let name = extension.name();
        let module = input.main_module().clone();

        match panic::catch_unwind(AssertUnwindSafe(|| extension.parse_model(&input))) {
            Ok(Ok(parsed)) => {
                let (main, others) = parsed.into_parts();
                for (other, model) in others {
                    if other != module {
                        self.cache.insert(other, name, model);
                    }
                }
                main
            }
            Ok(Err(err)) => {
                warn!(module = %module, extension = name, error = %err, "Extension failed to parse its model");
                self.issues.push(LoadIssue::extension_error(&module, name, err.to_string()));
                None
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(module = %module, extension = name, panic = %message, "Extension panicked while parsing its model");
                self.issues.push(LoadIssue::extension_error(&module, name, format!("panicked: {message}")));
                None
            }
        }
    }
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
