//! The per-project load coordinator

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

use model_extensions::{ExtensionRegistry, ProjectExtension};
use model_fs::ModulePath;
use model_loader::{BuildConnection, LoadIssue, LoadResult, ProjectModel, panic_message};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::diagnostics::Diagnostics;
use crate::{
    ConnectionModelSource, DeferredInitQueue, Error, ListenerRegistration, Listeners, LoadedModelHub,
    LoaderConfig, ModelSource, ProjectDiagnostic, Result, SerialContext, SerialWorker, WaitableSignal,
};

/// Where a project is in its load cycle.
///
/// `Installed` and `FailedRetained` are resting states; either may go back
/// to `LoadRequested` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing was requested yet.
    Uninitialized,
    /// A load was requested and waits for initialization or a fetch slot.
    LoadRequested,
    /// A fetch is running.
    Fetching,
    /// The last fetch succeeded and its model is current.
    Installed,
    /// The last fetch failed; the previous model is still current.
    FailedRetained,
}

#[derive(Debug, Default)]
struct Flight {
    in_flight: bool,
    reload_pending: bool,
}

struct ProjectInner {
    project_dir: ModulePath,
    /// Thread running [`ProjectBuilder::build`].
    builder_thread: ThreadId,
    registry: OnceLock<Arc<ExtensionRegistry>>,
    source: Arc<dyn ModelSource>,
    runtime: Handle,
    serial: Arc<dyn SerialContext>,
    hub: Option<Arc<LoadedModelHub>>,
    hub_registration: Mutex<Option<ListenerRegistration>>,

    current: RwLock<Arc<ProjectModel>>,
    first_load: WaitableSignal,
    deferred: DeferredInitQueue,
    load_started: AtomicBool,
    flight: Mutex<Flight>,
    state: Mutex<LoadState>,

    listeners: Listeners<()>,
    diagnostics: Diagnostics,
    issues: Mutex<Vec<LoadIssue>>,
}

/// A project directory and the model of the build it belongs to.
///
/// Cheap to clone; clones share one coordinator. At most one fetch runs at
/// a time. Installing models and notifying listeners happen on the
/// project's serial context, in order.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use model_project::Project;
/// # fn run(connection: Arc<dyn model_loader::BuildConnection>) -> model_project::Result<()> {
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let project = Project::for_directory("/work/app")?
///     .runtime(runtime.handle().clone())
///     .connection(connection)
///     .build(|_project| Vec::new())?;
///
/// if project.await_first_load(Some(Duration::from_secs(30)))? {
///     println!("{}", project.current_model().display_name());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Project {
    inner: Arc<ProjectInner>,
}

impl Project {
    pub fn builder(project_dir: ModulePath) -> ProjectBuilder {
        ProjectBuilder::new(project_dir)
    }

    /// A builder for the existing directory at `path`, canonicalized.
    pub fn for_directory(path: impl AsRef<Path>) -> Result<ProjectBuilder> {
        Ok(ProjectBuilder::new(ModulePath::canonicalize(path)?))
    }

    pub fn project_dir(&self) -> &ModulePath {
        &self.inner.project_dir
    }

    /// Schedule a load.
    ///
    /// Without `force` only the very first request does anything. With it a
    /// new fetch is started, or queued behind the running one; any number
    /// of forced requests during one fetch add a single follow-up fetch.
    /// Requests made while the project is being built run once it is.
    pub fn request_load(&self, force: bool) {
        let started = self.inner.load_started.swap(true, Ordering::AcqRel);
        if started && !force {
            debug!(project = %self.inner.project_dir, "Load already started; request ignored");
            return;
        }

        self.inner.mark_requested();
        let inner = Arc::clone(&self.inner);
        self.inner.deferred.enqueue_or_run(move || inner.start_load());
    }

    /// Forced [`request_load`](Self::request_load).
    pub fn reload(&self) {
        self.request_load(true);
    }

    /// The installed model; an empty model until the first load succeeds.
    pub fn current_model(&self) -> Arc<ProjectModel> {
        Arc::clone(&self.inner.current.read())
    }

    /// Start loading if nothing was requested yet, then block until the
    /// first load finished (successfully or not) or `timeout` elapsed.
    ///
    /// Returns whether the first load finished. Fails without blocking when
    /// called from the project's serial context, or from the thread still
    /// building the project; neither wait could ever end. Other threads
    /// may wait during the build: their request runs once it completes.
    pub fn await_first_load(&self, timeout: Option<Duration>) -> Result<bool> {
        if self.inner.serial.is_current() {
            return Err(Error::WaitOnSerialContext);
        }
        if !self.is_initialized() && thread::current().id() == self.inner.builder_thread {
            return Err(Error::NotInitialized);
        }

        self.request_load(false);
        Ok(match timeout {
            Some(timeout) => self.inner.first_load.wait_timeout(timeout),
            None => {
                self.inner.first_load.wait();
                true
            }
        })
    }

    /// Whether a load finished at least once.
    pub fn has_loaded(&self) -> bool {
        self.inner.first_load.is_signaled()
    }

    /// Call `listener` on the serial context every time a new model is
    /// installed. It receives nothing; read [`current_model`](Self::current_model).
    pub fn on_model_changed(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerRegistration {
        self.inner.listeners.add(move |_: &()| listener())
    }

    /// Why the most recent load failed, if it did.
    pub fn load_error(&self) -> Option<ProjectDiagnostic> {
        self.inner.diagnostics.load_error()
    }

    /// Problems with how the project was set up, such as rejected
    /// extensions.
    pub fn configuration_errors(&self) -> Vec<ProjectDiagnostic> {
        self.inner.diagnostics.configuration_errors()
    }

    /// Issues reported by the most recent successful load.
    pub fn load_issues(&self) -> Vec<LoadIssue> {
        self.inner.issues.lock().clone()
    }

    pub fn load_state(&self) -> LoadState {
        *self.inner.state.lock()
    }

    /// The project's extensions; empty while the project is being built.
    pub fn extensions(&self) -> Arc<ExtensionRegistry> {
        self.inner.registry()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.deferred.is_closed()
    }

    /// Run `op` once the project has its extensions: later if it is still
    /// being built, right away on this thread otherwise.
    pub fn when_initialized(&self, op: impl FnOnce() + Send + 'static) {
        self.inner.deferred.enqueue_or_run(op);
    }

    /// The project was opened: receive models loaded by other projects of
    /// the same build, and reload.
    pub fn opened(&self) {
        if let Some(hub) = &self.inner.hub {
            let mut registration = self.inner.hub_registration.lock();
            if registration.is_none() {
                let weak = Arc::downgrade(&self.inner);
                *registration = Some(hub.add_listener(move |model| {
                    if let Some(inner) = weak.upgrade() {
                        inner.offer_published(model);
                    }
                }));
            }
        }
        self.reload();
    }

    /// The project was closed: stop receiving models from other projects.
    pub fn closed(&self) {
        if let Some(registration) = self.inner.hub_registration.lock().take() {
            registration.unregister();
        }
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("project_dir", &self.inner.project_dir)
            .field("state", &self.load_state())
            .field("extensions", &self.inner.registry().names())
            .finish()
    }
}

impl ProjectInner {
    fn registry(&self) -> Arc<ExtensionRegistry> {
        self.registry.get().cloned().unwrap_or_default()
    }

    fn set_state(&self, state: LoadState) {
        *self.state.lock() = state;
    }

    fn mark_requested(&self) {
        let mut state = self.state.lock();
        if *state != LoadState::Fetching {
            *state = LoadState::LoadRequested;
        }
    }

    fn start_load(self: &Arc<Self>) {
        {
            let mut flight = self.flight.lock();
            if flight.in_flight {
                debug!(project = %self.project_dir, "Fetch in flight; reload queued behind it");
                flight.reload_pending = true;
                return;
            }
            flight.in_flight = true;
        }
        self.spawn_fetch();
    }

    fn spawn_fetch(self: &Arc<Self>) {
        self.set_state(LoadState::Fetching);

        let source = Arc::clone(&self.source);
        let registry = self.registry();
        let project_dir = self.project_dir.clone();
        let fetch = self
            .runtime
            .spawn(async move { source.load(&project_dir, &registry).await });

        let completion = FetchCompletion {
            inner: Some(Arc::clone(self)),
        };
        self.runtime.spawn(async move {
            let outcome = match fetch.await {
                Ok(result) => result.map_err(Error::from),
                Err(err) if err.is_panic() => Err(Error::fetch_aborted(format!(
                    "model source panicked: {}",
                    panic_message(err.into_panic().as_ref())
                ))),
                Err(err) => Err(Error::fetch_aborted(err.to_string())),
            };
            completion.complete(outcome);
        });
    }

    fn post_completion(self: Arc<Self>, outcome: Result<LoadResult>) {
        let serial = Arc::clone(&self.serial);
        serial.execute(Box::new(move || self.complete_load(outcome)));
    }

    /// Runs on the serial context.
    fn complete_load(self: &Arc<Self>, outcome: Result<LoadResult>) {
        match outcome {
            Ok(LoadResult {
                main_model,
                other_models,
                issues,
            }) => {
                for issue in &issues {
                    warn!(project = %self.project_dir, issue = %issue, "Load issue");
                }
                *self.issues.lock() = issues;

                let (own, others): (Vec<_>, Vec<_>) = std::iter::once(main_model)
                    .chain(other_models)
                    .partition(|model| model.project_dir() == &self.project_dir);
                match own.into_iter().next() {
                    Some(model) => {
                        self.diagnostics.clear_load_error();
                        self.install(Arc::new(model));
                        self.set_state(LoadState::Installed);
                    }
                    None => {
                        error!(project = %self.project_dir, "Build tool returned no model for the project");
                        self.diagnostics.set_load_error(ProjectDiagnostic::load_failed(format!(
                            "build tool returned no model for {}",
                            self.project_dir
                        )));
                        self.set_state(LoadState::FailedRetained);
                    }
                }

                if let Some(hub) = &self.hub {
                    for model in others {
                        hub.publish(Arc::new(model));
                    }
                }
            }
            Err(err) => {
                error!(project = %self.project_dir, error = %err, "Failed to load project models");
                self.diagnostics
                    .set_load_error(ProjectDiagnostic::load_failed(err.to_string()));
                self.set_state(LoadState::FailedRetained);
            }
        }

        self.first_load.signal();
        self.finish_flight();
    }

    fn finish_flight(self: &Arc<Self>) {
        let again = {
            let mut flight = self.flight.lock();
            if flight.reload_pending {
                flight.reload_pending = false;
                true
            } else {
                flight.in_flight = false;
                false
            }
        };
        if again {
            self.spawn_fetch();
        }
    }

    /// Runs on any thread, typically another project's serial context.
    fn offer_published(self: &Arc<Self>, model: &Arc<ProjectModel>) {
        if model.project_dir() != &self.project_dir {
            return;
        }
        let inner = Arc::clone(self);
        let model = Arc::clone(model);
        self.serial.execute(Box::new(move || inner.install_published(model)));
    }

    /// Runs on the serial context.
    fn install_published(&self, model: Arc<ProjectModel>) {
        debug!(project = %self.project_dir, "Installing model loaded by another project");
        self.diagnostics.clear_load_error();
        self.install(model);
        if !self.flight.lock().in_flight {
            self.set_state(LoadState::Installed);
        }
        self.first_load.signal();
    }

    /// Runs on the serial context.
    fn install(&self, model: Arc<ProjectModel>) {
        let previous = std::mem::replace(&mut *self.current.write(), Arc::clone(&model));
        if Arc::ptr_eq(&previous, &model) {
            return;
        }
        info!(
            project = %self.project_dir,
            extensions = model.extension_names().len(),
            "Installed project model"
        );

        for extension in self.registry().iter() {
            let cell = model.model_of(extension.name());
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| extension.activate(cell))) {
                error!(
                    project = %self.project_dir,
                    extension = extension.name(),
                    panic = %panic_message(payload.as_ref()),
                    "Extension panicked while activating"
                );
            }
        }

        self.listeners.fire(&());
    }
}

/// Hands the outcome of one fetch to the serial context exactly once.
///
/// Dropped without [`complete`](Self::complete), as happens to tasks of a
/// runtime that shuts down, it reports the fetch as aborted.
struct FetchCompletion {
    inner: Option<Arc<ProjectInner>>,
}

impl FetchCompletion {
    fn complete(mut self, outcome: Result<LoadResult>) {
        if let Some(inner) = self.inner.take() {
            inner.post_completion(outcome);
        }
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            warn!(project = %inner.project_dir, "Fetch task dropped before completing");
            inner.post_completion(Err(Error::fetch_aborted(
                "fetch task dropped before completing; the runtime is shutting down",
            )));
        }
    }
}

/// Configures and creates a [`Project`].
pub struct ProjectBuilder {
    project_dir: ModulePath,
    source: Option<Arc<dyn ModelSource>>,
    connection: Option<Arc<dyn BuildConnection>>,
    runtime: Option<Handle>,
    serial: Option<Arc<dyn SerialContext>>,
    hub: Option<Arc<LoadedModelHub>>,
    config: LoaderConfig,
}

impl ProjectBuilder {
    pub fn new(project_dir: ModulePath) -> Self {
        Self {
            project_dir,
            source: None,
            connection: None,
            runtime: None,
            serial: None,
            hub: None,
            config: LoaderConfig::default(),
        }
    }

    /// Load models from `source`. Takes precedence over
    /// [`connection`](Self::connection).
    pub fn source(mut self, source: Arc<dyn ModelSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Load models through a [`ModelLoader`](model_loader::ModelLoader)
    /// configured by [`config`](Self::config), against `connection`.
    pub fn connection(mut self, connection: Arc<dyn BuildConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Run fetches on `runtime` instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Use `serial` instead of a dedicated [`SerialWorker`].
    pub fn serial(mut self, serial: Arc<dyn SerialContext>) -> Self {
        self.serial = Some(serial);
        self
    }

    /// Share models with the other projects attached to `hub`.
    pub fn hub(mut self, hub: Arc<LoadedModelHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the project, then attach the extensions `extensions` returns.
    ///
    /// `extensions` receives the project under construction: anything it
    /// (or another thread) asks of the project that needs the extensions is
    /// deferred until they are attached. Extensions with an empty or
    /// duplicate name are dropped and reported in
    /// [`Project::configuration_errors`]; the first of a name wins.
    pub fn build<F>(self, extensions: F) -> Result<Project>
    where
        F: FnOnce(&Project) -> Vec<Arc<dyn ProjectExtension>>,
    {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };
        let source = match (self.source, self.connection) {
            (Some(source), _) => source,
            (None, Some(connection)) => {
                Arc::new(ConnectionModelSource::new(self.config.model_loader(), connection)) as Arc<dyn ModelSource>
            }
            (None, None) => return Err(Error::config("no model source or build tool connection given")),
        };
        let serial = match self.serial {
            Some(serial) => serial,
            None => Arc::new(SerialWorker::new(self.config.loader.serial_thread_name.clone())?) as Arc<dyn SerialContext>,
        };

        let empty = Arc::new(ProjectModel::empty(&self.project_dir));
        let project = Project {
            inner: Arc::new(ProjectInner {
                project_dir: self.project_dir,
                builder_thread: thread::current().id(),
                registry: OnceLock::new(),
                source,
                runtime,
                serial,
                hub: self.hub,
                hub_registration: Mutex::new(None),
                current: RwLock::new(empty),
                first_load: WaitableSignal::new(),
                deferred: DeferredInitQueue::new(),
                load_started: AtomicBool::new(false),
                flight: Mutex::new(Flight::default()),
                state: Mutex::new(LoadState::Uninitialized),
                listeners: Listeners::new(),
                diagnostics: Diagnostics::default(),
                issues: Mutex::new(Vec::new()),
            }),
        };

        let (registry, rejected) = ExtensionRegistry::from_extensions(extensions(&project));
        for err in rejected {
            project
                .inner
                .diagnostics
                .add_configuration_error(ProjectDiagnostic::configuration(err.to_string()));
        }
        let stored = project.inner.registry.set(Arc::new(registry)).is_ok();
        debug_assert!(stored, "extensions are attached once");

        let replayed = project.inner.deferred.drain();
        let registry = project.inner.registry();
        debug!(
            project = %project.inner.project_dir,
            extensions = ?registry.names(),
            replayed,
            "Project initialized"
        );
        Ok(project)
    }
}
