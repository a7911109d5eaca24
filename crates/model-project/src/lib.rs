//! Per-project coordination of model loading.
//!
//! A [`Project`] owns the currently visible [`ProjectModel`](model_loader::ProjectModel)
//! of one project directory. It makes sure at most one fetch runs at a time,
//! installs results and notifies listeners in order on a single
//! [`SerialContext`], lets callers block until the first load finished
//! ([`WaitableSignal`]) and holds back requests made before its extensions
//! are attached ([`DeferredInitQueue`]).
//!
//! ```text
//!  request_load ──> DeferredInitQueue ──> single flight ──> ModelSource (tokio)
//!                                                              │
//!        listeners <── install <── SerialContext <─────────────┘
//!                         │
//!                  LoadedModelHub ──> other opened projects
//! ```

pub mod config;
pub mod deferred;
pub mod diagnostics;
pub mod error;
pub mod hub;
pub mod listeners;
pub mod logging;
pub mod project;
pub mod serial;
pub mod signal;
pub mod source;

pub use config::{DEFAULT_SERIAL_THREAD_NAME, LoaderConfig, LoaderSection};
pub use deferred::DeferredInitQueue;
pub use diagnostics::{DiagnosticKind, ProjectDiagnostic};
pub use error::{Error, Result};
pub use hub::LoadedModelHub;
pub use listeners::{ListenerRegistration, Listeners};
pub use project::{LoadState, Project, ProjectBuilder};
pub use serial::{SerialContext, SerialWorker, Task};
pub use signal::WaitableSignal;
pub use source::{ConnectionModelSource, ModelSource};
