//! Fetch, parse and merge of multi-module project models.
//!
//! One load is one round trip against the external build tool for the whole
//! multi-module build ([`ModelFetcher`]), followed by an in-memory pass that
//! builds, for every module and every registered extension, that extension's
//! model ([`ModelParser`]):
//!
//! ```text
//!   ExtensionRegistry ──needs──> ModelFetcher ──1 round trip──> BuildConnection
//!                                     │
//!                              FetchedModels (raw, every module)
//!                                     │
//!                                ModelParser ── ExtensionModelCache (per call)
//!                                     │
//!                 LoadResult { main_model, other_models, issues }
//! ```
//!
//! [`ModelLoader`] strings the two together.

pub mod cache;
pub mod connection;
pub mod error;
pub mod fetched;
pub mod fetcher;
pub mod issue;
pub mod loader;
pub mod model;
pub mod parser;

pub use cache::ExtensionModelCache;
pub use connection::{BuildConnection, FetchRequest};
pub use error::{Error, Result};
pub use fetched::{BuilderIssue, BuilderResult, FetchedModels, FetchedProjectModels, ModuleFetchIssue};
pub use fetcher::ModelFetcher;
pub use issue::{IssueKind, IssueSeverity, LoadIssue};
pub use loader::{LoadResult, ModelLoader};
pub use model::{GenericModelInfo, ProjectModel, ProjectModelBuilder};
pub use parser::{ModelParser, panic_message};
