//! Extension contracts for the project model loader.
//!
//! An extension (typically one per supported language or runtime) declares
//! which raw build-tool data it needs ([`ModelDef`]) and turns the fetched
//! data into its own typed model ([`ProjectExtension::parse_model`]).
//! Extensions are registered, in order, in an [`ExtensionRegistry`].

pub mod error;
pub mod extension;
pub mod lookup;
pub mod model_def;
pub mod module;
pub mod registry;
pub mod target;

pub use error::{Error, Result};
pub use extension::{ExtensionModel, ParsedModel, ProjectExtension, model_def_of};
pub use lookup::{ModelLoadResult, ModelLookup, RawModel};
pub use model_def::{ModelDef, ModelDefQuery, ProjectInfoQuery, ToolingType};
pub use module::{GenericProperties, ModuleTree, MultiModuleDef};
pub use registry::ExtensionRegistry;
pub use target::BuildTarget;
