//! Module identity and filesystem helpers for the project model loader.
//!
//! Every module of a multi-module build is identified by its directory.
//! [`ModulePath`] is that identity: separator- and case-normalized so the
//! same directory reported twice by the build tool maps to one key.

pub mod error;
pub mod path;
pub mod settings;

pub use error::{Error, Result};
pub use path::{ModulePath, PathCase};
pub use settings::{DEFAULT_SETTINGS_FILES, find_settings_file};
