//! Shared test fakes for the project model loader workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`connection`]: [`FakeConnection`], a scripted and optionally gated build tool
//! - [`extension`]: [`FnExtension`], a closure-backed extension that counts its calls
//! - [`build`]: [`TestBuild`], a builder for fetched multi-module bundles

pub mod build;
pub mod connection;
pub mod extension;

pub use build::TestBuild;
pub use connection::FakeConnection;
pub use extension::FnExtension;
