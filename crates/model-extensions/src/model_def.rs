//! Declarations of the raw data an extension needs from the build tool

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BuildTarget;

/// Identifier of a kind of tooling model the build tool can produce.
///
/// Fetched tooling objects are keyed by this identifier. [`ToolingType::of`]
/// derives it from a Rust type so that producers and consumers agree on
/// the key without spelling it twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolingType(String);

impl ToolingType {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The tooling type whose objects are values of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An extension-specific query evaluated by the build tool for every module.
///
/// The loader does not interpret queries; it forwards them to the build
/// tool connection and hands the results back to the extension that asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfoQuery {
    pub id: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ProjectInfoQuery {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: serde_json::Value::Null,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }
}

/// Everything one extension wants fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelDef {
    pub tooling_types: Vec<ToolingType>,
    pub project_info_queries: Vec<ProjectInfoQuery>,
}

impl ModelDef {
    pub fn new(tooling_types: Vec<ToolingType>, project_info_queries: Vec<ProjectInfoQuery>) -> Self {
        Self {
            tooling_types,
            project_info_queries,
        }
    }

    pub fn tooling(tooling_types: Vec<ToolingType>) -> Self {
        Self::new(tooling_types, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.tooling_types.is_empty() && self.project_info_queries.is_empty()
    }

    /// Append the needs of `other` after these.
    pub fn merge(&mut self, other: ModelDef) {
        self.tooling_types.extend(other.tooling_types);
        self.project_info_queries.extend(other.project_info_queries);
    }
}

/// Source of a [`ModelDef`] for a given build target.
///
/// Returning `None` marks a misbehaving query; the loader logs it and
/// treats it as an empty definition.
pub trait ModelDefQuery: Send + Sync {
    fn model_def(&self, target: &BuildTarget) -> Option<ModelDef>;
}

impl<F> ModelDefQuery for F
where
    F: Fn(&BuildTarget) -> Option<ModelDef> + Send + Sync,
{
    fn model_def(&self, target: &BuildTarget) -> Option<ModelDef> {
        self(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct SourceSets;

    #[test]
    fn test_tooling_type_of_is_stable() {
        assert_eq!(ToolingType::of::<SourceSets>(), ToolingType::of::<SourceSets>());
        assert_ne!(ToolingType::of::<SourceSets>(), ToolingType::of::<String>());
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut def = ModelDef::tooling(vec![ToolingType::new("a")]);
        def.merge(ModelDef::new(
            vec![ToolingType::new("b")],
            vec![ProjectInfoQuery::new("deps")],
        ));
        assert_eq!(def.tooling_types, vec![ToolingType::new("a"), ToolingType::new("b")]);
        assert_eq!(def.project_info_queries.len(), 1);
        assert!(!def.is_empty());
        assert!(ModelDef::default().is_empty());
    }

    #[test]
    fn test_closure_is_a_query() {
        let query = |target: &BuildTarget| {
            target
                .tool_at_least(8, 0)
                .then(|| ModelDef::tooling(vec![ToolingType::new("modern")]))
        };
        let def = query.model_def(&BuildTarget::default()).unwrap();
        assert_eq!(def.tooling_types[0].as_str(), "modern");
    }
}
