//! Named lookup of line type material properties.

use indexmap::IndexMap;

use crate::config::LineType;
use crate::errors::MeshError;

/// Read-only view over the line types of a configuration.
#[derive(Clone, Copy, Debug)]
pub struct MaterialCatalog<'a> {
    /// Line types keyed by name.
    line_types: &'a IndexMap<String, LineType>,
}

impl<'a> MaterialCatalog<'a> {
    /// Wrap a name-keyed mapping of line types.
    #[must_use]
    pub fn new(line_types: &'a IndexMap<String, LineType>) -> Self {
        Self { line_types }
    }

    /// Find the line type called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownLineType`] when no line type has that name.
    pub fn lookup(&self, name: &str) -> Result<&'a LineType, MeshError> {
        self.line_types
            .get(name)
            .ok_or_else(|| MeshError::UnknownLineType(name.to_string()))
    }

    /// Return `true` when a line type called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.line_types.contains_key(name)
    }

    /// Names of all line types in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.line_types.keys().map(String::as_str)
    }

    /// Number of line types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.line_types.len()
    }

    /// Return `true` when no line types are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_types.is_empty()
    }
}
