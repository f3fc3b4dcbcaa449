use crate::error::DefinitionError;
use crate::schema::TypeDescriptor;
use std::collections::HashMap;

/// An immutable snapshot of the type names visible where a model was
/// declared, used to resolve [`TypeDescriptor::Deferred`] references.
///
/// Resolution happens once per occurrence during decode rather than ahead
/// of time, so a name may refer back to a type that mentions it again; the
/// decoder only follows the reference as deep as the input value goes.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    types: HashMap<String, TypeDescriptor>,
}

impl Scope {
    /// A scope with no names; sufficient for models without forward
    /// references.
    pub fn empty() -> Self {
        Scope::default()
    }

    /// Adds a name to the snapshot, consuming and returning the scope.
    pub fn with(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.types.insert(name.into(), ty);
        self
    }

    /// Resolves a deferred name. An unknown name is a definition-time
    /// error: it means the declaration referenced something that does not
    /// exist, regardless of the data being decoded.
    pub fn resolve(&self, name: &str) -> Result<&TypeDescriptor, DefinitionError> {
        self.types
            .get(name)
            .ok_or_else(|| DefinitionError::UnresolvedName {
                name: name.to_string(),
            })
    }
}
