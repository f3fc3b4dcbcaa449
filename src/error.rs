use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum WiremodelError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Encode(#[from] EncodeError),
}

/// An error in the shape of a declared type, independent of any input value.
///
/// These are raised when a schema is built, or on first decode for checks
/// that need a scope. They are never recovered from during union trials.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("map declared at {} uses {found} keys", path_label(.context))]
    #[diagnostic(
        code(definition::non_string_map_key),
        help("JSON object keys are always strings; declare the map key type as string.")
    )]
    NonStringMapKey { context: String, found: String },

    #[error("duplicate wire key '{key}' in model '{model}'")]
    #[diagnostic(
        code(definition::duplicate_wire_key),
        help("Every field of a model must map to a distinct wire key; check rename annotations.")
    )]
    DuplicateWireKey { model: String, key: String },

    #[error("union declared at {} has no members", path_label(.context))]
    #[diagnostic(
        code(definition::empty_union),
        help("A union must list at least one candidate type.")
    )]
    EmptyUnion { context: String },

    #[error("literal set declared at {} is empty", path_label(.context))]
    #[diagnostic(code(definition::empty_literal))]
    EmptyLiteral { context: String },

    #[error("literal set declared at {} contains a {kind} value", path_label(.context))]
    #[diagnostic(
        code(definition::invalid_literal),
        help("Literal members must be plain wire values: strings, integers or null.")
    )]
    InvalidLiteral { context: String, kind: String },

    #[error("unresolved type name '{name}'")]
    #[diagnostic(
        code(definition::unresolved_name),
        help("Deferred names are looked up in the scope supplied to decode; add the name to that scope.")
    )]
    UnresolvedName { name: String },
}

/// A data-dependent decode failure. Always carries the dotted path of the
/// value that failed, rooted at the empty string.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DecodeError {
    #[error("expected {expected} at {}, but got {actual}", path_label(.path))]
    #[diagnostic(code(decode::type_mismatch))]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("missing required key '{path}'")]
    #[diagnostic(
        code(decode::missing_key),
        help("The field has no default and its type does not accept null.")
    )]
    MissingKey { path: String },

    #[error("model '{model}' received unexpected keys: {}", .keys.join(", "))]
    #[diagnostic(
        code(decode::unexpected_keys),
        help("Rename the offending keys, declare matching fields, or build the schema with UnknownKeys::Permissive.")
    )]
    UnexpectedKeys {
        path: String,
        model: String,
        keys: Vec<String>,
    },

    #[error("value at {} is not one of the allowed literals ({allowed})", path_label(.path))]
    #[diagnostic(code(decode::literal_mismatch))]
    LiteralMismatch {
        path: String,
        allowed: String,
        actual: String,
    },

    #[error("value at {} matched no member of {expected}", path_label(.path))]
    #[diagnostic(
        code(decode::union_exhausted),
        help("Each union member was tried in declared order; the related errors list one failure per member.")
    )]
    UnionExhausted {
        path: String,
        expected: String,
        #[related]
        attempts: Vec<DecodeError>,
    },
}

impl DecodeError {
    /// The dotted path of the value this failure refers to.
    pub fn path(&self) -> &str {
        match self {
            DecodeError::TypeMismatch { path, .. }
            | DecodeError::MissingKey { path }
            | DecodeError::UnexpectedKeys { path, .. }
            | DecodeError::LiteralMismatch { path, .. }
            | DecodeError::UnionExhausted { path, .. } => path,
        }
    }
}

/// Failures while turning a validated tree back into a wire value.
///
/// Decoded trees always encode; the only way to reach this is an instance
/// assembled through the trusted escape hatch that is missing a field.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum EncodeError {
    #[error("model '{model}' has no value for declared field '{field}'")]
    #[diagnostic(
        code(encode::missing_field),
        help("Instances built through decode carry every declared field; direct assignment must fill all fields before export.")
    )]
    MissingField { model: String, field: String },
}

/// Rejection of JSON input that falls outside the wire format.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum WireError {
    #[error("unsupported JSON value at {}: {kind}", path_label(.path))]
    #[diagnostic(
        code(wire::unsupported),
        help("The wire format is restricted to strings, integers, null, arrays and string-keyed objects.")
    )]
    Unsupported { path: String, kind: &'static str },
}

fn path_label(path: &str) -> String {
    if path.is_empty() {
        "the input root".to_string()
    } else {
        format!("'{path}'")
    }
}
