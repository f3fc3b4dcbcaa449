use crate::convert::{Convert, ConverterBinding};
use crate::error::DefinitionError;
use crate::value::Value;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// The primitive wire kinds. Booleans and floats are deliberately absent:
/// they are not part of the wire format, and a boolean is never accepted
/// where an integer is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Str,
    Int,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Str => "string",
            PrimitiveKind::Int => "integer",
        }
    }
}

/// A closed, data-only description of the shape of value expected at some
/// position. Consumed by the decoder; carries no behavior of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    List(Box<TypeDescriptor>),
    /// Keys are always strings on the wire; a descriptor declaring any
    /// other key kind is a definition-time error, caught before data.
    Map {
        key: PrimitiveKind,
        value: Box<TypeDescriptor>,
    },
    /// Accepts exactly the listed wire values, compared by type and value.
    Literal(Vec<Value>),
    /// Ordered candidates; the first member that fully decodes commits.
    Union(Vec<TypeDescriptor>),
    Model(Arc<ModelSchema>),
    Converter(ConverterBinding),
    /// A forward reference, resolved against the [`Scope`](crate::Scope)
    /// supplied to decode. This is what makes self-referential and
    /// mutually-recursive type graphs representable: recursion bottoms out
    /// as the decoder consumes finite input, not in the type graph itself.
    Deferred(String),
}

impl TypeDescriptor {
    pub fn string() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Str)
    }

    pub fn int() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Int)
    }

    pub fn list(elem: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(elem))
    }

    /// A string-keyed map of `value`.
    pub fn map(value: TypeDescriptor) -> Self {
        TypeDescriptor::Map {
            key: PrimitiveKind::Str,
            value: Box::new(value),
        }
    }

    /// A map with an explicit key kind. Anything other than `Str` is
    /// rejected when the owning schema is built.
    pub fn map_with_key(key: PrimitiveKind, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map {
            key,
            value: Box::new(value),
        }
    }

    pub fn literal<I>(allowed: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        TypeDescriptor::Literal(allowed.into_iter().map(Into::into).collect())
    }

    pub fn union<I: IntoIterator<Item = TypeDescriptor>>(members: I) -> Self {
        TypeDescriptor::Union(members.into_iter().collect())
    }

    pub fn model(schema: &Arc<ModelSchema>) -> Self {
        TypeDescriptor::Model(Arc::clone(schema))
    }

    pub fn converter<C: Convert + Clone>() -> Self {
        TypeDescriptor::Converter(ConverterBinding::of::<C>())
    }

    pub fn deferred(name: impl Into<String>) -> Self {
        TypeDescriptor::Deferred(name.into())
    }

    /// `ty` or null; the usual way to express an optional field.
    pub fn nullable(ty: TypeDescriptor) -> Self {
        TypeDescriptor::Union(vec![ty, TypeDescriptor::Literal(vec![Value::Null])])
    }

    /// Definition-time validation of this descriptor tree. `context` names
    /// the position being checked ("Model.field") for error reporting.
    /// Deferred names are left alone; they can only be checked against a
    /// scope, which is not available until decode.
    fn check(&self, context: &str) -> Result<(), DefinitionError> {
        match self {
            TypeDescriptor::Primitive(_) | TypeDescriptor::Deferred(_) => Ok(()),
            TypeDescriptor::List(elem) => elem.check(context),
            TypeDescriptor::Map { key, value } => {
                if *key != PrimitiveKind::Str {
                    return Err(DefinitionError::NonStringMapKey {
                        context: context.to_string(),
                        found: key.name().to_string(),
                    });
                }
                value.check(context)
            }
            TypeDescriptor::Literal(allowed) => {
                if allowed.is_empty() {
                    return Err(DefinitionError::EmptyLiteral {
                        context: context.to_string(),
                    });
                }
                for member in allowed {
                    if !matches!(member, Value::Null | Value::Int(_) | Value::Str(_)) {
                        return Err(DefinitionError::InvalidLiteral {
                            context: context.to_string(),
                            kind: member.kind_name().to_string(),
                        });
                    }
                }
                Ok(())
            }
            TypeDescriptor::Union(members) => {
                if members.is_empty() {
                    return Err(DefinitionError::EmptyUnion {
                        context: context.to_string(),
                    });
                }
                for member in members {
                    member.check(context)?;
                }
                Ok(())
            }
            // A referenced schema was already validated when it was built.
            TypeDescriptor::Model(_) => Ok(()),
            TypeDescriptor::Converter(binding) => binding.wire_type().check(context),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{}", kind.name()),
            TypeDescriptor::List(elem) => write!(f, "list of {elem}"),
            TypeDescriptor::Map { value, .. } => write!(f, "map of {value}"),
            TypeDescriptor::Literal(allowed) => {
                write!(f, "one of ")?;
                for (i, member) in allowed.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeDescriptor::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeDescriptor::Model(schema) => write!(f, "model '{}'", schema.name),
            TypeDescriptor::Converter(binding) => write!(f, "converter '{}'", binding.name()),
            TypeDescriptor::Deferred(name) => write!(f, "'{name}'"),
        }
    }
}

/// One declared field of a model: internal name, wire key, expected shape
/// and an optional default used when the wire key is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub wire_key: String,
    pub ty: TypeDescriptor,
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// A required field whose wire key equals its name.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let name = name.into();
        FieldDescriptor {
            wire_key: name.clone(),
            name,
            ty,
            default: None,
        }
    }

    /// Overrides the key this field uses in the JSON representation.
    pub fn renamed(mut self, wire_key: impl Into<String>) -> Self {
        self.wire_key = wire_key.into();
        self
    }

    /// Declares a fallback used when the wire key is absent from input,
    /// implicitly making the field optional.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Policy for input keys that map to no declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Reject the input, listing every unknown key.
    #[default]
    Strict,
    /// Silently drop unknown keys.
    Permissive,
}

/// The Field Catalog of one model type: its name, ordered field
/// descriptors and unknown-key policy.
///
/// A schema is immutable once built and is shared behind an [`Arc`], so
/// concurrent decodes read it freely. For a lazily-initialized schema that
/// is computed at most once, hold it in a `std::sync::OnceLock`:
///
/// ```
/// use std::sync::{Arc, OnceLock};
/// use wiremodel::{FieldDescriptor, ModelSchema, TypeDescriptor};
///
/// fn point() -> &'static Arc<ModelSchema> {
///     static SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
///     SCHEMA.get_or_init(|| {
///         ModelSchema::builder("Point")
///             .field(FieldDescriptor::new("x", TypeDescriptor::int()))
///             .field(FieldDescriptor::new("y", TypeDescriptor::int()))
///             .build()
///             .expect("static schema is well formed")
///     })
/// }
/// # assert_eq!(point().fields.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub unknown_keys: UnknownKeys,
}

impl ModelSchema {
    pub fn builder(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            name: name.into(),
            base_fields: Vec::new(),
            fields: Vec::new(),
            unknown_keys: UnknownKeys::default(),
        }
    }

    /// Looks a field up by its internal name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Looks a field up by its wire key.
    pub fn field_by_wire_key(&self, wire_key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.wire_key == wire_key)
    }
}

/// Builds and validates a [`ModelSchema`]. All definition-time checks run
/// in [`build`](ModelSchemaBuilder::build), so a malformed declaration
/// surfaces when the model is registered, never on first data.
pub struct ModelSchemaBuilder {
    name: String,
    base_fields: Vec<FieldDescriptor>,
    fields: Vec<FieldDescriptor>,
    unknown_keys: UnknownKeys,
}

impl ModelSchemaBuilder {
    /// Inherits every field of `base`, ordered before this model's own new
    /// fields, along with its unknown-key policy. A field redeclared here
    /// keeps the base position but uses the new descriptor.
    pub fn extends(mut self, base: &ModelSchema) -> Self {
        self.base_fields = base.fields.clone();
        self.unknown_keys = base.unknown_keys;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
        self
    }

    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn build(self) -> Result<Arc<ModelSchema>, DefinitionError> {
        let mut fields = self.base_fields;
        for field in self.fields {
            match fields.iter_mut().find(|f| f.name == field.name) {
                Some(inherited) => *inherited = field,
                None => fields.push(field),
            }
        }

        for (index, field) in fields.iter().enumerate() {
            let context = format!("{}.{}", self.name, field.name);
            field.ty.check(&context)?;
            if fields[..index].iter().any(|f| f.wire_key == field.wire_key) {
                return Err(DefinitionError::DuplicateWireKey {
                    model: self.name,
                    key: field.wire_key.clone(),
                });
            }
        }

        debug!("built schema '{}' with {} fields", self.name, fields.len());
        Ok(Arc::new(ModelSchema {
            name: self.name,
            fields,
            unknown_keys: self.unknown_keys,
        }))
    }
}
