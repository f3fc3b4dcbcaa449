use crate::error::{DecodeError, DefinitionError, WiremodelError};
use crate::model::ModelInstance;
use crate::schema::{ModelSchema, PrimitiveKind, TypeDescriptor, UnknownKeys};
use crate::scope::Scope;
use crate::value::{Object, Value};
use indexmap::IndexMap;
use log::{debug, trace};
use std::sync::Arc;

/// Recursively validates `raw` against `descriptor`, producing the decoded
/// value or the first failure, annotated with the dotted `path`.
///
/// `scope` supplies the names that [`TypeDescriptor::Deferred`] references
/// resolve against; models without forward references can pass
/// [`Scope::empty`]. The walk is fail-fast: the first element or field
/// that does not match aborts the whole decode. Union members are the one
/// exception — each is tried in declared order and only total exhaustion
/// propagates.
pub fn decode(
    path: &str,
    raw: Value,
    descriptor: &TypeDescriptor,
    scope: &Scope,
) -> Result<Value, WiremodelError> {
    match descriptor {
        TypeDescriptor::Primitive(kind) => match (kind, &raw) {
            (PrimitiveKind::Str, Value::Str(_)) | (PrimitiveKind::Int, Value::Int(_)) => Ok(raw),
            _ => Err(mismatch(path, descriptor, &raw)),
        },

        TypeDescriptor::List(elem) => match raw {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    out.push(decode(&join(path, &index.to_string()), item, elem, scope)?);
                }
                Ok(Value::Array(out))
            }
            other => Err(mismatch(path, descriptor, &other)),
        },

        TypeDescriptor::Map { key, value } => {
            // Definition-time check, raised before any data is examined.
            if *key != PrimitiveKind::Str {
                return Err(DefinitionError::NonStringMapKey {
                    context: path.to_string(),
                    found: key.name().to_string(),
                }
                .into());
            }
            match raw {
                Value::Object(map) => {
                    let mut out = Object::with_capacity(map.len());
                    for (k, item) in map {
                        let decoded = decode(&join(path, &k), item, value, scope)?;
                        out.insert(k, decoded);
                    }
                    Ok(Value::Object(out))
                }
                other => Err(mismatch(path, descriptor, &other)),
            }
        }

        TypeDescriptor::Literal(allowed) => {
            // Value equality already implies matching runtime type.
            if allowed.contains(&raw) {
                Ok(raw)
            } else {
                Err(DecodeError::LiteralMismatch {
                    path: path.to_string(),
                    allowed: render_literals(allowed),
                    actual: raw.to_string(),
                }
                .into())
            }
        }

        TypeDescriptor::Union(members) => {
            let mut attempts = Vec::with_capacity(members.len());
            for member in members {
                match decode(path, raw.clone(), member, scope) {
                    Ok(value) => {
                        trace!("union at '{path}' committed to member '{member}'");
                        return Ok(value);
                    }
                    Err(WiremodelError::Decode(err)) => {
                        trace!("union member '{member}' failed at '{path}': {err}");
                        attempts.push(err);
                    }
                    // Definition-time errors are never swallowed by union
                    // recovery.
                    Err(fatal) => return Err(fatal),
                }
            }
            Err(DecodeError::UnionExhausted {
                path: path.to_string(),
                expected: descriptor.to_string(),
                attempts,
            }
            .into())
        }

        TypeDescriptor::Model(schema) => construct_model(path, schema, raw, scope).map(Value::Model),

        TypeDescriptor::Converter(binding) => {
            // An existing instance of the same converter type passes
            // through unchanged, mirroring model idempotence.
            if let Value::Converter(existing) = &raw {
                if binding.matches(existing.as_ref()) {
                    return Ok(raw);
                }
            }
            let wire = decode(path, raw, &binding.wire_type(), scope)?;
            Ok(Value::Converter(binding.build(wire)))
        }

        TypeDescriptor::Deferred(name) => {
            let resolved = scope.resolve(name)?;
            decode(path, raw, resolved, scope)
        }
    }
}

impl ModelSchema {
    /// Validates `raw` against this schema and assembles an instance.
    ///
    /// `raw` must be a string-keyed object (or an already constructed
    /// instance of this very schema, which is returned unchanged). Any
    /// single field failure aborts construction; there are no partial
    /// models.
    pub fn construct(
        self: &Arc<Self>,
        raw: Value,
        scope: &Scope,
    ) -> Result<ModelInstance, WiremodelError> {
        construct_model("", self, raw, scope)
    }

    /// Constructs an instance from explicit field/value pairs, keyed by
    /// internal field name. The pairs are translated to the equivalent
    /// string-keyed object and sent through the same decode path, so
    /// renames, defaults and the unknown-key policy all apply. Values that
    /// are already decoded (nested instances, converters) pass through via
    /// idempotence.
    pub fn construct_fields<I, K>(
        self: &Arc<Self>,
        pairs: I,
        scope: &Scope,
    ) -> Result<ModelInstance, WiremodelError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut object = Object::new();
        for (name, value) in pairs {
            let name = name.into();
            let key = match self.field(&name) {
                Some(field) => field.wire_key.clone(),
                // Unknown names are left as-is for the unknown-key policy
                // to judge.
                None => name,
            };
            object.insert(key, value);
        }
        construct_model("", self, Value::Object(object), scope)
    }
}

pub(crate) fn construct_model(
    path: &str,
    schema: &Arc<ModelSchema>,
    raw: Value,
    scope: &Scope,
) -> Result<ModelInstance, WiremodelError> {
    let mut map = match raw {
        // Decoding an already decoded instance is a no-op.
        Value::Model(instance) if Arc::ptr_eq(instance.schema(), schema) => {
            return Ok(instance);
        }
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::TypeMismatch {
                path: path.to_string(),
                expected: format!("model '{}'", schema.name),
                actual: other.kind_name().to_string(),
            }
            .into())
        }
    };

    debug!("constructing model '{}' at '{path}'", schema.name);

    if schema.unknown_keys == UnknownKeys::Strict {
        let unknown: Vec<String> = map
            .keys()
            .filter(|key| schema.field_by_wire_key(key).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(DecodeError::UnexpectedKeys {
                path: path.to_string(),
                model: schema.name.clone(),
                keys: unknown,
            }
            .into());
        }
    }

    let mut fields = IndexMap::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let field_path = join(path, &field.wire_key);
        let decoded = match map.swap_remove(&field.wire_key) {
            Some(value) => decode(&field_path, value, &field.ty, scope)?,
            None => match &field.default {
                Some(default) => default.clone(),
                // No value and no default: the field only survives if its
                // type accepts the absent placeholder.
                None => decode(&field_path, Value::Null, &field.ty, scope).map_err(|err| {
                    match err {
                        WiremodelError::Decode(_) => WiremodelError::Decode(DecodeError::MissingKey {
                            path: field_path.clone(),
                        }),
                        fatal => fatal,
                    }
                })?,
            },
        };
        fields.insert(field.name.clone(), decoded);
    }

    Ok(ModelInstance::from_parts(Arc::clone(schema), fields))
}

fn mismatch(path: &str, descriptor: &TypeDescriptor, actual: &Value) -> WiremodelError {
    DecodeError::TypeMismatch {
        path: path.to_string(),
        expected: descriptor.to_string(),
        actual: actual.kind_name().to_string(),
    }
    .into()
}

fn render_literals(allowed: &[Value]) -> String {
    let rendered: Vec<String> = allowed.iter().map(Value::to_string).collect();
    rendered.join(" | ")
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
