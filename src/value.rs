use crate::convert::AnyConverter;
use crate::encode::encode;
use crate::error::WireError;
use crate::model::ModelInstance;
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use std::fmt;

/// A string-keyed object. Insertion order is preserved, so encoded models
/// keep their Field Catalog order; equality ignores order.
pub type Object = IndexMap<String, Value>;

/// A value tree, both before and after validation.
///
/// The first five variants form the wire subset of JSON that this crate
/// accepts: strings, integers, null, arrays and string-keyed objects.
/// Floating-point numbers and booleans are not part of the wire format and
/// are rejected at ingestion. `Model` and `Converter` only appear in
/// validated trees produced by the decoder (or assembled by trusted code).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Str(String),
    Array(Vec<Value>),
    Object(Object),
    Model(ModelInstance),
    Converter(Box<dyn AnyConverter>),
}

impl Value {
    /// Converts untrusted JSON into a wire value, rejecting anything
    /// outside the wire format with the offending dotted path.
    pub fn from_json(json: serde_json::Value) -> Result<Value, WireError> {
        from_json_at("", json)
    }

    /// Parses a JSON string and converts it into a wire value.
    pub fn from_json_str(source: &str) -> Result<Value, WireError> {
        let json: serde_json::Value =
            serde_json::from_str(source).map_err(|_| WireError::Unsupported {
                path: String::new(),
                kind: "unparseable JSON",
            })?;
        Value::from_json(json)
    }

    /// The runtime kind of this value, as used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Model(_) => "model instance",
            Value::Converter(_) => "converter instance",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Value::Model(instance) => Some(instance),
            _ => None,
        }
    }

    /// Borrows the wrapped converter as a concrete type, if this value
    /// holds a converter of exactly that type.
    pub fn downcast_converter<C: 'static>(&self) -> Option<&C> {
        match self {
            Value::Converter(converter) => converter.as_any().downcast_ref::<C>(),
            _ => None,
        }
    }
}

fn from_json_at(path: &str, json: serde_json::Value) -> Result<Value, WireError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(_) => Err(WireError::Unsupported {
            path: path.to_string(),
            kind: "boolean",
        }),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(n) => Ok(Value::Int(n)),
            None => Err(WireError::Unsupported {
                path: path.to_string(),
                kind: "non-integer number",
            }),
        },
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                out.push(from_json_at(&join(path, &index.to_string()), item)?);
            }
            Ok(Value::Array(out))
        }
        serde_json::Value::Object(map) => {
            let mut out = Object::with_capacity(map.len());
            for (key, item) in map {
                let item = from_json_at(&join(path, &key), item)?;
                out.insert(key, item);
            }
            Ok(Value::Object(out))
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => a == b,
            // Converters have no structural identity of their own; two are
            // equal when they are the same type and export the same wire value.
            (Value::Converter(a), Value::Converter(b)) => {
                a.as_any().type_id() == b.as_any().type_id() && a.export_wire() == b.export_wire()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {item}")?;
                }
                write!(f, "}}")
            }
            Value::Model(instance) => write!(f, "model '{}'", instance.schema().name),
            Value::Converter(converter) => write!(f, "converter '{}'", converter.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Object(map) => serializer.collect_map(map),
            // Models and converters serialize through the encoder, so the
            // output is keyed by wire key in Field Catalog order.
            Value::Model(_) | Value::Converter(_) => {
                let wire = encode(self).map_err(serde::ser::Error::custom)?;
                wire.serialize(serializer)
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<ModelInstance> for Value {
    fn from(instance: ModelInstance) -> Self {
        Value::Model(instance)
    }
}
