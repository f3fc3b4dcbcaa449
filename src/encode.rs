use crate::error::EncodeError;
use crate::model::encode_model;
use crate::value::{Object, Value};

/// Recursively encodes a validated value tree into a wire-only value,
/// dispatching on the value's own runtime shape.
///
/// This is the mirror image of the decoder's dispatch table: model
/// instances become objects keyed by wire key in Field Catalog order,
/// converters are asked to export themselves, containers recurse with
/// order and keys preserved verbatim, primitives pass through. The closed
/// [`Value`] enum guarantees total coverage; the only possible failure is
/// a hand-assembled model instance missing one of its declared fields.
pub fn encode(value: &Value) -> Result<Value, EncodeError> {
    match value {
        Value::Null | Value::Int(_) | Value::Str(_) => Ok(value.clone()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(encode(item)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = Object::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), encode(item)?);
            }
            Ok(Value::Object(out))
        }
        Value::Model(instance) => encode_model(instance),
        // A converter's export may itself contain nested models, so the
        // result is encoded again.
        Value::Converter(converter) => encode(&converter.export_wire()),
    }
}
