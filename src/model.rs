use crate::encode::encode;
use crate::error::EncodeError;
use crate::schema::ModelSchema;
use crate::value::Value;
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;

/// A validated instance of a model: a record mapping each declared field
/// name to its decoded value, in Field Catalog order.
///
/// Instances are normally produced by [`ModelSchema::construct`]. Trusted
/// code may also assemble or mutate one directly through
/// [`new_unchecked`](ModelInstance::new_unchecked) and
/// [`set`](ModelInstance::set), bypassing validation; exporting such an
/// instance fails if a declared field was never filled in.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    schema: Arc<ModelSchema>,
    fields: IndexMap<String, Value>,
}

impl ModelInstance {
    /// The trusted escape hatch: an empty instance of `schema` with no
    /// validation applied to anything later assigned into it.
    pub fn new_unchecked(schema: &Arc<ModelSchema>) -> Self {
        ModelInstance {
            schema: Arc::clone(schema),
            fields: IndexMap::new(),
        }
    }

    pub(crate) fn from_parts(schema: Arc<ModelSchema>, fields: IndexMap<String, Value>) -> Self {
        ModelInstance { schema, fields }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// The decoded value of a field, by internal field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Assigns a field value directly, without validation.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Encodes this instance back into a wire value: a string-keyed object
    /// with one entry per field, keyed by wire key, in Field Catalog order.
    pub fn export(&self) -> Result<Value, EncodeError> {
        encode_model(self)
    }

    /// Serializes the exported wire value as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if the instance cannot be exported or
    /// serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the exported wire value as YAML.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if the instance cannot be exported or
    /// serialized.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

pub(crate) fn encode_model(instance: &ModelInstance) -> Result<Value, EncodeError> {
    let schema = instance.schema();
    let mut out = crate::value::Object::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let value = instance
            .get(&field.name)
            .ok_or_else(|| EncodeError::MissingField {
                model: schema.name.clone(),
                field: field.name.clone(),
            })?;
        out.insert(field.wire_key.clone(), encode(value)?);
    }
    Ok(Value::Object(out))
}

impl PartialEq for ModelInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.fields == other.fields
    }
}

impl Serialize for ModelInstance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = self.export().map_err(serde::ser::Error::custom)?;
        wire.serialize(serializer)
    }
}
