pub mod convert;
pub mod decode;
pub mod encode;
pub mod error;
pub mod model;
pub mod schema;
pub mod scope;
pub mod value;

pub use convert::Convert;
pub use decode::decode;
pub use encode::encode;
pub use error::{DecodeError, DefinitionError, EncodeError, WireError, WiremodelError};
pub use model::ModelInstance;
pub use schema::{FieldDescriptor, ModelSchema, PrimitiveKind, TypeDescriptor, UnknownKeys};
pub use scope::Scope;
pub use value::{Object, Value};
