use crate::schema::TypeDescriptor;
use crate::value::Value;
use std::any::{Any, TypeId};
use std::fmt;

/// The converter capability: a type that wraps one specific wire shape in
/// an internal representation of its own choosing.
///
/// `wire_type` statically declares the shape the converter accepts; the
/// decoder validates input against it before calling `build`, so `build`
/// always receives a value of exactly that shape. Implementations are
/// encouraged (but not required) to keep `export(build(x)) == x`.
///
/// ```
/// use wiremodel::{Convert, TypeDescriptor, Value};
///
/// #[derive(Debug, Clone)]
/// struct Offset(i64);
///
/// impl Convert for Offset {
///     fn wire_type() -> TypeDescriptor {
///         TypeDescriptor::int()
///     }
///     fn build(wire: Value) -> Self {
///         Offset(wire.as_int().unwrap() + 10)
///     }
///     fn export(&self) -> Value {
///         Value::Int(self.0 - 10)
///     }
/// }
/// ```
pub trait Convert: Sized + Send + Sync + 'static {
    /// The wire shape this converter accepts and produces.
    fn wire_type() -> TypeDescriptor;

    /// Builds the internal representation from an already validated wire value.
    fn build(wire: Value) -> Self;

    /// Exports the internal representation back to its wire shape.
    fn export(&self) -> Value;
}

/// Object-safe runtime face of a converter, so instances can live inside
/// a [`Value`]. Implemented for every `Convert + Clone` type.
pub trait AnyConverter: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn export_wire(&self) -> Value;
    fn clone_box(&self) -> Box<dyn AnyConverter>;
    fn as_any(&self) -> &dyn Any;
}

impl<C> AnyConverter for C
where
    C: Convert + Clone + Any,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn export_wire(&self) -> Value {
        self.export()
    }

    fn clone_box(&self) -> Box<dyn AnyConverter> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for Box<dyn AnyConverter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn AnyConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<converter {}>", self.type_name())
    }
}

/// A type-erased handle to a converter type, stored inside
/// [`TypeDescriptor::Converter`]. Captures the wire type and build entry
/// point as plain function pointers; descriptors stay data-only.
#[derive(Clone, Copy)]
pub struct ConverterBinding {
    name: &'static str,
    type_id: TypeId,
    wire: fn() -> TypeDescriptor,
    build: fn(Value) -> Box<dyn AnyConverter>,
}

impl ConverterBinding {
    pub fn of<C: Convert + Clone>() -> Self {
        ConverterBinding {
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
            wire: C::wire_type,
            build: |wire| Box::new(C::build(wire)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn wire_type(&self) -> TypeDescriptor {
        (self.wire)()
    }

    pub(crate) fn build(&self, wire: Value) -> Box<dyn AnyConverter> {
        (self.build)(wire)
    }

    /// True when `converter` is an instance of the bound type.
    pub(crate) fn matches(&self, converter: &dyn AnyConverter) -> bool {
        converter.as_any().type_id() == self.type_id
    }
}

impl PartialEq for ConverterBinding {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for ConverterBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterBinding")
            .field("name", &self.name)
            .finish()
    }
}
