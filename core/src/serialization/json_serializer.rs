//! The serializer contract.
//!
//! A [`JsonSerializer`] converts values of exactly one type to and from a JSON
//! tree. `serialize` and `deserialize` form a matched pair: for any value `v`
//! and context `c`, `deserialize(t, &serialize(&v, c)?, c)` yields a value
//! equal to `v` when `t` is the serializer's declared descriptor. The JSON
//! shape is also what the peer's codec expects, so it must not change between
//! releases without a matching change on the other side.

use crate::serialization::{ConnectionContext, SerializerError, TypeDescriptor};
use serde_json::Value;
use std::sync::Arc;

/// Converts values of one type to and from a JSON tree.
pub trait JsonSerializer<T>: Send + Sync {
  /// The type this serializer handles. Registration keys on its signature.
  fn type_descriptor(&self) -> TypeDescriptor;

  /// Encodes `value` without mutating it.
  ///
  /// # Errors
  ///
  /// [`SerializerError::UnsupportedValue`] when the value's runtime shape has
  /// no encoding.
  fn serialize(&self, value: &T, context: &mut ConnectionContext) -> Result<Value, SerializerError>;

  /// Reconstructs a value from JSON produced by a compatible `serialize`.
  ///
  /// # Errors
  ///
  /// [`SerializerError::UnknownType`] when `type_descriptor` is not the declared
  /// type, [`SerializerError::MalformedPayload`] when `json` has the wrong shape.
  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<T, SerializerError>;

  fn check_type(&self, type_descriptor: &TypeDescriptor) -> Result<(), SerializerError> {
    let declared = self.type_descriptor();
    if declared == *type_descriptor {
      Ok(())
    } else {
      Err(SerializerError::unknown_type(
        declared.signature(),
        type_descriptor.signature(),
      ))
    }
  }
}

impl<T, S> JsonSerializer<T> for Arc<S>
where
  S: JsonSerializer<T> + ?Sized,
{
  fn type_descriptor(&self) -> TypeDescriptor {
    self.as_ref().type_descriptor()
  }

  fn serialize(&self, value: &T, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    self.as_ref().serialize(value, context)
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<T, SerializerError> {
    self.as_ref().deserialize(type_descriptor, json, context)
  }
}

/// A Rust type with a canonical descriptor and default serializer.
///
/// Implemented for scalars, strings, collections, `Option`, `Arc`,
/// [`crate::ConnectorRef`], and by `#[derive(JsonBean)]` / `#[derive(JsonEnum)]`.
pub trait JsonType: Sized + Send + Sync + 'static {
  type Serializer: JsonSerializer<Self> + Default + 'static;

  fn type_descriptor() -> TypeDescriptor {
    Self::Serializer::default().type_descriptor()
  }

  fn json_serializer() -> Self::Serializer {
    Self::Serializer::default()
  }

  /// Value a bean property of this type takes when absent from the payload.
  /// `None` means the property is required.
  fn missing_value() -> Option<Self> {
    None
  }
}

/// Encodes `value` with its type's default serializer.
pub fn to_json<T: JsonType>(value: &T, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
  T::json_serializer().serialize(value, context)
}

/// Decodes a `T` with its type's default serializer and canonical descriptor.
pub fn from_json<T: JsonType>(json: &Value, context: &mut ConnectionContext) -> Result<T, SerializerError> {
  T::json_serializer().deserialize(&T::type_descriptor(), json, context)
}
