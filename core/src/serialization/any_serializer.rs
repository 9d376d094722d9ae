use crate::serialization::{ConnectionContext, JsonSerializer, SerializerError, TypeDescriptor};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Object-safe view of a [`JsonSerializer`], used where serializers for
/// different Rust types are stored side by side.
pub trait AnyJsonSerializer: Send + Sync {
  fn type_descriptor(&self) -> TypeDescriptor;

  /// Rust type name of the values this serializer handles.
  fn type_name(&self) -> &'static str;

  fn serialize_any(
    &self,
    value: &(dyn Any + Send + Sync),
    context: &mut ConnectionContext,
  ) -> Result<Value, SerializerError>;

  fn deserialize_any(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Box<dyn Any + Send + Sync>, SerializerError>;
}

pub struct ErasedSerializer<T> {
  serializer: Arc<dyn JsonSerializer<T>>,
}

impl<T> ErasedSerializer<T> {
  pub fn new(serializer: Arc<dyn JsonSerializer<T>>) -> Self {
    Self { serializer }
  }
}

impl<T: Send + Sync + 'static> AnyJsonSerializer for ErasedSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    self.serializer.type_descriptor()
  }

  fn type_name(&self) -> &'static str {
    std::any::type_name::<T>()
  }

  fn serialize_any(
    &self,
    value: &(dyn Any + Send + Sync),
    context: &mut ConnectionContext,
  ) -> Result<Value, SerializerError> {
    let value = value.downcast_ref::<T>().ok_or_else(|| {
      SerializerError::unsupported_value(
        self.serializer.type_descriptor().signature(),
        format!("expected a value of type {}", self.type_name()),
      )
    })?;
    self.serializer.serialize(value, context)
  }

  fn deserialize_any(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Box<dyn Any + Send + Sync>, SerializerError> {
    self
      .serializer
      .deserialize(type_descriptor, json, context)
      .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
  }
}
