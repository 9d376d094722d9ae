use crate::serialization::{ConnectionContext, JsonSerializer, SerializerError, TypeDescriptor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;

/// Adapts any serde type to the serializer contract.
///
/// The JSON shape is whatever `serde_json` produces for `T`. The descriptor is
/// supplied at construction since serde types carry no wire name of their own.
/// Serde types do not take part in identity tracking.
pub struct SerdeJsonSerializer<T> {
  type_descriptor: TypeDescriptor,
  _phantom: PhantomData<fn() -> T>,
}

impl<T> SerdeJsonSerializer<T> {
  pub fn new(type_descriptor: TypeDescriptor) -> Self {
    Self {
      type_descriptor,
      _phantom: PhantomData,
    }
  }

  pub fn named(type_name: &'static str) -> Self {
    Self::new(TypeDescriptor::of(type_name))
  }
}

impl<T: Serialize + DeserializeOwned> JsonSerializer<T> for SerdeJsonSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    self.type_descriptor.clone()
  }

  fn serialize(&self, value: &T, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
    serde_json::to_value(value)
      .map_err(|e| SerializerError::unsupported_value(self.type_descriptor.signature(), e.to_string()))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    _: &mut ConnectionContext,
  ) -> Result<T, SerializerError> {
    self.check_type(type_descriptor)?;
    T::deserialize(json).map_err(|e| SerializerError::malformed_payload(type_descriptor.signature(), e.to_string()))
  }
}
