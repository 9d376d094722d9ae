use crate::serialization::{ConnectionContext, MethodInvocation, SerializerError, TypeDescriptor, TypeRegistry};
use serde_json::Value;
use std::any::Any;

#[cfg(test)]
mod tests;

/// Encodes and decodes values by descriptor, looking serializers up in a
/// [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct JsonCodec {
  registry: TypeRegistry,
}

impl JsonCodec {
  pub fn new(registry: TypeRegistry) -> Self {
    Self { registry }
  }

  pub fn registry(&self) -> &TypeRegistry {
    &self.registry
  }

  pub fn encode(
    &self,
    value: &(dyn Any + Send + Sync),
    type_descriptor: &TypeDescriptor,
    context: &mut ConnectionContext,
  ) -> Result<Value, SerializerError> {
    tracing::trace!("JsonCodec: encode type = {}", type_descriptor);
    self
      .registry
      .find_serializer_any(type_descriptor)?
      .serialize_any(value, context)
  }

  pub fn decode(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Box<dyn Any + Send + Sync>, SerializerError> {
    tracing::trace!("JsonCodec: decode type = {}", type_descriptor);
    self
      .registry
      .find_serializer_any(type_descriptor)?
      .deserialize_any(type_descriptor, json, context)
  }

  pub fn encode_value<T: 'static>(
    &self,
    value: &T,
    type_descriptor: &TypeDescriptor,
    context: &mut ConnectionContext,
  ) -> Result<Value, SerializerError> {
    tracing::trace!("JsonCodec: encode_value type = {}", type_descriptor);
    self
      .registry
      .find_serializer::<T>(type_descriptor)?
      .serialize(value, context)
  }

  pub fn decode_value<T: 'static>(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<T, SerializerError> {
    tracing::trace!("JsonCodec: decode_value type = {}", type_descriptor);
    self
      .registry
      .find_serializer::<T>(type_descriptor)?
      .deserialize(type_descriptor, json, context)
  }

  pub fn to_wire(&self, json: &Value) -> String {
    json.to_string()
  }

  /// Parses message text.
  ///
  /// # Errors
  ///
  /// [`SerializerError::MalformedPayload`] when `text` is not valid JSON.
  pub fn from_wire(&self, text: &str) -> Result<Value, SerializerError> {
    serde_json::from_str(text).map_err(|e| SerializerError::malformed_payload("json", e.to_string()))
  }

  /// Builds an invocation, encoding each parameter with the serializer
  /// registered for its descriptor.
  ///
  /// The invocation is one identity scope: an `Arc` passed twice is written
  /// once and referenced after, and the context keeps no identities once the
  /// call returns.
  pub fn encode_invocation(
    &self,
    connector_id: &str,
    interface_name: &str,
    method_name: &str,
    parameters: &[(TypeDescriptor, &(dyn Any + Send + Sync))],
    context: &mut ConnectionContext,
  ) -> Result<MethodInvocation, SerializerError> {
    tracing::debug!(
      "JsonCodec: encode_invocation {}.{} on {} with {} parameters",
      interface_name,
      method_name,
      connector_id,
      parameters.len()
    );
    let parameters = context.in_message(|context| {
      parameters
        .iter()
        .map(|(type_descriptor, value)| self.encode(*value, type_descriptor, context))
        .collect::<Result<Vec<_>, _>>()
    })?;
    Ok(MethodInvocation::new(connector_id, interface_name, method_name, parameters))
  }

  /// Decodes the parameters of `invocation` against the declared parameter
  /// types of the target method. Like [`JsonCodec::encode_invocation`], the
  /// invocation is one identity scope.
  ///
  /// # Errors
  ///
  /// [`SerializerError::MalformedPayload`] when the parameter count differs
  /// from `parameter_types`, and any error of the parameter serializers.
  pub fn decode_parameters(
    &self,
    invocation: &MethodInvocation,
    parameter_types: &[TypeDescriptor],
    context: &mut ConnectionContext,
  ) -> Result<Vec<Box<dyn Any + Send + Sync>>, SerializerError> {
    if invocation.parameters.len() != parameter_types.len() {
      return Err(SerializerError::malformed_payload(
        invocation.qualified_method_name(),
        format!(
          "expected {} parameters, found {}",
          parameter_types.len(),
          invocation.parameters.len()
        ),
      ));
    }
    tracing::debug!(
      "JsonCodec: decode_parameters {} on {}",
      invocation.qualified_method_name(),
      invocation.connector_id
    );
    context.in_message(|context| {
      invocation
        .parameters
        .iter()
        .zip(parameter_types)
        .map(|(json, type_descriptor)| self.decode(type_descriptor, json, context))
        .collect()
    })
  }
}

impl Default for JsonCodec {
  /// A codec over [`TypeRegistry::global`].
  fn default() -> Self {
    Self::new(TypeRegistry::global().clone())
  }
}
