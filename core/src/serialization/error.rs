use thiserror::Error;

/// Failures surfaced by serializers, the registry and the codec.
///
/// None of these are transient: retrying the same call with the same input
/// cannot succeed, so callers propagate them instead of recovering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializerError {
  /// The value handed to `serialize` has a runtime shape the serializer cannot encode.
  #[error("Unsupported value for {type_name}: {reason}")]
  UnsupportedValue { type_name: String, reason: String },
  /// The JSON handed to `deserialize` does not match the shape expected for the type.
  #[error("Malformed payload for {type_name}: {reason}")]
  MalformedPayload { type_name: String, reason: String },
  /// The type descriptor does not name the type the serializer was registered for.
  #[error("Unknown type: expected {expected}, got {actual}")]
  UnknownType { expected: String, actual: String },
  #[error("Serializer already registered for {0}")]
  DuplicateEntry(String),
}

impl SerializerError {
  pub fn unsupported_value(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
    SerializerError::UnsupportedValue {
      type_name: type_name.into(),
      reason: reason.into(),
    }
  }

  pub fn malformed_payload(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
    SerializerError::MalformedPayload {
      type_name: type_name.into(),
      reason: reason.into(),
    }
  }

  pub fn unknown_type(expected: impl Into<String>, actual: impl Into<String>) -> Self {
    SerializerError::UnknownType {
      expected: expected.into(),
      actual: actual.into(),
    }
  }

  pub fn is_unsupported_value(&self) -> bool {
    matches!(self, SerializerError::UnsupportedValue { .. })
  }

  pub fn is_malformed_payload(&self) -> bool {
    matches!(self, SerializerError::MalformedPayload { .. })
  }

  pub fn is_unknown_type(&self) -> bool {
    matches!(self, SerializerError::UnknownType { .. })
  }
}

static_assertions::assert_impl_all!(SerializerError: Send, Sync);
