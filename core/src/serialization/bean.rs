//! Building blocks for record serializers.
//!
//! A bean is encoded as a JSON object with one member per property, in
//! declaration order. `#[derive(JsonBean)]` generates a serializer that drives
//! [`BeanWriter`] and [`BeanReader`]; hand-written serializers can use them
//! the same way.

use crate::serialization::{from_json, to_json, ConnectionContext, JsonKind, JsonType, SerializerError};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Collects the properties of one bean into a JSON object.
#[derive(Debug)]
pub struct BeanWriter {
  type_name: String,
  members: Map<String, Value>,
}

impl BeanWriter {
  pub fn new(type_name: impl Into<String>) -> Self {
    Self {
      type_name: type_name.into(),
      members: Map::new(),
    }
  }

  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  /// Encodes `value` with its type's default serializer and stores it under `name`.
  pub fn write_field<F: JsonType>(
    &mut self,
    name: &str,
    value: &F,
    context: &mut ConnectionContext,
  ) -> Result<(), SerializerError> {
    let json = to_json(value, context)?;
    if self.members.insert(name.to_string(), json).is_some() {
      return Err(SerializerError::unsupported_value(
        self.type_name.as_str(),
        format!("property `{}` written twice", name),
      ));
    }
    Ok(())
  }

  pub fn into_value(self) -> Value {
    Value::Object(self.members)
  }
}

/// Reads the properties of one bean out of a JSON object.
#[derive(Debug)]
pub struct BeanReader<'a> {
  type_name: String,
  members: &'a Map<String, Value>,
  consumed: HashSet<&'a str>,
}

impl<'a> BeanReader<'a> {
  /// # Errors
  ///
  /// [`SerializerError::MalformedPayload`] when `json` is not an object.
  pub fn new(type_name: impl Into<String>, json: &'a Value) -> Result<Self, SerializerError> {
    let type_name = type_name.into();
    let members = json
      .as_object()
      .ok_or_else(|| SerializerError::malformed_payload(type_name.as_str(), JsonKind::Object.mismatch(json)))?;
    Ok(Self {
      type_name,
      members,
      consumed: HashSet::new(),
    })
  }

  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  /// Decodes the property `name`.
  ///
  /// An absent property takes `F::missing_value()` when the type has one and
  /// the context allows it, and is a [`SerializerError::MalformedPayload`]
  /// otherwise.
  pub fn read_field<F: JsonType>(&mut self, name: &str, context: &mut ConnectionContext) -> Result<F, SerializerError> {
    match self.members.get_key_value(name) {
      Some((key, json)) => {
        self.consumed.insert(key.as_str());
        from_json::<F>(json, context)
      }
      None => {
        let default = if context.config().allow_missing_optional {
          F::missing_value()
        } else {
          None
        };
        default.ok_or_else(|| {
          SerializerError::malformed_payload(self.type_name.as_str(), format!("missing field `{}`", name))
        })
      }
    }
  }

  /// Completes the read. With `reject_unknown_fields` set, a member that no
  /// `read_field` call consumed is a [`SerializerError::MalformedPayload`].
  pub fn finish(self, context: &ConnectionContext) -> Result<(), SerializerError> {
    if !context.config().reject_unknown_fields {
      return Ok(());
    }
    match self
      .members
      .keys()
      .find(|key| !self.consumed.contains(key.as_str()))
    {
      Some(unknown) => Err(SerializerError::malformed_payload(
        self.type_name.as_str(),
        format!("unknown field `{}`", unknown),
      )),
      None => Ok(()),
    }
  }
}
