use crate::serialization::{ConnectionContext, JsonKind, JsonSerializer, SerializerError, TypeDescriptor};
use serde_json::Value;
use std::marker::PhantomData;

/// A fieldless enum written as the name of its variant.
///
/// Usually derived with `#[derive(JsonEnum)]`, which also implements
/// [`crate::JsonType`] with [`EnumSerializer`] as the serializer.
pub trait JsonEnum: Sized + Send + Sync + 'static {
  const TYPE_NAME: &'static str;

  fn variant_name(&self) -> &'static str;

  fn from_variant_name(name: &str) -> Option<Self>;

  fn variant_names() -> &'static [&'static str];
}

pub struct EnumSerializer<E> {
  _phantom: PhantomData<fn() -> E>,
}

impl<E> Default for EnumSerializer<E> {
  fn default() -> Self {
    Self { _phantom: PhantomData }
  }
}

impl<E: JsonEnum> JsonSerializer<E> for EnumSerializer<E> {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::of(E::TYPE_NAME)
  }

  fn serialize(&self, value: &E, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
    Ok(Value::String(value.variant_name().to_string()))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    _: &mut ConnectionContext,
  ) -> Result<E, SerializerError> {
    self.check_type(type_descriptor)?;
    let name = json
      .as_str()
      .ok_or_else(|| SerializerError::malformed_payload(E::TYPE_NAME, JsonKind::String.mismatch(json)))?;
    E::from_variant_name(name).ok_or_else(|| {
      SerializerError::malformed_payload(
        E::TYPE_NAME,
        format!("unknown variant {:?}, expected one of {:?}", name, E::variant_names()),
      )
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  enum Alignment {
    Left,
    Right,
  }

  impl JsonEnum for Alignment {
    const TYPE_NAME: &'static str = "Alignment";

    fn variant_name(&self) -> &'static str {
      match self {
        Alignment::Left => "LEFT",
        Alignment::Right => "RIGHT",
      }
    }

    fn from_variant_name(name: &str) -> Option<Self> {
      match name {
        "LEFT" => Some(Alignment::Left),
        "RIGHT" => Some(Alignment::Right),
        _ => None,
      }
    }

    fn variant_names() -> &'static [&'static str] {
      &["LEFT", "RIGHT"]
    }
  }

  #[test]
  fn test_round_trip() {
    let mut ctx = ConnectionContext::new();
    let serializer = EnumSerializer::<Alignment>::default();
    let json = serializer.serialize(&Alignment::Right, &mut ctx).expect("serialize");
    assert_eq!(json, json!("RIGHT"));
    let decoded = serializer
      .deserialize(&TypeDescriptor::of("Alignment"), &json, &mut ctx)
      .expect("deserialize");
    assert_eq!(decoded, Alignment::Right);
  }

  #[test]
  fn test_unknown_variant() {
    let mut ctx = ConnectionContext::new();
    let err = EnumSerializer::<Alignment>::default()
      .deserialize(&TypeDescriptor::of("Alignment"), &json!("CENTER"), &mut ctx)
      .expect_err("unknown variant");
    assert_eq!(
      err,
      SerializerError::malformed_payload(
        "Alignment",
        "unknown variant \"CENTER\", expected one of [\"LEFT\", \"RIGHT\"]"
      )
    );
  }
}
