use crate::serialization::{ConnectionContext, JsonKind, JsonSerializer, JsonType, SerializerError, TypeDescriptor};
use serde_json::Value;


#[derive(Debug, Default, Clone, Copy)]
pub struct BooleanSerializer;

impl JsonSerializer<bool> for BooleanSerializer {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::of(TypeDescriptor::BOOLEAN)
  }

  fn serialize(&self, value: &bool, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
    Ok(Value::Bool(*value))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    _: &mut ConnectionContext,
  ) -> Result<bool, SerializerError> {
    self.check_type(type_descriptor)?;
    json.as_bool().ok_or_else(|| {
      SerializerError::malformed_payload(TypeDescriptor::BOOLEAN, JsonKind::Boolean.mismatch(json))
    })
  }
}

impl JsonType for bool {
  type Serializer = BooleanSerializer;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StringSerializer;

impl JsonSerializer<String> for StringSerializer {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::of(TypeDescriptor::STRING)
  }

  fn serialize(&self, value: &String, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
    Ok(Value::String(value.clone()))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    _: &mut ConnectionContext,
  ) -> Result<String, SerializerError> {
    self.check_type(type_descriptor)?;
    json.as_str().map(str::to_string).ok_or_else(|| {
      SerializerError::malformed_payload(TypeDescriptor::STRING, JsonKind::String.mismatch(json))
    })
  }
}

impl JsonType for String {
  type Serializer = StringSerializer;
}

/// Encodes a `char` as a one-character string.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharSerializer;

impl JsonSerializer<char> for CharSerializer {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::of(TypeDescriptor::CHAR)
  }

  fn serialize(&self, value: &char, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
    Ok(Value::String(value.to_string()))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    _: &mut ConnectionContext,
  ) -> Result<char, SerializerError> {
    self.check_type(type_descriptor)?;
    let text = json
      .as_str()
      .ok_or_else(|| SerializerError::malformed_payload(TypeDescriptor::CHAR, JsonKind::String.mismatch(json)))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
      (Some(c), None) => Ok(c),
      _ => Err(SerializerError::malformed_payload(
        TypeDescriptor::CHAR,
        format!("expected exactly one character, found {:?}", text),
      )),
    }
  }
}

impl JsonType for char {
  type Serializer = CharSerializer;
}

macro_rules! integer_serializer {
  ($(#[$meta:meta])* $name:ident, $ty:ty, $type_name:expr) => {
    $(#[$meta])*
    #[derive(Debug, Default, Clone, Copy)]
    pub struct $name;

    impl JsonSerializer<$ty> for $name {
      fn type_descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::of($type_name)
      }

      fn serialize(&self, value: &$ty, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
        Ok(Value::from(*value))
      }

      fn deserialize(
        &self,
        type_descriptor: &TypeDescriptor,
        json: &Value,
        _: &mut ConnectionContext,
      ) -> Result<$ty, SerializerError> {
        self.check_type(type_descriptor)?;
        let number = match json {
          Value::Number(number) => number,
          other => return Err(SerializerError::malformed_payload($type_name, JsonKind::Number.mismatch(other))),
        };
        let parsed = if let Some(v) = number.as_i64() {
          <$ty>::try_from(v).ok()
        } else if let Some(v) = number.as_u64() {
          <$ty>::try_from(v).ok()
        } else {
          None
        };
        parsed.ok_or_else(|| {
          SerializerError::malformed_payload($type_name, format!("{} is not a valid {}", number, $type_name))
        })
      }
    }

    impl JsonType for $ty {
      type Serializer = $name;
    }
  };
}

integer_serializer!(ByteSerializer, i8, TypeDescriptor::BYTE);
integer_serializer!(ShortSerializer, i16, TypeDescriptor::SHORT);
integer_serializer!(IntegerSerializer, i32, TypeDescriptor::INTEGER);
integer_serializer!(
  /// 64-bit integers are written as plain JSON numbers; peers that decode
  /// numbers as doubles lose precision above 2^53.
  LongSerializer,
  i64,
  TypeDescriptor::LONG
);
integer_serializer!(UnsignedByteSerializer, u8, TypeDescriptor::UNSIGNED_BYTE);
integer_serializer!(UnsignedShortSerializer, u16, TypeDescriptor::UNSIGNED_SHORT);
integer_serializer!(UnsignedIntegerSerializer, u32, TypeDescriptor::UNSIGNED_INTEGER);
integer_serializer!(UnsignedLongSerializer, u64, TypeDescriptor::UNSIGNED_LONG);

macro_rules! float_serializer {
  ($name:ident, $ty:ty, $type_name:expr) => {
    /// Only finite values have a JSON encoding.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct $name;

    impl JsonSerializer<$ty> for $name {
      fn type_descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::of($type_name)
      }

      fn serialize(&self, value: &$ty, _: &mut ConnectionContext) -> Result<Value, SerializerError> {
        if !value.is_finite() {
          return Err(SerializerError::unsupported_value(
            $type_name,
            format!("{} has no JSON representation", value),
          ));
        }
        Ok(Value::from(*value))
      }

      fn deserialize(
        &self,
        type_descriptor: &TypeDescriptor,
        json: &Value,
        _: &mut ConnectionContext,
      ) -> Result<$ty, SerializerError> {
        self.check_type(type_descriptor)?;
        let value = json
          .as_f64()
          .ok_or_else(|| SerializerError::malformed_payload($type_name, JsonKind::Number.mismatch(json)))?
          as $ty;
        if value.is_finite() {
          Ok(value)
        } else {
          Err(SerializerError::malformed_payload(
            $type_name,
            format!("{} is out of range", json),
          ))
        }
      }
    }

    impl JsonType for $ty {
      type Serializer = $name;
    }
  };
}

float_serializer!(FloatSerializer, f32, TypeDescriptor::FLOAT);
float_serializer!(DoubleSerializer, f64, TypeDescriptor::DOUBLE);
