use crate::serialization::{
  CodecPhase, ConnectionContext, JsonKind, JsonSerializer, JsonType, SerializerError, TypeDescriptor,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;


/// `None` is written as `null`, `Some(v)` as the encoding of `v`.
///
/// A `Some` whose inner encoding is itself `null` (such as `Some(None)` of a
/// nested option) is rejected, since it would read back as `None`.
pub struct NullableSerializer<T: JsonType> {
  inner: T::Serializer,
}

impl<T: JsonType> Default for NullableSerializer<T> {
  fn default() -> Self {
    Self {
      inner: T::json_serializer(),
    }
  }
}

impl<T: JsonType> JsonSerializer<Option<T>> for NullableSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::nullable(T::type_descriptor())
  }

  fn serialize(&self, value: &Option<T>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    match value {
      Some(inner) => match self.inner.serialize(inner, context)? {
        Value::Null => Err(SerializerError::unsupported_value(
          self.type_descriptor().to_string(),
          "present value encodes to null and would decode as absent",
        )),
        json => Ok(json),
      },
      None => Ok(Value::Null),
    }
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Option<T>, SerializerError> {
    self.check_type(type_descriptor)?;
    if json.is_null() {
      return Ok(None);
    }
    self.inner.deserialize(&T::type_descriptor(), json, context).map(Some)
  }
}

impl<T: JsonType> JsonType for Option<T> {
  type Serializer = NullableSerializer<T>;

  fn missing_value() -> Option<Self> {
    Some(None)
  }
}

fn encode_elements<'a, T, S, I>(
  serializer: &S,
  signature: &str,
  elements: I,
  context: &mut ConnectionContext,
) -> Result<Value, SerializerError>
where
  T: 'a,
  S: JsonSerializer<T>,
  I: Iterator<Item = &'a T>,
{
  context.nested(CodecPhase::Encode, signature, |context| {
    elements
      .map(|element| serializer.serialize(element, context))
      .collect::<Result<Vec<_>, _>>()
      .map(Value::Array)
  })
}

fn decode_elements<T: JsonType, S: JsonSerializer<T>>(
  serializer: &S,
  signature: &str,
  json: &Value,
  context: &mut ConnectionContext,
) -> Result<Vec<T>, SerializerError> {
  let items = json
    .as_array()
    .ok_or_else(|| SerializerError::malformed_payload(signature, JsonKind::Array.mismatch(json)))?;
  let element_type = T::type_descriptor();
  context.nested(CodecPhase::Decode, signature, |context| {
    items
      .iter()
      .map(|item| serializer.deserialize(&element_type, item, context))
      .collect()
  })
}

/// Lists are JSON arrays in element order.
pub struct ListSerializer<T: JsonType> {
  element: T::Serializer,
}

impl<T: JsonType> Default for ListSerializer<T> {
  fn default() -> Self {
    Self {
      element: T::json_serializer(),
    }
  }
}

impl<T: JsonType> JsonSerializer<Vec<T>> for ListSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::list_of(T::type_descriptor())
  }

  fn serialize(&self, value: &Vec<T>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    encode_elements(&self.element, &self.type_descriptor().signature(), value.iter(), context)
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Vec<T>, SerializerError> {
    self.check_type(type_descriptor)?;
    decode_elements(&self.element, &type_descriptor.signature(), json, context)
  }
}

impl<T: JsonType> JsonType for Vec<T> {
  type Serializer = ListSerializer<T>;
}

/// Sets are JSON arrays. A payload repeating an element is rejected.
pub struct SetSerializer<T: JsonType> {
  element: T::Serializer,
}

impl<T: JsonType> Default for SetSerializer<T> {
  fn default() -> Self {
    Self {
      element: T::json_serializer(),
    }
  }
}

impl<T: JsonType> SetSerializer<T> {
  fn decode_unique<C>(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<C, SerializerError>
  where
    C: FromIterator<T> + SetLen, {
    let signature = type_descriptor.signature();
    let elements = decode_elements::<T, _>(&self.element, &signature, json, context)?;
    let count = elements.len();
    let set: C = elements.into_iter().collect();
    if set.set_len() != count {
      return Err(SerializerError::malformed_payload(signature, "duplicate set element"));
    }
    Ok(set)
  }
}

trait SetLen {
  fn set_len(&self) -> usize;
}

impl<T> SetLen for BTreeSet<T> {
  fn set_len(&self) -> usize {
    self.len()
  }
}

impl<T> SetLen for HashSet<T> {
  fn set_len(&self) -> usize {
    self.len()
  }
}

impl<T: JsonType + Ord> JsonSerializer<BTreeSet<T>> for SetSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::set_of(T::type_descriptor())
  }

  fn serialize(&self, value: &BTreeSet<T>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    let signature = JsonSerializer::<BTreeSet<T>>::type_descriptor(self).signature();
    encode_elements(&self.element, &signature, value.iter(), context)
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<BTreeSet<T>, SerializerError> {
    JsonSerializer::<BTreeSet<T>>::check_type(self, type_descriptor)?;
    self.decode_unique(type_descriptor, json, context)
  }
}

impl<T: JsonType + Eq + Hash> JsonSerializer<HashSet<T>> for SetSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::set_of(T::type_descriptor())
  }

  fn serialize(&self, value: &HashSet<T>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    let signature = JsonSerializer::<HashSet<T>>::type_descriptor(self).signature();
    encode_elements(&self.element, &signature, value.iter(), context)
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<HashSet<T>, SerializerError> {
    JsonSerializer::<HashSet<T>>::check_type(self, type_descriptor)?;
    self.decode_unique(type_descriptor, json, context)
  }
}

impl<T: JsonType + Ord> JsonType for BTreeSet<T> {
  type Serializer = SetSerializer<T>;
}

impl<T: JsonType + Eq + Hash> JsonType for HashSet<T> {
  type Serializer = SetSerializer<T>;
}

/// Maps keyed by strings or connectors are JSON objects. Any other key type is
/// written as a pair of parallel arrays, `[[k1, k2], [v1, v2]]`.
pub struct MapSerializer<K: JsonType, V: JsonType> {
  key: K::Serializer,
  value: V::Serializer,
}

impl<K: JsonType, V: JsonType> Default for MapSerializer<K, V> {
  fn default() -> Self {
    Self {
      key: K::json_serializer(),
      value: V::json_serializer(),
    }
  }
}

impl<K: JsonType, V: JsonType> MapSerializer<K, V> {
  fn descriptor() -> TypeDescriptor {
    TypeDescriptor::map_of(K::type_descriptor(), V::type_descriptor())
  }

  fn object_keyed() -> bool {
    let key_type = K::type_descriptor();
    !key_type.is_generic()
      && matches!(
        key_type.base_name(),
        TypeDescriptor::STRING | TypeDescriptor::CONNECTOR
      )
  }

  fn encode_entries<'a, I>(&self, entries: I, context: &mut ConnectionContext) -> Result<Value, SerializerError>
  where
    K: 'a,
    V: 'a,
    I: Iterator<Item = (&'a K, &'a V)>, {
    let signature = Self::descriptor().signature();
    context.nested(CodecPhase::Encode, &signature, |context| {
      if Self::object_keyed() {
        let mut object = Map::new();
        for (key, value) in entries {
          let key = match self.key.serialize(key, context)? {
            Value::String(key) => key,
            other => {
              return Err(SerializerError::unsupported_value(
                signature.as_str(),
                JsonKind::String.mismatch(&other),
              ))
            }
          };
          object.insert(key, self.value.serialize(value, context)?);
        }
        Ok(Value::Object(object))
      } else {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for (key, value) in entries {
          keys.push(self.key.serialize(key, context)?);
          values.push(self.value.serialize(value, context)?);
        }
        Ok(Value::Array(vec![Value::Array(keys), Value::Array(values)]))
      }
    })
  }

  fn decode_entries(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Vec<(K, V)>, SerializerError> {
    let signature = type_descriptor.signature();
    let key_type = K::type_descriptor();
    let value_type = V::type_descriptor();
    if Self::object_keyed() {
      let object = json
        .as_object()
        .ok_or_else(|| SerializerError::malformed_payload(signature.as_str(), JsonKind::Object.mismatch(json)))?;
      return context.nested(CodecPhase::Decode, &signature, |context| {
        object
          .iter()
          .map(|(key, value)| -> Result<(K, V), SerializerError> {
            let key = self.key.deserialize(&key_type, &Value::String(key.clone()), context)?;
            let value = self.value.deserialize(&value_type, value, context)?;
            Ok((key, value))
          })
          .collect()
      });
    }

    let (keys, values) = match json.as_array().map(Vec::as_slice) {
      Some([Value::Array(keys), Value::Array(values)]) if keys.len() == values.len() => (keys, values),
      _ => {
        return Err(SerializerError::malformed_payload(
          signature,
          "expected [keys, values] arrays of equal length",
        ))
      }
    };
    context.nested(CodecPhase::Decode, &signature, |context| {
      keys
        .iter()
        .zip(values.iter())
        .map(|(key, value)| -> Result<(K, V), SerializerError> {
          let key = self.key.deserialize(&key_type, key, context)?;
          let value = self.value.deserialize(&value_type, value, context)?;
          Ok((key, value))
        })
        .collect()
    })
  }
}

impl<K: JsonType + Ord, V: JsonType> JsonSerializer<BTreeMap<K, V>> for MapSerializer<K, V> {
  fn type_descriptor(&self) -> TypeDescriptor {
    Self::descriptor()
  }

  fn serialize(&self, value: &BTreeMap<K, V>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    self.encode_entries(value.iter(), context)
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<BTreeMap<K, V>, SerializerError> {
    JsonSerializer::<BTreeMap<K, V>>::check_type(self, type_descriptor)?;
    let entries = self.decode_entries(type_descriptor, json, context)?;
    let count = entries.len();
    let map: BTreeMap<K, V> = entries.into_iter().collect();
    if map.len() != count {
      return Err(SerializerError::malformed_payload(type_descriptor.signature(), "duplicate map key"));
    }
    Ok(map)
  }
}

impl<K: JsonType + Eq + Hash, V: JsonType> JsonSerializer<HashMap<K, V>> for MapSerializer<K, V> {
  fn type_descriptor(&self) -> TypeDescriptor {
    Self::descriptor()
  }

  fn serialize(&self, value: &HashMap<K, V>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    self.encode_entries(value.iter(), context)
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<HashMap<K, V>, SerializerError> {
    JsonSerializer::<HashMap<K, V>>::check_type(self, type_descriptor)?;
    let entries = self.decode_entries(type_descriptor, json, context)?;
    let count = entries.len();
    let map: HashMap<K, V> = entries.into_iter().collect();
    if map.len() != count {
      return Err(SerializerError::malformed_payload(type_descriptor.signature(), "duplicate map key"));
    }
    Ok(map)
  }
}

impl<K: JsonType + Ord, V: JsonType> JsonType for BTreeMap<K, V> {
  type Serializer = MapSerializer<K, V>;
}

impl<K: JsonType + Eq + Hash, V: JsonType> JsonType for HashMap<K, V> {
  type Serializer = MapSerializer<K, V>;
}
