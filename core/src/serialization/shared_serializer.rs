use crate::serialization::{
  CodecPhase, ConnectionContext, JsonKind, JsonSerializer, JsonType, SerializerError, TypeDescriptor,
};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const ID_MEMBER: &str = "@id";
pub const REF_MEMBER: &str = "@ref";
pub const VALUE_MEMBER: &str = "value";

/// Identity-preserving encoding of `Arc<T>`.
///
/// The first time a given allocation is serialized on a connection it is
/// written in full as `{"@id": n, "value": ...}`; every later occurrence is
/// written as `{"@ref": n}`. Decoding binds the peer's `n` in the context's
/// identity map, so references decode to the same `Arc`. A second `@id` for
/// a bound `n` is malformed.
///
/// An encode that fails forgets the ids it assigned, so a retry does not
/// reference a value the peer never received.
pub struct SharedSerializer<T: JsonType> {
  inner: T::Serializer,
}

impl<T: JsonType> Default for SharedSerializer<T> {
  fn default() -> Self {
    Self {
      inner: T::json_serializer(),
    }
  }
}

impl<T: JsonType> JsonSerializer<Arc<T>> for SharedSerializer<T> {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::shared(T::type_descriptor())
  }

  fn serialize(&self, value: &Arc<T>, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    let mut object = Map::new();
    if let Some(id) = context.identity_map().id_of(value) {
      tracing::trace!("SharedSerializer: reference id = {}", id);
      object.insert(REF_MEMBER.to_string(), Value::from(id));
      return Ok(Value::Object(object));
    }
    let signature = self.type_descriptor().signature();
    let mark = context.identity_map().mark();
    let id = context
      .identity_map_mut()
      .register(value)
      .ok_or_else(|| SerializerError::unsupported_value(signature.as_str(), "no identity ids left on this connection"))?;
    let payload = context.nested(CodecPhase::Encode, &signature, |context| {
      self.inner.serialize(value.as_ref(), context)
    });
    let payload = match payload {
      Ok(payload) => payload,
      Err(err) => {
        context.identity_map_mut().rollback(mark);
        return Err(err);
      }
    };
    object.insert(ID_MEMBER.to_string(), Value::from(id));
    object.insert(VALUE_MEMBER.to_string(), payload);
    Ok(Value::Object(object))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<Arc<T>, SerializerError> {
    self.check_type(type_descriptor)?;
    let signature = type_descriptor.signature();
    let object = json
      .as_object()
      .ok_or_else(|| SerializerError::malformed_payload(signature.as_str(), JsonKind::Object.mismatch(json)))?;

    if let Some(reference) = object.get(REF_MEMBER) {
      let id = reference.as_u64().ok_or_else(|| {
        SerializerError::malformed_payload(signature.as_str(), format!("{} must be a non-negative integer", REF_MEMBER))
      })?;
      return resolve::<T>(context, id, &signature);
    }

    let id = object.get(ID_MEMBER).and_then(Value::as_u64).ok_or_else(|| {
      SerializerError::malformed_payload(signature.as_str(), format!("missing or invalid {}", ID_MEMBER))
    })?;
    let payload = object
      .get(VALUE_MEMBER)
      .ok_or_else(|| SerializerError::malformed_payload(signature.as_str(), format!("missing {}", VALUE_MEMBER)))?;

    if context.identity_map().is_bound(id) {
      return Err(SerializerError::malformed_payload(
        signature.as_str(),
        format!("duplicate {} {}", ID_MEMBER, id),
      ));
    }

    let inner_type = T::type_descriptor();
    let value = context.nested(CodecPhase::Decode, &signature, |context| {
      self.inner.deserialize(&inner_type, payload, context)
    })?;
    let shared = Arc::new(value);
    if !context.identity_map_mut().bind(id, &shared) {
      return Err(SerializerError::malformed_payload(
        signature.as_str(),
        format!("duplicate {} {}", ID_MEMBER, id),
      ));
    }
    Ok(shared)
  }
}

fn resolve<T: JsonType>(context: &ConnectionContext, id: u64, signature: &str) -> Result<Arc<T>, SerializerError> {
  let identity_map = context.identity_map();
  identity_map.resolve::<T>(id).ok_or_else(|| {
    let reason = if identity_map.is_bound(id) {
      format!("reference {} is bound to another type", id)
    } else {
      format!("unknown reference {}", id)
    };
    SerializerError::malformed_payload(signature, reason)
  })
}

impl<T: JsonType> JsonType for Arc<T> {
  type Serializer = SharedSerializer<T>;
}
