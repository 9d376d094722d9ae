use crate::serialization::{ConnectionContext, JsonKind, JsonSerializer, JsonType, SerializerError, TypeDescriptor};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An object known to both peers by a string id.
///
/// Connectors are never encoded by value: the wire carries the id and the
/// receiving side resolves it through the connection's [`ConnectorMap`].
pub trait Connector: Debug + Send + Sync + 'static {
  fn connector_id(&self) -> &str;

  fn as_any(&self) -> &(dyn Any + Send + Sync + 'static);
}

/// Handle to a connector. Two handles are equal when they carry the same id.
#[derive(Debug, Clone)]
pub struct ConnectorRef {
  connector: Arc<dyn Connector>,
}

impl ConnectorRef {
  pub fn new(connector: Arc<dyn Connector>) -> Self {
    Self { connector }
  }

  pub fn from_connector<C: Connector>(connector: C) -> Self {
    Self::new(Arc::new(connector))
  }

  pub fn connector_id(&self) -> &str {
    self.connector.connector_id()
  }

  pub fn connector(&self) -> &Arc<dyn Connector> {
    &self.connector
  }

  pub fn downcast_ref<C: Connector>(&self) -> Option<&C> {
    self.connector.as_any().downcast_ref::<C>()
  }
}

impl PartialEq for ConnectorRef {
  fn eq(&self, other: &Self) -> bool {
    self.connector_id() == other.connector_id()
  }
}

impl Eq for ConnectorRef {}

impl Hash for ConnectorRef {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.connector_id().hash(state);
  }
}

/// Connectors attached to one connection, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct ConnectorMap {
  connectors: HashMap<String, ConnectorRef>,
}

impl ConnectorMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Attaches `connector`, returning the handle previously registered under the same id.
  pub fn register(&mut self, connector: ConnectorRef) -> Option<ConnectorRef> {
    tracing::debug!("ConnectorMap: register connector_id = {}", connector.connector_id());
    self.connectors.insert(connector.connector_id().to_string(), connector)
  }

  pub fn get(&self, connector_id: &str) -> Option<ConnectorRef> {
    self.connectors.get(connector_id).cloned()
  }

  pub fn contains(&self, connector_id: &str) -> bool {
    self.connectors.contains_key(connector_id)
  }

  pub fn remove(&mut self, connector_id: &str) -> Option<ConnectorRef> {
    self.connectors.remove(connector_id)
  }

  pub fn len(&self) -> usize {
    self.connectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.connectors.is_empty()
  }
}

/// Writes a connector as its id. Only connectors attached to the connection
/// can be written, and ids read back must resolve through the same map.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectorSerializer;

impl JsonSerializer<ConnectorRef> for ConnectorSerializer {
  fn type_descriptor(&self) -> TypeDescriptor {
    TypeDescriptor::of(TypeDescriptor::CONNECTOR)
  }

  fn serialize(&self, value: &ConnectorRef, context: &mut ConnectionContext) -> Result<Value, SerializerError> {
    let connector_id = value.connector_id();
    if !context.connector_map().contains(connector_id) {
      return Err(SerializerError::unsupported_value(
        TypeDescriptor::CONNECTOR,
        format!("connector {} is not attached to this connection", connector_id),
      ));
    }
    Ok(Value::String(connector_id.to_string()))
  }

  fn deserialize(
    &self,
    type_descriptor: &TypeDescriptor,
    json: &Value,
    context: &mut ConnectionContext,
  ) -> Result<ConnectorRef, SerializerError> {
    self.check_type(type_descriptor)?;
    let connector_id = json
      .as_str()
      .ok_or_else(|| SerializerError::malformed_payload(TypeDescriptor::CONNECTOR, JsonKind::String.mismatch(json)))?;
    context.connector_map().get(connector_id).ok_or_else(|| {
      SerializerError::malformed_payload(TypeDescriptor::CONNECTOR, format!("unknown connector {}", connector_id))
    })
  }
}

impl JsonType for ConnectorRef {
  type Serializer = ConnectorSerializer;
}
