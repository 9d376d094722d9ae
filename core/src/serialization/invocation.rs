use crate::serialization::{JsonKind, SerializerError};
use serde_json::Value;

const INVOCATION: &str = "invocation";

/// One RPC call as it travels between peers.
///
/// On the wire an invocation is the array
/// `[connectorId, interfaceName, methodName, [p1, p2, ...]]` where each
/// parameter is already encoded by its own serializer.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInvocation {
  pub connector_id: String,
  pub interface_name: String,
  pub method_name: String,
  pub parameters: Vec<Value>,
}

impl MethodInvocation {
  pub fn new(
    connector_id: impl Into<String>,
    interface_name: impl Into<String>,
    method_name: impl Into<String>,
    parameters: Vec<Value>,
  ) -> Self {
    Self {
      connector_id: connector_id.into(),
      interface_name: interface_name.into(),
      method_name: method_name.into(),
      parameters,
    }
  }

  /// `interface.method`, used to name the call in errors.
  pub fn qualified_method_name(&self) -> String {
    format!("{}.{}", self.interface_name, self.method_name)
  }

  pub fn to_json(&self) -> Value {
    Value::Array(vec![
      Value::String(self.connector_id.clone()),
      Value::String(self.interface_name.clone()),
      Value::String(self.method_name.clone()),
      Value::Array(self.parameters.clone()),
    ])
  }

  pub fn from_json(json: &Value) -> Result<Self, SerializerError> {
    let items = json
      .as_array()
      .ok_or_else(|| SerializerError::malformed_payload(INVOCATION, JsonKind::Array.mismatch(json)))?;
    if items.len() != 4 {
      return Err(SerializerError::malformed_payload(
        INVOCATION,
        format!("expected 4 elements, found {}", items.len()),
      ));
    }
    let parameters = items[3]
      .as_array()
      .ok_or_else(|| {
        SerializerError::malformed_payload(
          INVOCATION,
          format!("parameters: {}", JsonKind::Array.mismatch(&items[3])),
        )
      })?
      .clone();
    Ok(Self {
      connector_id: string_member(&items[0], "connector id")?,
      interface_name: string_member(&items[1], "interface name")?,
      method_name: string_member(&items[2], "method name")?,
      parameters,
    })
  }
}

fn string_member(json: &Value, member: &str) -> Result<String, SerializerError> {
  json.as_str().map(str::to_string).ok_or_else(|| {
    SerializerError::malformed_payload(INVOCATION, format!("{}: {}", member, JsonKind::String.mismatch(json)))
  })
}
