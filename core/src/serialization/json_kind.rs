use serde_json::Value;
use strum::{AsRefStr, Display};

/// Shape of a JSON value, used when reporting payload mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum JsonKind {
  Null,
  Boolean,
  Number,
  String,
  Array,
  Object,
}

impl JsonKind {
  pub fn of(value: &Value) -> Self {
    match value {
      Value::Null => JsonKind::Null,
      Value::Bool(_) => JsonKind::Boolean,
      Value::Number(_) => JsonKind::Number,
      Value::String(_) => JsonKind::String,
      Value::Array(_) => JsonKind::Array,
      Value::Object(_) => JsonKind::Object,
    }
  }

  /// Message used by serializers when `value` is not of this kind.
  pub fn mismatch(self, value: &Value) -> String {
    format!("expected {}, found {}", self, JsonKind::of(value))
  }
}
