use crate::serialization::ConfigOption;

/// Session-scoped codec settings carried by a [`crate::ConnectionContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
  pub max_depth: usize,
  pub reject_unknown_fields: bool,
  pub allow_missing_optional: bool,
  pub session_id: Option<String>,
}

impl Default for CodecConfig {
  fn default() -> Self {
    CodecConfig {
      max_depth: 64,
      reject_unknown_fields: false,
      allow_missing_optional: true,
      session_id: None,
    }
  }
}

impl CodecConfig {
  pub fn from(options: impl IntoIterator<Item = ConfigOption>) -> CodecConfig {
    let mut config = CodecConfig::default();
    for option in options {
      option.apply(&mut config);
    }
    config
  }
}
