use crate::serialization::CodecConfig;

#[derive(Debug, Clone)]
pub enum ConfigOption {
  SetMaxDepth(usize),
  SetRejectUnknownFields(bool),
  SetAllowMissingOptional(bool),
  SetSessionId(String),
}

impl ConfigOption {
  pub fn apply(&self, config: &mut CodecConfig) {
    match self {
      ConfigOption::SetMaxDepth(max_depth) => {
        config.max_depth = *max_depth;
      }
      ConfigOption::SetRejectUnknownFields(reject) => {
        config.reject_unknown_fields = *reject;
      }
      ConfigOption::SetAllowMissingOptional(allow) => {
        config.allow_missing_optional = *allow;
      }
      ConfigOption::SetSessionId(session_id) => {
        config.session_id = Some(session_id.clone());
      }
    }
  }

  pub fn with_max_depth(max_depth: usize) -> ConfigOption {
    ConfigOption::SetMaxDepth(max_depth)
  }

  pub fn with_reject_unknown_fields(reject: bool) -> ConfigOption {
    ConfigOption::SetRejectUnknownFields(reject)
  }

  pub fn with_allow_missing_optional(allow: bool) -> ConfigOption {
    ConfigOption::SetAllowMissingOptional(allow)
  }

  pub fn with_session_id(session_id: &str) -> ConfigOption {
    ConfigOption::SetSessionId(session_id.to_string())
  }
}
