use crate::serialization::{CodecConfig, ConfigOption, ConnectorMap, IdentityMap, SerializerError};
use uuid::Uuid;

/// Direction of the call currently running against a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecPhase {
  Encode,
  Decode,
}

impl CodecPhase {
  /// Error reported for a structural violation in this phase.
  pub fn error(self, type_name: impl Into<String>, reason: impl Into<String>) -> SerializerError {
    match self {
      CodecPhase::Encode => SerializerError::unsupported_value(type_name, reason),
      CodecPhase::Decode => SerializerError::malformed_payload(type_name, reason),
    }
  }
}

/// Per-connection state threaded through every serializer call.
///
/// Serializers borrow the context for the duration of one call and keep
/// nothing from it. The identity map numbers shared values, the connector map
/// resolves connector ids, and the depth counter bounds recursion.
///
/// Identities accumulate until [`ConnectionContext::reset_identities`] or the
/// end of a [`ConnectionContext::in_message`] scope; [`crate::JsonCodec`]
/// scopes each invocation that way.
#[derive(Debug)]
pub struct ConnectionContext {
  session_id: String,
  config: CodecConfig,
  identity_map: IdentityMap,
  connector_map: ConnectorMap,
  depth: usize,
}

impl ConnectionContext {
  pub fn new() -> Self {
    Self::with_config(CodecConfig::default())
  }

  pub fn with_config(config: CodecConfig) -> Self {
    let session_id = config
      .session_id
      .clone()
      .unwrap_or_else(|| Uuid::new_v4().to_string());
    tracing::debug!("ConnectionContext: session_id = {}", session_id);
    Self {
      session_id,
      config,
      identity_map: IdentityMap::new(),
      connector_map: ConnectorMap::new(),
      depth: 0,
    }
  }

  pub fn from_options(options: impl IntoIterator<Item = ConfigOption>) -> Self {
    Self::with_config(CodecConfig::from(options))
  }

  pub fn session_id(&self) -> &str {
    &self.session_id
  }

  pub fn config(&self) -> &CodecConfig {
    &self.config
  }

  pub fn identity_map(&self) -> &IdentityMap {
    &self.identity_map
  }

  pub fn identity_map_mut(&mut self) -> &mut IdentityMap {
    &mut self.identity_map
  }

  pub fn connector_map(&self) -> &ConnectorMap {
    &self.connector_map
  }

  pub fn connector_map_mut(&mut self) -> &mut ConnectorMap {
    &mut self.connector_map
  }

  pub fn depth(&self) -> usize {
    self.depth
  }

  /// Runs `f` one nesting level deeper, failing once `max_depth` levels are open.
  pub fn nested<R>(
    &mut self,
    phase: CodecPhase,
    type_name: &str,
    f: impl FnOnce(&mut Self) -> Result<R, SerializerError>,
  ) -> Result<R, SerializerError> {
    if self.depth >= self.config.max_depth {
      return Err(phase.error(
        type_name,
        format!("nesting deeper than {} levels", self.config.max_depth),
      ));
    }
    self.depth += 1;
    let result = f(self);
    self.depth -= 1;
    result
  }

  /// Forgets every shared value numbered so far. Connectors stay attached.
  pub fn reset_identities(&mut self) {
    self.identity_map.clear();
  }

  /// Runs `f` as one message: shared values are numbered from scratch inside
  /// it and released when it returns, whether it succeeded or not.
  pub fn in_message<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
    self.reset_identities();
    let result = f(self);
    self.reset_identities();
    result
  }
}

impl Default for ConnectionContext {
  fn default() -> Self {
    Self::new()
  }
}
