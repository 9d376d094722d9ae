use crate::serialization::{AnyJsonSerializer, ConnectorRef, ErasedSerializer, JsonSerializer, JsonType, SerializerError, TypeDescriptor};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;


struct RegistryEntry {
  typed: Arc<dyn Any + Send + Sync>,
  erased: Arc<dyn AnyJsonSerializer>,
}

/// Resolves type descriptors to serializers.
///
/// Entries are keyed by descriptor signature and added by explicit
/// registration only. Lookups clone the stored `Arc`, so no map guard is held
/// while a serializer runs.
#[derive(Clone, Default)]
pub struct TypeRegistry {
  entries: Arc<DashMap<String, RegistryEntry>>,
}

static GLOBAL_REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::with_defaults);

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry holding serializers for every scalar type and connectors.
  pub fn with_defaults() -> Self {
    let registry = Self::new();
    if let Err(err) = registry.register_defaults() {
      tracing::warn!("TypeRegistry: failed to register defaults: {}", err);
    }
    registry
  }

  /// The process-wide registry, created with [`TypeRegistry::with_defaults`] on first use.
  pub fn global() -> &'static TypeRegistry {
    &GLOBAL_REGISTRY
  }

  pub fn register_defaults(&self) -> Result<(), SerializerError> {
    self.register_type::<bool>()?;
    self.register_type::<char>()?;
    self.register_type::<i8>()?;
    self.register_type::<i16>()?;
    self.register_type::<i32>()?;
    self.register_type::<i64>()?;
    self.register_type::<u8>()?;
    self.register_type::<u16>()?;
    self.register_type::<u32>()?;
    self.register_type::<u64>()?;
    self.register_type::<f32>()?;
    self.register_type::<f64>()?;
    self.register_type::<String>()?;
    self.register_type::<ConnectorRef>()?;
    Ok(())
  }

  pub fn register<T: Send + Sync + 'static>(&self, serializer: Arc<dyn JsonSerializer<T>>) -> Result<(), SerializerError> {
    let signature = serializer.type_descriptor().signature();
    tracing::debug!(
      "Registering serializer: signature = {}, type_name = {}",
      signature,
      std::any::type_name::<T>()
    );
    match self.entries.entry(signature) {
      Entry::Occupied(occupied) => {
        tracing::warn!(
          "Serializer already registered: signature = {}, type_name = {}",
          occupied.key(),
          occupied.get().erased.type_name()
        );
        Err(SerializerError::DuplicateEntry(occupied.key().clone()))
      }
      Entry::Vacant(vacant) => {
        vacant.insert(RegistryEntry {
          typed: Arc::new(serializer.clone()) as Arc<dyn Any + Send + Sync>,
          erased: Arc::new(ErasedSerializer::new(serializer)),
        });
        Ok(())
      }
    }
  }

  /// Registers the default serializer of `T` under its canonical descriptor.
  pub fn register_type<T: JsonType>(&self) -> Result<(), SerializerError> {
    self.register::<T>(Arc::new(T::json_serializer()))
  }

  /// Typed lookup.
  ///
  /// # Errors
  ///
  /// [`SerializerError::UnknownType`] when nothing is registered for the
  /// descriptor, or when the registered serializer handles another Rust type.
  pub fn find_serializer<T: 'static>(
    &self,
    type_descriptor: &TypeDescriptor,
  ) -> Result<Arc<dyn JsonSerializer<T>>, SerializerError> {
    let signature = type_descriptor.signature();
    let (typed, registered_type_name) = {
      let entry = self.entries.get(&signature).ok_or_else(|| {
        tracing::debug!("find_serializer: not found, signature = {}", signature);
        SerializerError::unknown_type("a registered type", signature.as_str())
      })?;
      (entry.typed.clone(), entry.erased.type_name())
    };
    typed
      .downcast::<Arc<dyn JsonSerializer<T>>>()
      .map(|serializer| serializer.as_ref().clone())
      .map_err(|_| {
        SerializerError::unknown_type(
          format!("{} ({})", signature, registered_type_name),
          std::any::type_name::<T>(),
        )
      })
  }

  /// Type-erased lookup.
  pub fn find_serializer_any(
    &self,
    type_descriptor: &TypeDescriptor,
  ) -> Result<Arc<dyn AnyJsonSerializer>, SerializerError> {
    let signature = type_descriptor.signature();
    let found = self.entries.get(&signature).map(|entry| entry.erased.clone());
    tracing::debug!("find_serializer_any: signature = {}, found = {}", signature, found.is_some());
    found.ok_or_else(|| SerializerError::unknown_type("a registered type", signature))
  }

  pub fn contains(&self, type_descriptor: &TypeDescriptor) -> bool {
    self.entries.contains_key(&type_descriptor.signature())
  }

  pub fn unregister(&self, type_descriptor: &TypeDescriptor) -> bool {
    let removed = self.entries.remove(&type_descriptor.signature()).is_some();
    tracing::debug!(
      "Unregistering serializer: signature = {}, removed = {}",
      type_descriptor,
      removed
    );
    removed
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Registered signatures in lexical order.
  pub fn signatures(&self) -> Vec<String> {
    let mut signatures = self
      .entries
      .iter()
      .map(|entry| entry.key().clone())
      .collect::<Vec<_>>();
    signatures.sort();
    signatures
  }
}

impl Debug for TypeRegistry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TypeRegistry")
      .field("signatures", &self.signatures())
      .finish()
  }
}
