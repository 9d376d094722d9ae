use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type SharedValue = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct IdentityKey {
  type_id: TypeId,
  address: usize,
}

impl IdentityKey {
  fn of<T: Send + Sync + 'static>(value: &Arc<T>) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      address: Arc::as_ptr(value) as *const () as usize,
    }
  }
}

/// Numbering of shared values exchanged on one connection.
///
/// Sent and received values live in separate namespaces: ids this side
/// assigns while encoding never meet ids the peer chose, so a peer cannot
/// redirect a local id or push the local counter.
///
/// Sent ids start at 1 and increase. The map holds a strong reference to every
/// numbered value, so addresses stay unique for as long as their id is
/// assigned. [`IdentityMap::clear`] releases them.
pub struct IdentityMap {
  sent: HashMap<u64, SharedValue>,
  sent_ids: HashMap<IdentityKey, u64>,
  received: HashMap<u64, SharedValue>,
  next_id: u64,
}

impl IdentityMap {
  pub fn new() -> Self {
    Self {
      sent: HashMap::new(),
      sent_ids: HashMap::new(),
      received: HashMap::new(),
      next_id: 1,
    }
  }

  /// Id assigned to `value` by an earlier [`IdentityMap::register`].
  pub fn id_of<T: Send + Sync + 'static>(&self, value: &Arc<T>) -> Option<u64> {
    self.sent_ids.get(&IdentityKey::of(value)).copied()
  }

  /// Returns the id of `value`, assigning the next free one on first sight.
  /// `None` once the id space is used up.
  pub fn register<T: Send + Sync + 'static>(&mut self, value: &Arc<T>) -> Option<u64> {
    if let Some(id) = self.id_of(value) {
      return Some(id);
    }
    if self.next_id == u64::MAX {
      return None;
    }
    let id = self.next_id;
    self.next_id += 1;
    self.sent.insert(id, value.clone() as SharedValue);
    self.sent_ids.insert(IdentityKey::of(value), id);
    Some(id)
  }

  /// The id the next [`IdentityMap::register`] would assign. Pass it to
  /// [`IdentityMap::rollback`] to undo everything registered after this point.
  pub fn mark(&self) -> u64 {
    self.next_id
  }

  /// Forgets every sent id at or above `mark`.
  pub fn rollback(&mut self, mark: u64) {
    if mark >= self.next_id {
      return;
    }
    self.sent.retain(|id, _| *id < mark);
    self.sent_ids.retain(|_, id| *id < mark);
    self.next_id = mark;
  }

  /// Binds a received `value` to the id the peer chose for it. Returns `false`
  /// and leaves the map untouched when that id is already bound.
  pub fn bind<T: Send + Sync + 'static>(&mut self, id: u64, value: &Arc<T>) -> bool {
    if self.received.contains_key(&id) {
      return false;
    }
    self.received.insert(id, value.clone() as SharedValue);
    true
  }

  /// Looks up the received value bound to `id`. `None` when the id is unbound
  /// or bound to a value of another type.
  pub fn resolve<T: Send + Sync + 'static>(&self, id: u64) -> Option<Arc<T>> {
    self
      .received
      .get(&id)
      .cloned()
      .and_then(|value| value.downcast::<T>().ok())
  }

  pub fn is_bound(&self, id: u64) -> bool {
    self.received.contains_key(&id)
  }

  pub fn sent_len(&self) -> usize {
    self.sent.len()
  }

  pub fn received_len(&self) -> usize {
    self.received.len()
  }

  pub fn len(&self) -> usize {
    self.sent.len() + self.received.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sent.is_empty() && self.received.is_empty()
  }

  pub fn clear(&mut self) {
    self.sent.clear();
    self.sent_ids.clear();
    self.received.clear();
    self.next_id = 1;
  }
}

impl Default for IdentityMap {
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for IdentityMap {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IdentityMap")
      .field("sent", &self.sent.len())
      .field("received", &self.received.len())
      .field("next_id", &self.next_id)
      .finish()
  }
}
