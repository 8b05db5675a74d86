// maestro/src/core/context.rs

//! The shared, concurrency-safe orchestration context: a map from typed keys
//! to type-erased values, threaded through every step of a run.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque, typed token naming one slot in the [`Context`].
///
/// Identity, not the display name, determines the slot: every call to
/// [`Key::new`] yields a distinct key, so two keys created with the same name
/// address two different slots. The name exists for diagnostics only.
///
/// Cloning a key is cheap and preserves identity, which is how a caller reads
/// back a value produced by a step registered with that key.
pub struct Key<T> {
  id: u64,
  name: Arc<str>,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
  /// Creates a fresh key with a human-readable name for diagnostics.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
      name: Arc::from(name.into()),
      _marker: PhantomData,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn id(&self) -> u64 {
    self.id
  }
}

impl<T> Clone for Key<T> {
  fn clone(&self) -> Self {
    Self {
      id: self.id,
      name: Arc::clone(&self.name),
      _marker: PhantomData,
    }
  }
}

impl<T> PartialEq for Key<T> {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl<T> Eq for Key<T> {}

impl<T> std::fmt::Debug for Key<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Key[{}]", self.name)
  }
}

type Slot = Arc<dyn Any + Send + Sync>;

/// The shared context for one orchestration run.
///
/// Internally an `Arc<RwLock<..>>`, so cloning shares the same store: every
/// step of a run (including members of a parallel group, each on its own
/// task) sees the same slots. Reads and writes for disjoint keys are safe
/// under concurrency; concurrent writes to the *same* key from a parallel
/// group are last-write-wins with no ordering guarantee, so steps within one
/// group should not contend on a shared output key.
#[derive(Clone)]
pub struct Context {
  store: Arc<RwLock<HashMap<u64, Slot>>>,
}

impl Context {
  pub fn new() -> Self {
    Self {
      store: Arc::new(RwLock::new(HashMap::new())),
    }
  }

  /// Stores `value` under `key`, replacing any previous value in that slot.
  pub fn put<T: Send + Sync + 'static>(&self, key: &Key<T>, value: T) {
    self.store.write().insert(key.id(), Arc::new(value));
  }

  /// Retrieves the value stored under `key`, if any.
  ///
  /// The slot type is guaranteed by construction (only `put` with the same
  /// typed key can fill it), so the downcast here cannot fail for keys used
  /// through this API.
  pub fn get<T: Send + Sync + 'static>(&self, key: &Key<T>) -> Option<Arc<T>> {
    let slot = self.store.read().get(&key.id()).cloned()?;
    slot.downcast::<T>().ok()
  }

  pub fn contains<T>(&self, key: &Key<T>) -> bool {
    self.store.read().contains_key(&key.id())
  }

  pub fn len(&self) -> usize {
    self.store.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.read().is_empty()
  }

  /// Returns an immutable point-in-time copy of the store.
  ///
  /// Later `put`s on this context are not visible through the snapshot.
  pub fn snapshot(&self) -> ContextSnapshot {
    ContextSnapshot {
      store: self.store.read().clone(),
    }
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for Context {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Context").field("len", &self.len()).finish()
  }
}

/// A frozen copy of a [`Context`] taken at a single point in time.
#[derive(Clone)]
pub struct ContextSnapshot {
  store: HashMap<u64, Slot>,
}

impl ContextSnapshot {
  pub fn get<T: Send + Sync + 'static>(&self, key: &Key<T>) -> Option<Arc<T>> {
    let slot = self.store.get(&key.id()).cloned()?;
    slot.downcast::<T>().ok()
  }

  pub fn contains<T>(&self, key: &Key<T>) -> bool {
    self.store.contains_key(&key.id())
  }

  pub fn len(&self) -> usize {
    self.store.len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.is_empty()
  }
}

impl std::fmt::Debug for ContextSnapshot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ContextSnapshot").field("len", &self.len()).finish()
  }
}
