//! Persistent state: license keys, their bound identities and the ban list.
//!
//! Every mutation is atomic per call: it is either fully applied before the
//! call returns or fails leaving state untouched. Mutations of one key are
//! serialized, so the capacity check and the append can not interleave with
//! another registration for the same key.

mod file;
mod sql;

use async_trait::async_trait;

pub use self::{file::File, sql::Sql};
use crate::prelude::*;

/// Outcome of a successful `append_identity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
  Bound,
  AlreadyBound,
}

#[async_trait]
pub trait Store: Send + Sync {
  fn policy(&self) -> Policy;

  async fn get_key(&self, id: &str) -> Result<Option<LicenseKey>>;

  /// Returns `false` without touching the key when `id` already exists.
  async fn create_key(&self, id: &str, capacity: u32) -> Result<bool>;

  /// Removes the key with all its bindings. Returns `false` if absent.
  async fn delete_key(&self, id: &str) -> Result<bool>;

  /// Fails with [`Error::KeyNotFound`] or [`Error::CapacityExceeded`].
  async fn append_identity(&self, key: &str, identity: &str) -> Result<Append>;

  /// Removes the first exact match. Returns `false` if nothing was removed.
  async fn remove_identity(&self, key: &str, identity: &str) -> Result<bool>;

  async fn is_banned(&self, identity: &str) -> Result<bool>;

  /// Returns `false` if the identity was already banned.
  async fn ban(&self, identity: &str) -> Result<bool>;

  /// Returns `false` if the identity was not banned.
  async fn unban(&self, identity: &str) -> Result<bool>;

  async fn list_keys(&self) -> Result<Vec<LicenseKey>>;

  async fn list_bans(&self) -> Result<Vec<String>>;
}

/// Per-key async locks.
#[derive(Default)]
pub(crate) struct Locks {
  inner: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl Locks {
  pub async fn lock(&self, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
    // entries are never removed: a waiter holding a stale mutex would
    // otherwise race a newcomer on a fresh one
    let mutex = self.inner.entry(key.to_owned()).or_default().clone();
    mutex.lock_owned().await
  }
}
