use uuid::Uuid;

use crate::{prelude::*, state::Config, store::Store};

/// Admin-side key management.
pub struct Keys<'a> {
  store: &'a dyn Store,
  config: &'a Config,
}

impl<'a> Keys<'a> {
  pub fn new(store: &'a dyn Store, config: &'a Config) -> Self {
    Self { store, config }
  }

  fn normalize_id(&self, id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
      return Err(Error::InvalidArgs("Key must not be empty".into()));
    }
    Ok(if self.config.uppercase_keys { id.to_uppercase() } else { id.into() })
  }

  /// Creates `id` unless it already exists; an existing key keeps its
  /// capacity and bindings. Returns the stored key and whether it is new.
  pub async fn create(
    &self,
    id: &str,
    capacity: Option<u32>,
  ) -> Result<(LicenseKey, bool)> {
    let id = self.normalize_id(id)?;
    let capacity = capacity.unwrap_or(self.config.default_capacity);
    if capacity == 0 {
      return Err(Error::InvalidArgs("Capacity must be positive".into()));
    }

    let created = self.store.create_key(&id, capacity).await?;
    if created {
      info!("Created key `{id}` with capacity {capacity}");
    } else {
      debug!("Key `{id}` already exists, leaving it untouched");
    }

    // a concurrent revoke may have removed it already
    let stored = self.store.get_key(&id).await?;
    Ok((stored.unwrap_or_else(|| LicenseKey::new(id, capacity)), created))
  }

  /// Mints a fresh random key.
  pub async fn generate(&self, capacity: Option<u32>) -> Result<LicenseKey> {
    loop {
      let id = Uuid::new_v4().simple().to_string()[..16].to_uppercase();
      let (key, created) = self.create(&id, capacity).await?;
      if created {
        return Ok(key);
      }
    }
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<LicenseKey>> {
    self.store.get_key(&self.normalize_id(id)?).await
  }

  pub async fn all(&self) -> Result<Vec<LicenseKey>> {
    self.store.list_keys().await
  }

  /// Deletes the key with all its bindings.
  pub async fn revoke(&self, id: &str) -> Result<bool> {
    let id = self.normalize_id(id)?;
    let removed = self.store.delete_key(&id).await?;
    if removed {
      info!("Revoked key `{id}`");
    }
    Ok(removed)
  }

  /// Frees the slot taken by `identity` on `id`.
  pub async fn unbind(&self, id: &str, identity: &str) -> Result<bool> {
    let id = self.normalize_id(id)?;
    let removed = self.store.remove_identity(&id, identity).await?;
    if removed {
      info!("Unbound `{identity}` from key `{id}`");
    }
    Ok(removed)
  }
}
