use crate::{
  policy::normalize,
  prelude::*,
  store::{Append, Store},
};

/// Admission decisions for client registrations.
pub struct Admission<'a> {
  store: &'a dyn Store,
}

impl<'a> Admission<'a> {
  pub fn new(store: &'a dyn Store) -> Self {
    Self { store }
  }

  /// Binds `identity` to `key` if the key has room. Domain rejections come
  /// back as a negative [`Verdict`]; `Err` is reserved for storage failures.
  pub async fn register(&self, key: &str, identity: &str) -> Result<Verdict> {
    if key.trim().is_empty() || identity.trim().is_empty() {
      return Ok(Verdict::reject(Reason::MissingData));
    }

    let policy = self.store.policy();
    if policy.has_bans() && self.store.is_banned(&normalize(identity)).await? {
      debug!("Rejected banned identity `{identity}` on key `{key}`");
      return Ok(Verdict::reject(Reason::IdentityBanned));
    }

    let Some(license) = self.store.get_key(key).await? else {
      return Ok(Verdict::reject(Reason::InvalidKey));
    };

    if license.identities.iter().any(|bound| policy.same(bound, identity)) {
      return Ok(Verdict::admit());
    }

    if license.is_full() {
      return Ok(Verdict::reject(Reason::QuotaExceeded));
    }

    // the store re-checks everything under the key lock
    match self.store.append_identity(key, identity).await {
      Ok(Append::Bound) => {
        info!("Bound `{identity}` to key `{key}`");
        Ok(Verdict::admit())
      }
      Ok(Append::AlreadyBound) => Ok(Verdict::admit()),
      Err(Error::CapacityExceeded) => {
        Ok(Verdict::reject(Reason::QuotaExceeded))
      }
      Err(Error::KeyNotFound) => Ok(Verdict::reject(Reason::InvalidKey)),
      Err(err) => Err(err),
    }
  }

  /// Read-only: admitted iff the key exists, the identity is bound to it and
  /// is not banned.
  pub async fn validate(&self, key: &str, identity: &str) -> Result<Verdict> {
    if key.trim().is_empty() || identity.trim().is_empty() {
      return Ok(Verdict::deny());
    }

    let policy = self.store.policy();
    if policy.has_bans() && self.store.is_banned(&normalize(identity)).await? {
      return Ok(Verdict::deny());
    }

    let bound = self.store.get_key(key).await?.is_some_and(|license| {
      license.identities.iter().any(|bound| policy.same(bound, identity))
    });

    Ok(if bound { Verdict::admit() } else { Verdict::deny() })
  }
}
