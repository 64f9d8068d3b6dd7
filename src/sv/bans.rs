use crate::{policy::normalize, prelude::*, store::Store};

/// Global ban list, nickname mode only.
pub struct Bans<'a> {
  store: &'a dyn Store,
}

impl<'a> Bans<'a> {
  pub fn new(store: &'a dyn Store) -> Self {
    Self { store }
  }

  fn ensure_enabled(&self) -> Result<()> {
    if self.store.policy().has_bans() {
      Ok(())
    } else {
      Err(Error::BansDisabled)
    }
  }

  fn checked(&self, identity: &str) -> Result<()> {
    self.ensure_enabled()?;
    if normalize(identity).is_empty() {
      return Err(Error::InvalidArgs("Identity must not be empty".into()));
    }
    Ok(())
  }

  pub async fn ban(&self, identity: &str) -> Result<bool> {
    self.checked(identity)?;
    let added = self.store.ban(identity).await?;
    if added {
      info!("Banned `{}`", normalize(identity));
    }
    Ok(added)
  }

  pub async fn unban(&self, identity: &str) -> Result<bool> {
    self.checked(identity)?;
    let removed = self.store.unban(identity).await?;
    if removed {
      info!("Unbanned `{}`", normalize(identity));
    }
    Ok(removed)
  }

  pub async fn all(&self) -> Result<Vec<String>> {
    self.ensure_enabled()?;
    self.store.list_bans().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::tests::sql;

  #[tokio::test]
  async fn test_ban_unban() {
    let store = sql(Policy::Nickname).await;
    let sv = Bans::new(&*store);

    assert!(sv.ban("BadUser").await.unwrap());
    assert!(!sv.ban("baduser").await.unwrap());
    assert_eq!(sv.all().await.unwrap(), vec!["baduser".to_string()]);

    assert!(sv.unban("BADUSER").await.unwrap());
    assert!(!sv.unban("baduser").await.unwrap());
    assert!(sv.all().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_disabled_in_device_mode() {
    let store = sql(Policy::Device).await;
    let sv = Bans::new(&*store);

    assert!(matches!(sv.ban("x").await, Err(Error::BansDisabled)));
    assert!(matches!(sv.all().await, Err(Error::BansDisabled)));
  }

  #[tokio::test]
  async fn test_empty_identity() {
    let store = sql(Policy::Nickname).await;
    let sv = Bans::new(&*store);

    assert!(matches!(sv.ban("   ").await, Err(Error::InvalidArgs(_))));
  }
}
