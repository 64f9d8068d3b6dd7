use std::collections::HashMap;

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, NotSet};

use super::{Append, Locks, Store};
use crate::{
  entity::{ban, identity, key},
  policy,
  prelude::*,
};

/// Relational backend (SQLite or Postgres through SeaORM).
pub struct Sql {
  db: DatabaseConnection,
  policy: Policy,
  locks: Locks,
  bans: tokio::sync::Mutex<()>,
}

impl Sql {
  pub async fn connect(
    url: &str,
    policy: Policy,
    timeout: Option<Duration>,
  ) -> Result<Self> {
    let mut options = ConnectOptions::new(url);
    options.sqlx_logging(false);

    if let Some(timeout) = timeout {
      options.connect_timeout(timeout).acquire_timeout(timeout);
    }
    // every connection to `:memory:` opens its own database
    if url.contains(":memory:") {
      options.max_connections(1).min_connections(1);
    }

    info!("Connecting to database...");
    let db = Database::connect(options).await?;

    info!("Running migrations...");
    Migrator::up(&db, None).await?;

    Ok(Self::new(db, policy))
  }

  pub fn new(db: DatabaseConnection, policy: Policy) -> Self {
    Self {
      db,
      policy,
      locks: Locks::default(),
      bans: tokio::sync::Mutex::new(()),
    }
  }

  async fn identities(
    &self,
    db: &impl ConnectionTrait,
    key_id: &str,
  ) -> Result<Vec<String>> {
    let bound = identity::Entity::find()
      .filter(identity::Column::KeyId.eq(key_id))
      .order_by_asc(identity::Column::Id)
      .all(db)
      .await?;
    Ok(bound.into_iter().map(|model| model.identity).collect())
  }
}

fn to_key(model: key::Model, identities: Vec<String>) -> LicenseKey {
  LicenseKey {
    id: model.id,
    capacity: model.capacity.max(0) as u32,
    identities,
  }
}

#[async_trait]
impl Store for Sql {
  fn policy(&self) -> Policy {
    self.policy
  }

  async fn get_key(&self, id: &str) -> Result<Option<LicenseKey>> {
    let Some(model) = key::Entity::find_by_id(id).one(&self.db).await? else {
      return Ok(None);
    };
    let identities = self.identities(&self.db, id).await?;
    Ok(Some(to_key(model, identities)))
  }

  async fn create_key(&self, id: &str, capacity: u32) -> Result<bool> {
    let _guard = self.locks.lock(id).await;

    if key::Entity::find_by_id(id).one(&self.db).await?.is_some() {
      return Ok(false);
    }

    key::ActiveModel {
      id: Set(id.to_owned()),
      capacity: Set(capacity.min(i32::MAX as u32) as i32),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&self.db)
    .await?;

    Ok(true)
  }

  async fn delete_key(&self, id: &str) -> Result<bool> {
    let _guard = self.locks.lock(id).await;
    let txn = self.db.begin().await?;

    identity::Entity::delete_many()
      .filter(identity::Column::KeyId.eq(id))
      .exec(&txn)
      .await?;
    let deleted = key::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(deleted.rows_affected > 0)
  }

  async fn append_identity(&self, key_id: &str, raw: &str) -> Result<Append> {
    let _guard = self.locks.lock(key_id).await;
    let txn = self.db.begin().await?;

    let key = key::Entity::find_by_id(key_id)
      .one(&txn)
      .await?
      .ok_or(Error::KeyNotFound)?;

    let fold = self.policy.fold(raw);
    let bound = identity::Entity::find()
      .filter(identity::Column::KeyId.eq(key_id))
      .filter(identity::Column::Fold.eq(fold.as_str()))
      .one(&txn)
      .await?;
    if bound.is_some() {
      return Ok(Append::AlreadyBound);
    }

    let count = identity::Entity::find()
      .filter(identity::Column::KeyId.eq(key_id))
      .count(&txn)
      .await?;
    if count >= key.capacity.max(0) as u64 {
      return Err(Error::CapacityExceeded);
    }

    identity::ActiveModel {
      id: NotSet,
      key_id: Set(key_id.to_owned()),
      identity: Set(raw.to_owned()),
      fold: Set(fold),
      bound_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(Append::Bound)
  }

  async fn remove_identity(&self, key_id: &str, raw: &str) -> Result<bool> {
    let _guard = self.locks.lock(key_id).await;

    let Some(bound) = identity::Entity::find()
      .filter(identity::Column::KeyId.eq(key_id))
      .filter(identity::Column::Identity.eq(raw))
      .order_by_asc(identity::Column::Id)
      .one(&self.db)
      .await?
    else {
      return Ok(false);
    };

    identity::Entity::delete_by_id(bound.id).exec(&self.db).await?;
    Ok(true)
  }

  async fn is_banned(&self, identity: &str) -> Result<bool> {
    let entry =
      ban::Entity::find_by_id(policy::normalize(identity)).one(&self.db).await?;
    Ok(entry.is_some())
  }

  async fn ban(&self, identity: &str) -> Result<bool> {
    let identity = policy::normalize(identity);
    let _guard = self.bans.lock().await;

    if ban::Entity::find_by_id(identity.as_str()).one(&self.db).await?.is_some()
    {
      return Ok(false);
    }

    ban::ActiveModel {
      identity: Set(identity),
      banned_at: Set(Utc::now().naive_utc()),
    }
    .insert(&self.db)
    .await?;

    Ok(true)
  }

  async fn unban(&self, identity: &str) -> Result<bool> {
    let _guard = self.bans.lock().await;
    let deleted = ban::Entity::delete_by_id(policy::normalize(identity))
      .exec(&self.db)
      .await?;
    Ok(deleted.rows_affected > 0)
  }

  async fn list_keys(&self) -> Result<Vec<LicenseKey>> {
    let keys =
      key::Entity::find().order_by_asc(key::Column::Id).all(&self.db).await?;

    let mut bound: HashMap<String, Vec<String>> = HashMap::new();
    for model in identity::Entity::find()
      .order_by_asc(identity::Column::Id)
      .all(&self.db)
      .await?
    {
      bound.entry(model.key_id).or_default().push(model.identity);
    }

    Ok(
      keys
        .into_iter()
        .map(|model| {
          let identities = bound.remove(&model.id).unwrap_or_default();
          to_key(model, identities)
        })
        .collect(),
    )
  }

  async fn list_bans(&self) -> Result<Vec<String>> {
    let bans = ban::Entity::find()
      .order_by_asc(ban::Column::Identity)
      .all(&self.db)
      .await?;
    Ok(bans.into_iter().map(|model| model.identity).collect())
  }
}
