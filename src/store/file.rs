use std::{
  collections::{BTreeMap, BTreeSet},
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};

use super::{Append, Store};
use crate::{policy, prelude::*};

/// On-disk layout, readable from the legacy `db.json`:
/// `{"keys": {"PATRON001": {"devices": ["..."], "max": 2}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Document {
  #[serde(default)]
  keys: BTreeMap<String, Entry>,
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  bans: BTreeSet<String>,
  /// Unknown top-level fields survive rewrites.
  #[serde(flatten)]
  extra: json::Map<String, json::Value>,
}

/// Bound identities live under `devices`, or under `nicks` in documents
/// written by the nickname variant; rewrites keep whichever name was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  devices: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  nicks: Option<Vec<String>>,
  #[serde(rename = "max")]
  capacity: u32,
}

impl Entry {
  fn new(capacity: u32) -> Self {
    Self { devices: Some(Vec::new()), nicks: None, capacity }
  }

  fn identities(&self) -> &[String] {
    self.nicks.as_deref().or(self.devices.as_deref()).unwrap_or_default()
  }

  fn identities_mut(&mut self) -> &mut Vec<String> {
    match &mut self.nicks {
      Some(nicks) => nicks,
      None => self.devices.get_or_insert_with(Vec::new),
    }
  }

  fn to_key(&self, id: &str) -> LicenseKey {
    LicenseKey {
      id: id.to_owned(),
      capacity: self.capacity,
      identities: self.identities().to_vec(),
    }
  }
}

/// Single JSON document store. All writes are serialized through one lock and
/// hit the disk before they become visible.
pub struct File {
  path: PathBuf,
  policy: Policy,
  doc: RwLock<Document>,
}

impl File {
  pub async fn open(path: impl Into<PathBuf>, policy: Policy) -> Result<Self> {
    let path = path.into();

    let doc = match fs::read(&path).await {
      Ok(bytes) => json::from_slice(&bytes)?,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        info!("Creating new store at {}", path.display());
        let doc = Document::default();
        persist(&path, &doc).await?;
        doc
      }
      Err(err) => return Err(err.into()),
    };

    Ok(Self { path, policy, doc: RwLock::new(doc) })
  }

  /// Applies `f` to a copy of the document; the copy replaces the live one
  /// only once it has been written out.
  async fn update<T>(
    &self,
    f: impl FnOnce(&mut Document) -> Result<T> + Send,
  ) -> Result<T> {
    let mut doc = self.doc.write().await;
    let mut next = doc.clone();
    let out = f(&mut next)?;

    if next != *doc {
      persist(&self.path, &next).await?;
      *doc = next;
    }
    Ok(out)
  }
}

async fn persist(path: &Path, doc: &Document) -> Result<()> {
  let bytes = json::to_vec_pretty(doc)?;
  let tmp = path.with_extension("tmp");

  fs::write(&tmp, bytes).await?;
  fs::rename(&tmp, path).await?;
  Ok(())
}

#[async_trait]
impl Store for File {
  fn policy(&self) -> Policy {
    self.policy
  }

  async fn get_key(&self, id: &str) -> Result<Option<LicenseKey>> {
    let doc = self.doc.read().await;
    Ok(doc.keys.get(id).map(|entry| entry.to_key(id)))
  }

  async fn create_key(&self, id: &str, capacity: u32) -> Result<bool> {
    self
      .update(|doc| {
        if doc.keys.contains_key(id) {
          return Ok(false);
        }
        doc.keys.insert(id.to_owned(), Entry::new(capacity));
        Ok(true)
      })
      .await
  }

  async fn delete_key(&self, id: &str) -> Result<bool> {
    self.update(|doc| Ok(doc.keys.remove(id).is_some())).await
  }

  async fn append_identity(&self, key: &str, raw: &str) -> Result<Append> {
    let policy = self.policy;
    self
      .update(|doc| {
        let entry = doc.keys.get_mut(key).ok_or(Error::KeyNotFound)?;
        let capacity = entry.capacity as usize;
        let identities = entry.identities_mut();

        if identities.iter().any(|bound| policy.same(bound, raw)) {
          return Ok(Append::AlreadyBound);
        }
        if identities.len() >= capacity {
          return Err(Error::CapacityExceeded);
        }

        identities.push(raw.to_owned());
        Ok(Append::Bound)
      })
      .await
  }

  async fn remove_identity(&self, key: &str, raw: &str) -> Result<bool> {
    self
      .update(|doc| {
        let Some(entry) = doc.keys.get_mut(key) else {
          return Ok(false);
        };
        let Some(pos) = entry.identities().iter().position(|bound| bound == raw)
        else {
          return Ok(false);
        };
        entry.identities_mut().remove(pos);
        Ok(true)
      })
      .await
  }

  async fn is_banned(&self, identity: &str) -> Result<bool> {
    Ok(self.doc.read().await.bans.contains(&policy::normalize(identity)))
  }

  async fn ban(&self, identity: &str) -> Result<bool> {
    let identity = policy::normalize(identity);
    self.update(|doc| Ok(doc.bans.insert(identity))).await
  }

  async fn unban(&self, identity: &str) -> Result<bool> {
    let identity = policy::normalize(identity);
    self.update(|doc| Ok(doc.bans.remove(&identity))).await
  }

  async fn list_keys(&self) -> Result<Vec<LicenseKey>> {
    let doc = self.doc.read().await;
    Ok(doc.keys.iter().map(|(id, entry)| entry.to_key(id)).collect())
  }

  async fn list_bans(&self) -> Result<Vec<String>> {
    Ok(self.doc.read().await.bans.iter().cloned().collect())
  }
}
