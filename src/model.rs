use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseKey {
  /// License key
  pub id: String,
  /// Maximum number of identities bound at once
  pub capacity: u32,
  /// Bound devices or nicknames, in registration order
  pub identities: Vec<String>,
}

impl LicenseKey {
  pub fn new(id: impl Into<String>, capacity: u32) -> Self {
    Self { id: id.into(), capacity, identities: Vec::new() }
  }

  pub fn is_full(&self) -> bool {
    self.identities.len() >= self.capacity as usize
  }
}

/// Why a registration was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
  MissingData,
  IdentityBanned,
  InvalidKey,
  QuotaExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
  pub admitted: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<Reason>,
}

impl Verdict {
  pub fn admit() -> Self {
    Self { admitted: true, reason: None }
  }

  pub fn reject(reason: Reason) -> Self {
    Self { admitted: false, reason: Some(reason) }
  }

  /// Negative answer without a domain reason, used by `validate` and on
  /// storage failure.
  pub fn deny() -> Self {
    Self { admitted: false, reason: None }
  }
}
