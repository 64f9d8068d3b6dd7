//! Identity comparison policy
//!
//! Keys bind either hardware fingerprints (`device`) or user nicknames
//! (`nickname`). Devices compare exactly and have no ban list; nicknames
//! compare case-insensitively and are subject to the global ban list.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
  #[default]
  Device,
  Nickname,
}

impl Policy {
  /// Comparison form of an identity. Two identities are the same binding iff
  /// their folds are equal.
  pub fn fold(self, identity: &str) -> String {
    match self {
      Policy::Device => identity.to_owned(),
      Policy::Nickname => identity.to_lowercase(),
    }
  }

  pub fn same(self, a: &str, b: &str) -> bool {
    match self {
      Policy::Device => a == b,
      Policy::Nickname => self.fold(a) == self.fold(b),
    }
  }

  pub fn has_bans(self) -> bool {
    matches!(self, Policy::Nickname)
  }
}

/// Stored form of a ban entry. Idempotent: `normalize(normalize(x)) ==
/// normalize(x)`.
pub fn normalize(identity: &str) -> String {
  identity.trim().to_lowercase()
}

impl FromStr for Policy {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "device" | "devices" => Ok(Policy::Device),
      "nickname" | "nick" | "nicks" => Ok(Policy::Nickname),
      other => Err(format!("unknown identity mode `{other}`")),
    }
  }
}

impl fmt::Display for Policy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Policy::Device => f.write_str("device"),
      Policy::Nickname => f.write_str("nickname"),
    }
  }
}
