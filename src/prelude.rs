pub use std::{sync::Arc, time::Duration};

pub use anyhow::Context;
pub use chrono::Utc;
pub use dashmap::DashMap;
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
  EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
  TransactionTrait,
};
pub use tracing::{debug, error, info, warn};

pub use crate::error::{Error, Result};
pub use crate::model::{LicenseKey, Reason, Verdict};
pub use crate::policy::Policy;
