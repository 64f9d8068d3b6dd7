//! License keys and their binding capacity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::identity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keys")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub capacity: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "identity::Entity")]
  Identity,
}

impl Related<identity::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Identity.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
