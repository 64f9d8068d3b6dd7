use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::key;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "identities")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub key_id: String,
  /// identity as presented by the client
  pub identity: String,
  /// comparison form under the active identity policy
  pub fold: String,
  pub bound_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "key::Entity",
    from = "Column::KeyId",
    to = "key::Column::Id",
    on_delete = "Cascade"
  )]
  Key,
}

impl Related<key::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Key.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
