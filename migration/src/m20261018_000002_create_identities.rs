use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_keys::Keys;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Identities::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Identities::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Identities::KeyId).string().not_null())
          .col(ColumnDef::new(Identities::Identity).string().not_null())
          .col(ColumnDef::new(Identities::Fold).string().not_null())
          .col(ColumnDef::new(Identities::BoundAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_identities_key")
              .from(Identities::Table, Identities::KeyId)
              .to(Keys::Table, Keys::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // one binding per key and comparison form
    manager
      .create_index(
        Index::create()
          .name("idx_identities_key_fold")
          .table(Identities::Table)
          .col(Identities::KeyId)
          .col(Identities::Fold)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Identities::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Identities {
  Table,
  Id,
  KeyId,
  Identity,
  Fold,
  BoundAt,
}
