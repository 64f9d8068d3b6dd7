use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Keys::Table)
          .if_not_exists()
          .col(ColumnDef::new(Keys::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Keys::Capacity).integer().not_null().default(2))
          .col(ColumnDef::new(Keys::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Keys::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Keys {
  Table,
  Id,
  Capacity,
  CreatedAt,
}
