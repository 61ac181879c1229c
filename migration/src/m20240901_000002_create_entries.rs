use sea_orm_migration::prelude::*;

use super::m20240901_000001_create_users::{Locations, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Entries::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Entries::EntryId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Entries::UserId).integer().not_null())
          .col(ColumnDef::new(Entries::LocationId).integer().not_null())
          .col(ColumnDef::new(Entries::EntryTime).date_time().not_null())
          .col(ColumnDef::new(Entries::ValidatedBy).integer().null())
          .col(ColumnDef::new(Entries::ValidatedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_entries_user")
              .from(Entries::Table, Entries::UserId)
              .to(Users::Table, Users::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_entries_location")
              .from(Entries::Table, Entries::LocationId)
              .to(Locations::Table, Locations::LocationId),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_entries_user_time")
          .table(Entries::Table)
          .col(Entries::UserId)
          .col(Entries::EntryTime)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Entries::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Entries {
  Table,
  EntryId,
  UserId,
  LocationId,
  EntryTime,
  ValidatedBy,
  ValidatedAt,
}
