use sea_orm_migration::prelude::*;

use super::{
  m20240901_000001_create_users::Users,
  m20240901_000002_create_entries::Entries,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(EntryCards::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(EntryCards::CardId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(EntryCards::UserId).integer().not_null())
          .col(
            ColumnDef::new(EntryCards::EntryCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(EntryCards::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(EntryCards::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_entry_cards_user")
              .from(EntryCards::Table, EntryCards::UserId)
              .to(Users::Table, Users::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_entry_cards_user_active")
          .table(EntryCards::Table)
          .col(EntryCards::UserId)
          .col(EntryCards::IsActive)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(CardEntries::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CardEntries::CardEntryId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(CardEntries::CardId).integer().not_null())
          .col(ColumnDef::new(CardEntries::EntryId).integer().not_null())
          .col(ColumnDef::new(CardEntries::NumOfEntries).integer().not_null())
          .col(
            ColumnDef::new(CardEntries::IsSpecial)
              .boolean()
              .not_null()
              .default(false),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_card_entries_card")
              .from(CardEntries::Table, CardEntries::CardId)
              .to(EntryCards::Table, EntryCards::CardId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_card_entries_entry")
              .from(CardEntries::Table, CardEntries::EntryId)
              .to(Entries::Table, Entries::EntryId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_card_entries_entry")
          .table(CardEntries::Table)
          .col(CardEntries::EntryId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CardEntries::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(EntryCards::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum EntryCards {
  Table,
  CardId,
  UserId,
  EntryCount,
  IsActive,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum CardEntries {
  Table,
  CardEntryId,
  CardId,
  EntryId,
  NumOfEntries,
  IsSpecial,
}
