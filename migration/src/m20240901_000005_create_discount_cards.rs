use sea_orm_migration::prelude::*;

use super::m20240901_000001_create_users::Users;

/// Off-peak and off-pick cards share one layout, each with its own pair of
/// tables (`<kind>_cards`, `user_<kind>_cards`).
const KINDS: [&str; 2] = ["offpeak", "offpick"];

#[derive(DeriveMigrationName)]
pub struct Migration;

fn cards_table(kind: &str) -> TableCreateStatement {
  Table::create()
    .table(Alias::new(format!("{kind}_cards")))
    .if_not_exists()
    .col(
      ColumnDef::new(Cards::CardId)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key(),
    )
    .col(ColumnDef::new(Cards::Name).string().not_null())
    .col(ColumnDef::new(Cards::Month).integer().not_null())
    .col(ColumnDef::new(Cards::Year).integer().not_null())
    .col(ColumnDef::new(Cards::IsActive).boolean().not_null().default(true))
    .col(ColumnDef::new(Cards::CreatedAt).date_time().not_null())
    .to_owned()
}

fn assignments_table(kind: &str) -> TableCreateStatement {
  Table::create()
    .table(Alias::new(format!("user_{kind}_cards")))
    .if_not_exists()
    .col(
      ColumnDef::new(Assignments::Id)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key(),
    )
    .col(ColumnDef::new(Assignments::UserId).integer().not_null())
    .col(ColumnDef::new(Assignments::CardId).integer().not_null())
    .col(ColumnDef::new(Assignments::AssignedBy).integer().not_null())
    .col(ColumnDef::new(Assignments::AssignedAt).date_time().not_null())
    .foreign_key(
      ForeignKey::create()
        .name(format!("fk_user_{kind}_cards_user"))
        .from(Alias::new(format!("user_{kind}_cards")), Assignments::UserId)
        .to(Users::Table, Users::UserId)
        .on_delete(ForeignKeyAction::Cascade),
    )
    .foreign_key(
      ForeignKey::create()
        .name(format!("fk_user_{kind}_cards_card"))
        .from(Alias::new(format!("user_{kind}_cards")), Assignments::CardId)
        .to(Alias::new(format!("{kind}_cards")), Cards::CardId)
        .on_delete(ForeignKeyAction::Cascade),
    )
    .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    for kind in KINDS {
      manager.create_table(cards_table(kind)).await?;
      manager.create_table(assignments_table(kind)).await?;

      manager
        .create_index(
          Index::create()
            .name(format!("idx_user_{kind}_cards_unique"))
            .table(Alias::new(format!("user_{kind}_cards")))
            .col(Assignments::UserId)
            .col(Assignments::CardId)
            .unique()
            .to_owned(),
        )
        .await?;
    }
    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    for kind in KINDS {
      manager
        .drop_table(
          Table::drop()
            .table(Alias::new(format!("user_{kind}_cards")))
            .to_owned(),
        )
        .await?;
      manager
        .drop_table(
          Table::drop().table(Alias::new(format!("{kind}_cards"))).to_owned(),
        )
        .await?;
    }
    Ok(())
  }
}

#[derive(DeriveIden)]
enum Cards {
  CardId,
  Name,
  Month,
  Year,
  IsActive,
  CreatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
  Id,
  UserId,
  CardId,
  AssignedBy,
  AssignedAt,
}
