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
          .table(UsersCreditsHistory::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UsersCreditsHistory::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(UsersCreditsHistory::UserId).integer().not_null())
          .col(
            ColumnDef::new(UsersCreditsHistory::CreditsBefore)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(UsersCreditsHistory::CreditsAfter)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(UsersCreditsHistory::GivenBy).integer().not_null(),
          )
          .col(
            ColumnDef::new(UsersCreditsHistory::CreatedAt)
              .date_time()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_users_credits_history_user")
              .from(UsersCreditsHistory::Table, UsersCreditsHistory::UserId)
              .to(Users::Table, Users::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(VideosProcessed::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(VideosProcessed::VideoId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(VideosProcessed::UserId).integer().not_null())
          .col(ColumnDef::new(VideosProcessed::LocationId).integer().not_null())
          .col(ColumnDef::new(VideosProcessed::Court).string().not_null())
          .col(ColumnDef::new(VideosProcessed::RecordedOn).date().not_null())
          .col(ColumnDef::new(VideosProcessed::StartTime).time().not_null())
          .col(ColumnDef::new(VideosProcessed::EndTime).time().not_null())
          .col(
            ColumnDef::new(VideosProcessed::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(
            ColumnDef::new(VideosProcessed::CreatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_videos_processed_user")
              .from(VideosProcessed::Table, VideosProcessed::UserId)
              .to(Users::Table, Users::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_videos_processed_location")
              .from(VideosProcessed::Table, VideosProcessed::LocationId)
              .to(Locations::Table, Locations::LocationId),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(VideosProcessed::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(UsersCreditsHistory::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum UsersCreditsHistory {
  Table,
  Id,
  UserId,
  CreditsBefore,
  CreditsAfter,
  GivenBy,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum VideosProcessed {
  Table,
  VideoId,
  UserId,
  LocationId,
  Court,
  RecordedOn,
  StartTime,
  EndTime,
  Status,
  CreatedAt,
}
