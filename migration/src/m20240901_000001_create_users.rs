use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Users::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Users::UserId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
          .col(ColumnDef::new(Users::Phone).string().null().unique_key())
          .col(ColumnDef::new(Users::Password).string().not_null())
          .col(ColumnDef::new(Users::FirstName).string().null())
          .col(ColumnDef::new(Users::LastName).string().null())
          .col(ColumnDef::new(Users::Birthdate).date_time().null())
          .col(
            ColumnDef::new(Users::UserType)
              .string()
              .not_null()
              .default("player"),
          )
          .col(
            ColumnDef::new(Users::VideoCredits)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Locations::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Locations::LocationId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Locations::Name).string().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Locations::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Users {
  Table,
  UserId,
  Email,
  Phone,
  Password,
  FirstName,
  LastName,
  Birthdate,
  UserType,
  VideoCredits,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Locations {
  Table,
  LocationId,
  Name,
}
