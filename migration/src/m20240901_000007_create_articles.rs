use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Articles::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Articles::ArticleId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Articles::Title).string().not_null())
          .col(ColumnDef::new(Articles::Content).text().not_null())
          .col(ColumnDef::new(Articles::Author).string().null())
          .col(ColumnDef::new(Articles::ImageUrl).string().null())
          .col(
            ColumnDef::new(Articles::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Articles::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Configs::Table)
          .if_not_exists()
          .col(ColumnDef::new(Configs::Name).string().not_null().primary_key())
          .col(ColumnDef::new(Configs::Href).string().null())
          .to_owned(),
      )
      .await?;

    let seed = Query::insert()
      .into_table(Configs::Table)
      .columns([Configs::Name, Configs::Href])
      .values_panic(["Torneios".into(), "".into()])
      .values_panic(["Ligas".into(), "".into()])
      .to_owned();

    manager.exec_stmt(seed).await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Configs::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Articles::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Articles {
  Table,
  ArticleId,
  Title,
  Content,
  Author,
  ImageUrl,
  IsActive,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Configs {
  Table,
  Name,
  Href,
}
