//! Database migrations using SeaORM

pub use sea_orm_migration::prelude::*;

mod m20240901_000001_create_users;
mod m20240901_000002_create_entries;
mod m20240901_000003_create_entry_cards;
mod m20240901_000004_create_vouchers;
mod m20240901_000005_create_discount_cards;
mod m20240901_000006_create_store;
mod m20240901_000007_create_articles;
mod m20240901_000008_create_video_credits;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20240901_000001_create_users::Migration),
      Box::new(m20240901_000002_create_entries::Migration),
      Box::new(m20240901_000003_create_entry_cards::Migration),
      Box::new(m20240901_000004_create_vouchers::Migration),
      Box::new(m20240901_000005_create_discount_cards::Migration),
      Box::new(m20240901_000006_create_store::Migration),
      Box::new(m20240901_000007_create_articles::Migration),
      Box::new(m20240901_000008_create_video_credits::Migration),
    ]
  }
}
