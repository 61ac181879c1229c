pub mod article;
pub mod card;
pub mod credits;
pub mod discount;
pub mod entry;
pub mod order;
pub mod product;
pub mod settings;
pub mod user;
pub mod video;
pub mod voucher;

use serde::Serialize;

pub use article::Article;
pub use card::Card;
pub use credits::Credits;
pub use discount::{Offpeak, Offpick};
pub use entry::Entry;
pub use order::Order;
pub use product::Product;
pub use settings::Settings;
pub use user::User;
pub use video::Video;
pub use voucher::Voucher;

/// Outcome of a best-effort batch: every id lands in exactly one bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
  pub succeeded: Vec<i32>,
  pub failed: Vec<i32>,
  pub skipped: Vec<i32>,
}

impl BatchResult {
  pub fn is_clean(&self) -> bool {
    self.failed.is_empty()
  }

  /// Nothing was attempted because every id was skipped.
  pub fn all_skipped(&self) -> bool {
    self.succeeded.is_empty() && self.failed.is_empty()
  }
}

#[cfg(test)]
pub mod testing {
  use migration::Migrator;

  use crate::{
    entity::{UserType, location, user},
    prelude::*,
  };

  pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
  }

  pub async fn user(db: &DatabaseConnection, email: &str) -> user::Model {
    user::ActiveModel {
      email: Set(email.to_string()),
      phone: Set(None),
      password: Set(String::from("x")),
      first_name: Set(Some(String::from("Ana"))),
      last_name: Set(None),
      birthdate: Set(None),
      user_type: Set(UserType::Player),
      video_credits: Set(0),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn admin(db: &DatabaseConnection) -> user::Model {
    let admin = user(db, "admin@club.pt").await;
    user::ActiveModel { user_type: Set(UserType::Admin), ..admin.into() }
      .update(db)
      .await
      .unwrap()
  }

  pub async fn credits(db: &DatabaseConnection, user_id: i32) -> i32 {
    user::Entity::find_by_id(user_id)
      .one(db)
      .await
      .unwrap()
      .unwrap()
      .video_credits
  }

  pub async fn location(
    db: &DatabaseConnection,
    name: &str,
  ) -> location::Model {
    location::ActiveModel { name: Set(name.to_string()), ..Default::default() }
      .insert(db)
      .await
      .unwrap()
  }
}
