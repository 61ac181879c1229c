//! Off-peak and off-pick discount cards. Both kinds share one schema and one
//! set of rules, so the service is generated for each pair of entities.

use serde::{Deserialize, Serialize};

use super::BatchResult;
use crate::{
  entity::{
    offpeak_card, offpick_card, user, user_offpeak_card, user_offpick_card,
  },
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscountCard {
  pub name: String,
  pub month: i32,
  pub year: i32,
  #[serde(default = "active")]
  pub is_active: bool,
}

fn active() -> bool {
  true
}

impl NewDiscountCard {
  fn check(&self) -> Result<()> {
    if utils::is_blank(Some(&self.name)) {
      return Err(Error::validation("Card name is required"));
    }
    if !(1..=12).contains(&self.month) {
      return Err(Error::validation("Month must be between 1 and 12"));
    }
    if !(2000..=2100).contains(&self.year) {
      return Err(Error::validation("Year is out of range"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignCards {
  pub user_id: i32,
  pub card_ids: Vec<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSort {
  #[default]
  CardId,
  Name,
  Month,
  Year,
  CreatedAt,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountFilters {
  pub name: Option<String>,
  pub month: Option<i32>,
  pub year: Option<i32>,
  pub is_active: Option<bool>,
}

macro_rules! discount_service {
  ($name:ident, $label:literal, $card:ident, $assignment:ident) => {
    impl SortKey<$card::Entity> for DiscountSort {
      fn column(&self) -> $card::Column {
        match self {
          Self::CardId => $card::Column::CardId,
          Self::Name => $card::Column::Name,
          Self::Month => $card::Column::Month,
          Self::Year => $card::Column::Year,
          Self::CreatedAt => $card::Column::CreatedAt,
        }
      }
    }

    pub struct $name<'a> {
      db: &'a DatabaseConnection,
    }

    impl<'a> $name<'a> {
      pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
      }

      /// Name+year and month+year are unique among cards of this kind.
      async fn ensure_unique(
        &self,
        req: &NewDiscountCard,
        exclude: Option<i32>,
      ) -> Result<()> {
        let scoped = || {
          let query = $card::Entity::find()
            .filter($card::Column::Year.eq(req.year));
          match exclude {
            Some(card_id) => query.filter($card::Column::CardId.ne(card_id)),
            None => query,
          }
        };

        let same_name = scoped()
          .filter($card::Column::Name.eq(req.name.trim()))
          .count(self.db)
          .await?;
        if same_name > 0 {
          return Err(Error::conflict(format!(
            "A {} card named \"{}\" already exists for {}",
            $label,
            req.name.trim(),
            req.year
          )));
        }

        let same_month = scoped()
          .filter($card::Column::Month.eq(req.month))
          .count(self.db)
          .await?;
        if same_month > 0 {
          return Err(Error::conflict(format!(
            "A {} card for {:02}/{} already exists",
            $label, req.month, req.year
          )));
        }

        Ok(())
      }

      pub async fn add(&self, req: NewDiscountCard) -> Result<$card::Model> {
        req.check()?;
        self.ensure_unique(&req, None).await?;

        let card = $card::ActiveModel {
          name: Set(req.name.trim().to_string()),
          month: Set(req.month),
          year: Set(req.year),
          is_active: Set(req.is_active),
          created_at: Set(utils::now()),
          ..Default::default()
        }
        .insert(self.db)
        .await?;

        Ok(card)
      }

      pub async fn by_id(&self, card_id: i32) -> Result<$card::Model> {
        $card::Entity::find_by_id(card_id)
          .one(self.db)
          .await?
          .ok_or(Error::NotFound("Card"))
      }

      pub async fn update(
        &self,
        card_id: i32,
        req: NewDiscountCard,
      ) -> Result<$card::Model> {
        req.check()?;
        let card = self.by_id(card_id).await?;
        self.ensure_unique(&req, Some(card_id)).await?;

        let card = $card::ActiveModel {
          name: Set(req.name.trim().to_string()),
          month: Set(req.month),
          year: Set(req.year),
          is_active: Set(req.is_active),
          ..card.into()
        }
        .update(self.db)
        .await?;

        Ok(card)
      }

      pub async fn delete(&self, card_id: i32) -> Result<()> {
        let res = $card::Entity::delete_by_id(card_id).exec(self.db).await?;
        if res.rows_affected == 0 {
          return Err(Error::NotFound("Card"));
        }
        Ok(())
      }

      pub async fn list(
        &self,
        req: ListReq<DiscountSort, DiscountFilters>,
      ) -> Result<Page<$card::Model, DiscountSort>> {
        let ListReq { pagination, filters } = req;

        let mut query = $card::Entity::find();
        if let Some(name) = filters.name.as_deref()
          && !utils::is_blank(Some(name))
        {
          query = query.filter($card::Column::Name.like(utils::like(name)));
        }
        if let Some(month) = filters.month {
          query = query.filter($card::Column::Month.eq(month));
        }
        if let Some(year) = filters.year {
          query = query.filter($card::Column::Year.eq(year));
        }
        if let Some(is_active) = filters.is_active {
          query = query.filter($card::Column::IsActive.eq(is_active));
        }

        page::fetch(self.db, query, pagination).await
      }

      /// Gives each card to the user. Unknown cards and cards the user
      /// already holds are reported as failed, the rest still go through.
      pub async fn assign(
        &self,
        req: AssignCards,
        admin_id: i32,
      ) -> Result<BatchResult> {
        if req.card_ids.is_empty() {
          return Err(Error::validation("No cards supplied"));
        }

        user::Entity::find_by_id(req.user_id)
          .one(self.db)
          .await?
          .ok_or(Error::NotFound("User"))?;

        let mut result = BatchResult::default();
        for card_id in req.card_ids {
          match self.assign_one(req.user_id, card_id, admin_id).await {
            Ok(()) => result.succeeded.push(card_id),
            Err(err) => {
              warn!(
                "Failed to assign {} card {card_id} to user {}: {err}",
                $label, req.user_id
              );
              result.failed.push(card_id);
            }
          }
        }

        Ok(result)
      }

      async fn assign_one(
        &self,
        user_id: i32,
        card_id: i32,
        admin_id: i32,
      ) -> Result<()> {
        self.by_id(card_id).await?;

        let held = $assignment::Entity::find()
          .filter($assignment::Column::UserId.eq(user_id))
          .filter($assignment::Column::CardId.eq(card_id))
          .count(self.db)
          .await?;
        if held > 0 {
          return Err(Error::conflict("Card already assigned"));
        }

        $assignment::ActiveModel {
          user_id: Set(user_id),
          card_id: Set(card_id),
          assigned_by: Set(admin_id),
          assigned_at: Set(utils::now()),
          ..Default::default()
        }
        .insert(self.db)
        .await?;

        Ok(())
      }

      /// Active cards held by a user.
      pub async fn for_user(&self, user_id: i32) -> Result<Vec<$card::Model>> {
        let cards = $card::Entity::find()
          .inner_join($assignment::Entity)
          .filter($assignment::Column::UserId.eq(user_id))
          .filter($card::Column::IsActive.eq(true))
          .order_by_desc($card::Column::Year)
          .order_by_desc($card::Column::Month)
          .all(self.db)
          .await?;
        Ok(cards)
      }
    }
  };
}

discount_service!(Offpeak, "off-peak", offpeak_card, user_offpeak_card);
discount_service!(Offpick, "off-pick", offpick_card, user_offpick_card);

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing;

  fn card(name: &str, month: i32, year: i32) -> NewDiscountCard {
    NewDiscountCard { name: name.to_string(), month, year, is_active: true }
  }

  #[tokio::test]
  async fn test_uniqueness_rules() {
    let db = testing::setup_db().await;
    let sv = Offpeak::new(&db);

    let march = sv.add(card("Março", 3, 2025)).await.unwrap();

    // same name, same year
    assert!(matches!(
      sv.add(card("Março", 4, 2025)).await,
      Err(Error::Conflict(_))
    ));
    // same month, same year
    assert!(matches!(
      sv.add(card("Primavera", 3, 2025)).await,
      Err(Error::Conflict(_))
    ));
    // another year is fine
    sv.add(card("Março", 3, 2026)).await.unwrap();

    // updating a card against itself is not a conflict
    let renamed =
      sv.update(march.card_id, card("Março cheio", 3, 2025)).await.unwrap();
    assert_eq!(renamed.name, "Março cheio");

    assert!(matches!(
      sv.add(card("Treze", 13, 2025)).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn test_kinds_are_independent() {
    let db = testing::setup_db().await;

    Offpeak::new(&db).add(card("Março", 3, 2025)).await.unwrap();
    Offpick::new(&db).add(card("Março", 3, 2025)).await.unwrap();
  }

  #[tokio::test]
  async fn test_assign_batch() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let user = testing::user(&db, "ana@club.pt").await;
    let sv = Offpick::new(&db);

    let march = sv.add(card("Março", 3, 2025)).await.unwrap();
    let april = sv.add(card("Abril", 4, 2025)).await.unwrap();

    let req = AssignCards {
      user_id: user.user_id,
      card_ids: vec![march.card_id, 404, april.card_id],
    };
    let result = sv.assign(req, admin.user_id).await.unwrap();
    assert_eq!(result.succeeded, vec![march.card_id, april.card_id]);
    assert_eq!(result.failed, vec![404]);

    let req =
      AssignCards { user_id: user.user_id, card_ids: vec![march.card_id] };
    let result = sv.assign(req, admin.user_id).await.unwrap();
    assert_eq!(result.failed, vec![march.card_id]);

    let held = sv.for_user(user.user_id).await.unwrap();
    assert_eq!(held.len(), 2);
    assert_eq!(held[0].card_id, april.card_id);
  }

  #[tokio::test]
  async fn test_list_filters() {
    let db = testing::setup_db().await;
    let sv = Offpeak::new(&db);

    sv.add(card("Março", 3, 2025)).await.unwrap();
    sv.add(card("Abril", 4, 2025)).await.unwrap();
    sv.add(card("Março", 3, 2026)).await.unwrap();

    let req = ListReq {
      pagination: Default::default(),
      filters: DiscountFilters { year: Some(2025), ..Default::default() },
    };
    assert_eq!(sv.list(req).await.unwrap().pagination.total, 2);

    let req = ListReq {
      pagination: Default::default(),
      filters: DiscountFilters {
        name: Some(String::from("mar")),
        ..Default::default()
      },
    };
    assert_eq!(sv.list(req).await.unwrap().pagination.total, 2);
  }
}
