use sea_orm::Condition;
use serde::{Deserialize, Serialize};

use crate::{
  auth,
  entity::{UserType, entry_card, offpeak_card, offpick_card, user},
  page::{self, ListReq, Page, SortKey},
  prelude::*,
  sv,
};

pub const MIN_PASSWORD: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub email: String,
  pub password: String,
  pub phone: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub birthdate: Option<DateTime>,
}

/// Admin edit of any account. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
  pub email: Option<String>,
  pub phone: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub birthdate: Option<DateTime>,
  pub user_type: Option<UserType>,
}

/// What a player may change on their own account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
  pub phone: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub birthdate: Option<DateTime>,
  pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
  #[default]
  UserId,
  Email,
  FirstName,
  LastName,
  UserType,
  CreatedAt,
}

impl SortKey<user::Entity> for UserSort {
  fn column(&self) -> user::Column {
    match self {
      Self::UserId => user::Column::UserId,
      Self::Email => user::Column::Email,
      Self::FirstName => user::Column::FirstName,
      Self::LastName => user::Column::LastName,
      Self::UserType => user::Column::UserType,
      Self::CreatedAt => user::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilters {
  pub user_type: Option<UserType>,
  pub created_from: Option<DateTime>,
  pub created_to: Option<DateTime>,
  /// Matches email, phone or name
  pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  #[serde(flatten)]
  pub user: user::Model,
  pub active_card: Option<entry_card::Model>,
  pub offpeak_cards: Vec<offpeak_card::Model>,
  pub offpick_cards: Vec<offpick_card::Model>,
}

fn normalize(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD {
    return Err(Error::validation(format!(
      "Password must have at least {MIN_PASSWORD} characters"
    )));
  }
  Ok(())
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn ensure_free(
    &self,
    email: Option<&str>,
    phone: Option<&str>,
    exclude: Option<i32>,
  ) -> Result<()> {
    let scoped = || match exclude {
      Some(user_id) => {
        user::Entity::find().filter(user::Column::UserId.ne(user_id))
      }
      None => user::Entity::find(),
    };

    if let Some(email) = email {
      let taken =
        scoped().filter(user::Column::Email.eq(email)).count(self.db).await?;
      if taken > 0 {
        return Err(Error::conflict("Email is already in use"));
      }
    }

    if let Some(phone) = phone {
      let taken =
        scoped().filter(user::Column::Phone.eq(phone)).count(self.db).await?;
      if taken > 0 {
        return Err(Error::conflict("Phone is already in use"));
      }
    }

    Ok(())
  }

  pub async fn register(&self, req: NewUser) -> Result<user::Model> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
      return Err(Error::validation("A valid email is required"));
    }
    check_password(&req.password)?;

    let phone = normalize(req.phone);
    self.ensure_free(Some(&email), phone.as_deref(), None).await?;

    let user = user::ActiveModel {
      email: Set(email),
      phone: Set(phone),
      password: Set(auth::hash_password(&req.password)?),
      first_name: Set(normalize(req.first_name)),
      last_name: Set(normalize(req.last_name)),
      birthdate: Set(req.birthdate),
      user_type: Set(UserType::Player),
      video_credits: Set(0),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!("User {} registered", user.user_id);
    Ok(user)
  }

  pub async fn login(
    &self,
    email: &str,
    password: &str,
  ) -> Result<user::Model> {
    let user = user::Entity::find()
      .filter(user::Column::Email.eq(email.trim().to_lowercase()))
      .one(self.db)
      .await?;

    match user {
      Some(user) if auth::verify_password(password, &user.password) => Ok(user),
      _ => Err(Error::validation("Incorrect email or password")),
    }
  }

  pub async fn by_id(&self, user_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("User"))
  }

  pub async fn profile(&self, user_id: i32) -> Result<Profile> {
    let user = self.by_id(user_id).await?;

    Ok(Profile {
      active_card: sv::Card::new(self.db).active(user_id).await?,
      offpeak_cards: sv::Offpeak::new(self.db).for_user(user_id).await?,
      offpick_cards: sv::Offpick::new(self.db).for_user(user_id).await?,
      user,
    })
  }

  pub async fn list(
    &self,
    req: ListReq<UserSort, UserFilters>,
  ) -> Result<Page<user::Model, UserSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = user::Entity::find();
    if let Some(user_type) = filters.user_type {
      query = query.filter(user::Column::UserType.eq(user_type));
    }
    if let Some(from) = filters.created_from {
      query = query.filter(user::Column::CreatedAt.gte(from));
    }
    if let Some(to) = filters.created_to {
      query = query.filter(user::Column::CreatedAt.lte(to));
    }
    if let Some(search) = filters.search.as_deref()
      && !utils::is_blank(Some(search))
    {
      let pattern = utils::like(search);
      query = query.filter(
        Condition::any()
          .add(user::Column::Email.like(&pattern))
          .add(user::Column::Phone.like(&pattern))
          .add(user::Column::FirstName.like(&pattern))
          .add(user::Column::LastName.like(&pattern)),
      );
    }

    page::fetch(self.db, query, pagination).await
  }

  pub async fn update(
    &self,
    user_id: i32,
    patch: UserPatch,
  ) -> Result<user::Model> {
    let user = self.by_id(user_id).await?;

    let email = patch.email.map(|email| email.trim().to_lowercase());
    if let Some(email) = &email
      && !email.contains('@')
    {
      return Err(Error::validation("A valid email is required"));
    }
    let phone = normalize(patch.phone);
    self.ensure_free(email.as_deref(), phone.as_deref(), Some(user_id)).await?;

    let mut model: user::ActiveModel = user.into();
    if let Some(email) = email {
      model.email = Set(email);
    }
    if phone.is_some() {
      model.phone = Set(phone);
    }
    if let Some(first_name) = patch.first_name {
      model.first_name = Set(normalize(Some(first_name)));
    }
    if let Some(last_name) = patch.last_name {
      model.last_name = Set(normalize(Some(last_name)));
    }
    if let Some(birthdate) = patch.birthdate {
      model.birthdate = Set(Some(birthdate));
    }
    if let Some(user_type) = patch.user_type {
      model.user_type = Set(user_type);
    }

    Ok(model.update(self.db).await?)
  }

  pub async fn update_own(
    &self,
    user_id: i32,
    patch: AccountPatch,
  ) -> Result<user::Model> {
    let user = self.by_id(user_id).await?;

    let phone = normalize(patch.phone);
    self.ensure_free(None, phone.as_deref(), Some(user_id)).await?;

    let mut model: user::ActiveModel = user.into();
    if phone.is_some() {
      model.phone = Set(phone);
    }
    if let Some(first_name) = patch.first_name {
      model.first_name = Set(normalize(Some(first_name)));
    }
    if let Some(last_name) = patch.last_name {
      model.last_name = Set(normalize(Some(last_name)));
    }
    if let Some(birthdate) = patch.birthdate {
      model.birthdate = Set(Some(birthdate));
    }
    if let Some(password) = patch.password {
      check_password(&password)?;
      model.password = Set(auth::hash_password(&password)?);
    }

    Ok(model.update(self.db).await?)
  }

  pub async fn delete(&self, user_id: i32) -> Result<()> {
    let res = user::Entity::delete_by_id(user_id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::NotFound("User"));
    }
    info!("User {user_id} deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{discount::AssignCards, discount::NewDiscountCard, testing};

  fn signup(email: &str, phone: Option<&str>) -> NewUser {
    NewUser {
      email: email.to_string(),
      password: String::from("padel123"),
      phone: phone.map(str::to_string),
      first_name: Some(String::from("Ana")),
      last_name: None,
      birthdate: None,
    }
  }

  #[tokio::test]
  async fn test_register_and_login() {
    let db = testing::setup_db().await;
    let sv = User::new(&db);

    let user = sv.register(signup(" Ana@Club.pt ", None)).await.unwrap();
    assert_eq!(user.email, "ana@club.pt");
    assert_eq!(user.user_type, UserType::Player);
    assert_ne!(user.password, "padel123");

    let logged = sv.login("ana@club.pt", "padel123").await.unwrap();
    assert_eq!(logged.user_id, user.user_id);

    for (email, password) in [("ana@club.pt", "wrong"), ("rui@club.pt", "x")] {
      assert!(matches!(
        sv.login(email, password).await,
        Err(Error::Validation(_))
      ));
    }
  }

  #[tokio::test]
  async fn test_register_conflicts() {
    let db = testing::setup_db().await;
    let sv = User::new(&db);

    sv.register(signup("ana@club.pt", Some("912345678"))).await.unwrap();

    assert!(matches!(
      sv.register(signup("ANA@club.pt", None)).await,
      Err(Error::Conflict(_))
    ));
    assert!(matches!(
      sv.register(signup("rui@club.pt", Some("912345678"))).await,
      Err(Error::Conflict(_))
    ));

    let mut weak = signup("rui@club.pt", None);
    weak.password = String::from("123");
    assert!(matches!(sv.register(weak).await, Err(Error::Validation(_))));
  }

  #[tokio::test]
  async fn test_update_keeps_email_unique() {
    let db = testing::setup_db().await;
    let sv = User::new(&db);

    let ana = sv.register(signup("ana@club.pt", None)).await.unwrap();
    sv.register(signup("rui@club.pt", None)).await.unwrap();

    let patch =
      UserPatch {
        email: Some(String::from("rui@club.pt")),
        ..Default::default()
      };
    assert!(matches!(
      sv.update(ana.user_id, patch).await,
      Err(Error::Conflict(_))
    ));

    // own email is not a conflict
    let patch = UserPatch {
      email: Some(String::from("ana@club.pt")),
      user_type: Some(UserType::Admin),
      ..Default::default()
    };
    let ana = sv.update(ana.user_id, patch).await.unwrap();
    assert!(ana.is_admin());
  }

  #[tokio::test]
  async fn test_update_own_password() {
    let db = testing::setup_db().await;
    let sv = User::new(&db);

    let ana = sv.register(signup("ana@club.pt", None)).await.unwrap();
    let patch = AccountPatch {
      password: Some(String::from("novapass")),
      last_name: Some(String::from("Silva")),
      ..Default::default()
    };
    let ana = sv.update_own(ana.user_id, patch).await.unwrap();

    assert_eq!(ana.last_name.as_deref(), Some("Silva"));
    assert!(sv.login("ana@club.pt", "novapass").await.is_ok());
    assert!(sv.login("ana@club.pt", "padel123").await.is_err());
  }

  #[tokio::test]
  async fn test_profile_and_list() {
    let db = testing::setup_db().await;
    let admin = testing::admin(&db).await;
    let sv = User::new(&db);

    let ana = sv.register(signup("ana@club.pt", None)).await.unwrap();
    sv.register(signup("rui@club.pt", None)).await.unwrap();

    let offpeak = sv::Offpeak::new(&db);
    let card = offpeak
      .add(NewDiscountCard {
        name: String::from("Março"),
        month: 3,
        year: 2025,
        is_active: true,
      })
      .await
      .unwrap();
    offpeak
      .assign(
        AssignCards { user_id: ana.user_id, card_ids: vec![card.card_id] },
        admin.user_id,
      )
      .await
      .unwrap();

    let profile = sv.profile(ana.user_id).await.unwrap();
    assert_eq!(profile.offpeak_cards.len(), 1);
    assert!(profile.offpick_cards.is_empty());
    assert!(profile.active_card.is_none());

    let req = ListReq {
      pagination: Default::default(),
      filters: UserFilters {
        user_type: Some(UserType::Player),
        ..Default::default()
      },
    };
    assert_eq!(sv.list(req).await.unwrap().pagination.total, 2);

    sv.delete(ana.user_id).await.unwrap();
    assert!(matches!(sv.by_id(ana.user_id).await, Err(Error::NotFound(_))));
  }
}
