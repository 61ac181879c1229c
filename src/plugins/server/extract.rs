use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};

use crate::{auth::Claims, prelude::*, state::AppState};

/// Caller identified by a valid Bearer token.
pub struct AuthUser(pub Claims);

impl AuthUser {
  pub fn id(&self) -> i32 {
    self.0.sub
  }

  pub fn is_admin(&self) -> bool {
    self.0.is_admin()
  }

  /// Players may only act on themselves.
  pub fn ensure_self_or_admin(&self, user_id: i32) -> Result<()> {
    if self.is_admin() || self.id() == user_id {
      Ok(())
    } else {
      Err(Error::Forbidden)
    }
  }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "))
      .map(str::trim)
      .filter(|token| !token.is_empty())
      .ok_or(Error::Unauthorized)?;

    app.keys.verify(token).map(AuthUser)
  }
}

/// Caller holding the admin role.
pub struct Admin(pub Claims);

impl Admin {
  pub fn id(&self) -> i32 {
    self.0.sub
  }
}

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let AuthUser(claims) = AuthUser::from_request_parts(parts, app).await?;
    if !claims.is_admin() {
      return Err(Error::Forbidden);
    }
    Ok(Admin(claims))
  }
}
