use argon2::{
  Argon2,
  password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
  },
};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::{entity::UserType, prelude::*};

/// Token payload. Identity and role only, the profile is always read from
/// the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub: i32,
  pub role: UserType,
  pub exp: i64,
}

impl Claims {
  pub fn is_admin(&self) -> bool {
    self.role == UserType::Admin
  }
}

pub struct Keys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl Keys {
  pub fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl,
    }
  }

  pub fn issue(&self, user_id: i32, role: UserType) -> Result<String> {
    let ttl = TimeDelta::from_std(self.ttl)
      .map_err(|err| Error::Internal(err.to_string()))?;
    let claims =
      Claims { sub: user_id, role, exp: (Utc::now() + ttl).timestamp() };

    encode(&Header::default(), &claims, &self.encoding)
      .map_err(|err| Error::Internal(format!("Failed to sign token: {err}")))
  }

  pub fn verify(&self, token: &str) -> Result<Claims> {
    decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
      .map(|data| data.claims)
      .map_err(|err| {
        debug!("Rejected token: {err}");
        Error::InvalidToken
      })
  }
}

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|err| Error::Internal(format!("Failed to hash password: {err}")))
}

/// `false` for a wrong password and for a stored hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
  match PasswordHash::new(hash) {
    Ok(parsed) => {
      Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }
    Err(err) => {
      warn!("Stored password hash is malformed: {err}");
      false
    }
  }
}
