use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, users, util::normalize_optional_text};

use super::Engine;

/// A registered user, without credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            date_joined: model.date_joined,
        }
    }
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

/// The identity and role flags an operation is performed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Actor {
    pub(crate) fn require_staff(&self) -> ResultEngine<()> {
        if self.is_staff || self.is_superuser {
            Ok(())
        } else {
            Err(EngineError::Forbidden("staff access required".to_string()))
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: Option<&'a str>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::InvalidField(format!("cannot hash password: {err}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

impl Engine {
    /// Register a user. Usernames are unique.
    pub async fn create_user(&self, new_user: NewUser<'_>) -> ResultEngine<User> {
        let username = new_user.username.trim();
        if username.is_empty() {
            return Err(EngineError::InvalidField(
                "username must not be empty".to_string(),
            ));
        }
        if new_user.password.is_empty() {
            return Err(EngineError::InvalidField(
                "password must not be empty".to_string(),
            ));
        }
        if self.user_by_username(username).await?.is_some() {
            return Err(EngineError::ExistingKey(username.to_string()));
        }

        let active = users::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            password: ActiveValue::Set(hash_password(new_user.password)?),
            email: ActiveValue::Set(normalize_optional_text(new_user.email)),
            is_staff: ActiveValue::Set(new_user.is_staff || new_user.is_superuser),
            is_superuser: ActiveValue::Set(new_user.is_superuser),
            date_joined: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(&self.database).await?;
        tracing::info!("registered user {}", model.username);
        Ok(model.into())
    }

    pub async fn user_by_username(&self, username: &str) -> ResultEngine<Option<User>> {
        Ok(users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .map(User::from))
    }

    /// Check Basic credentials. `Ok(None)` means unknown user or wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Option<User>> {
        let Some(model) = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };

        if verify_password(password, &model.password) {
            Ok(Some(model.into()))
        } else {
            Ok(None)
        }
    }

    /// Grant or revoke the staff flag.
    pub async fn set_staff(&self, username: &str, is_staff: bool) -> ResultEngine<User> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

        let mut active: users::ActiveModel = model.into();
        active.is_staff = ActiveValue::Set(is_staff);
        let model = active.update(&self.database).await?;
        Ok(model.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }
}
