use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use sea_orm::{ActiveValue, DbErr, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::validation::Violations;
use crate::{EngineError, ResultEngine, users};

use super::{Engine, with_tx};

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Database(DbErr::Custom(format!("password hash: {err}"))))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

impl Engine {
    /// Register a new user. The password is stored as an argon2 hash.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        name: &str,
        email: &str,
    ) -> ResultEngine<users::Model> {
        let mut check = Violations::new();
        let username = check.required_text(username, "username", 100);
        check.password(password, "password", 100);
        let name = check.required_text(name, "name", 100);
        let email = check.email(email, "email");
        check.into_result()?;

        with_tx!(self, |db_tx| {
            let username_taken = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some();
            if username_taken {
                return Err(EngineError::ExistingKey(username));
            }
            let email_taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if email_taken {
                return Err(EngineError::ExistingKey(email));
            }

            let user = users::ActiveModel {
                username: ActiveValue::Set(username),
                password: ActiveValue::Set(hash_password(password)?),
                name: ActiveValue::Set(name),
                email: ActiveValue::Set(email),
                token: ActiveValue::Set(None),
            };
            Ok(user.insert(&db_tx).await?)
        })
    }

    /// Verify credentials and issue a fresh session token.
    ///
    /// An unknown username and a wrong password are indistinguishable to the
    /// caller. A login replaces any previously issued token.
    pub async fn login(&self, username: &str, password: &str) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            let Some(user) = users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::InvalidCredentials);
            };
            if !verify_password(password, &user.password) {
                return Err(EngineError::InvalidCredentials);
            }

            let token = Uuid::new_v4().to_string();
            let mut user: users::ActiveModel = user.into();
            user.token = ActiveValue::Set(Some(token.clone()));
            user.update(&db_tx).await?;
            Ok(token)
        })
    }

    /// Resolve a session token to its user. Used by the HTTP auth layer.
    pub async fn user_by_token(&self, token: &str) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Token.eq(token))
            .one(&self.database)
            .await
            .map_err(Into::into)
    }

    /// Update display name and/or password; absent fields are left untouched.
    pub async fn update_profile(
        &self,
        username: &str,
        name: Option<&str>,
        password: Option<&str>,
    ) -> ResultEngine<users::Model> {
        let mut check = Violations::new();
        let name = name.map(|value| check.required_text(value, "name", 100));
        if let Some(password) = password {
            check.password(password, "password", 100);
        }
        if name.is_none() && password.is_none() {
            check.push("name or password is required");
        }
        check.into_result()?;

        with_tx!(self, |db_tx| {
            let Some(user) = users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::KeyNotFound("User not found".to_string()));
            };

            let mut user: users::ActiveModel = user.into();
            if let Some(name) = name {
                user.name = ActiveValue::Set(name);
            }
            if let Some(password) = password {
                user.password = ActiveValue::Set(hash_password(password)?);
            }
            Ok(user.update(&db_tx).await?)
        })
    }

    /// Clear the stored session token.
    pub async fn logout(&self, username: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let Some(user) = users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::KeyNotFound("User not found".to_string()));
            };

            let mut user: users::ActiveModel = user.into();
            user.token = ActiveValue::Set(None);
            user.update(&db_tx).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert_ne!(hash, "hunter2!");
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("hunter2!", "not-a-phc-string"));
    }
}
