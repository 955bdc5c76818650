//! UserService — registration and credential verification.

use thiserror::Error;

use crate::auth;
use crate::models::user::UserDto;
use crate::repositories::{NewUser, UserRepository, is_unique_violation};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already in use")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<UserDto> {
        if username.trim().is_empty() {
            return Err(AuthError::Missing("username"));
        }
        if email.trim().is_empty() {
            return Err(AuthError::Missing("email"));
        }
        if password.is_empty() {
            return Err(AuthError::Missing("password"));
        }

        if self.users.get_by_username(username).await.map_err(AuthError::Sqlx)?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.get_by_email(email).await.map_err(AuthError::Sqlx)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = auth::hash_password(password)?;
        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|err| {
                // A registration racing past the pre-checks lands on the
                // unique index instead.
                if is_unique_violation(&err) {
                    if err.to_string().contains("users.email") {
                        AuthError::EmailTaken
                    } else {
                        AuthError::UsernameTaken
                    }
                } else {
                    AuthError::Sqlx(err)
                }
            })?;

        Ok(user.into())
    }

    /// Verify credentials against either the username or the email.
    /// Unknown user and wrong password are indistinguishable.
    pub async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> AuthResult<UserDto> {
        let user = self
            .users
            .get_by_username_or_email(username_or_email)
            .await
            .map_err(AuthError::Sqlx)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !auth::verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user.into())
    }

    pub async fn get_by_id(&self, id: i64) -> AuthResult<UserDto> {
        let user = self
            .users
            .get_by_id(id)
            .await
            .map_err(AuthError::Sqlx)?
            .ok_or(AuthError::NotFound)?;
        Ok(user.into())
    }
}
