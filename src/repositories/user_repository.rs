//! User account persistence.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: Arc<SqlitePool>,
}

impl UserRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new: NewUser) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(Utc::now())
        .fetch_one(&*self.pool)
        .await
    }

    pub async fn get_by_id(&self, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
    }

    pub async fn get_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
    }

    pub async fn get_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
    }

    /// Login accepts either identifier.
    pub async fn get_by_username_or_email(&self, input: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE username = ? OR email = ?",
        )
        .bind(input)
        .bind(input)
        .fetch_optional(&*self.pool)
        .await
    }
}
