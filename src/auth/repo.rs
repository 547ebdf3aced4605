use crate::auth::repo_types::User;
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, first_name, password_hash, created_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    pub async fn email_taken(db: &PgPool, email: &str) -> anyhow::Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(db)
                .await
                .context("check email")?;
        Ok(taken)
    }

    /// Create a new user with an already hashed password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: Option<&str>,
        first_name: Option<&str>,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, first_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }
}
