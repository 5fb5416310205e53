pub use crate::auth::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. Returns the raw sqlx error so
    /// the caller can tell a unique-violation on email apart from the rest;
    /// the pre-insert uniqueness check races with concurrent registrations.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Persist a freshly issued token digest for a user.
pub async fn insert_token(db: &PgPool, user_id: Uuid, token_hash: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (user_id, token_hash)
        VALUES ($1, $2)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .execute(db)
    .await?;
    Ok(())
}

/// Resolve a presented token digest to the owning user, if any.
pub async fn find_user_by_token(db: &PgPool, token_hash: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.email, u.password_hash, u.created_at
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = $1
        "#,
    )
    .bind(token_hash)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct DuplicateKey;

    impl std::fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"users_email_key\"")
        }
    }

    impl std::error::Error for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"users_email_key\""
        }
        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_is_recognized() {
        let err = sqlx::Error::Database(Box::new(DuplicateKey));
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn other_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}

/// Delete a token row. Deleting an already-gone token is not an error.
pub async fn revoke_token(db: &PgPool, token_hash: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM auth_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .execute(db)
    .await?;
    Ok(())
}
