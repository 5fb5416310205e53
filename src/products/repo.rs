use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Product row. `banner_image` holds the storage key, never a URL;
/// resolution happens at the response boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub banner_image: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validated fields for a new product.
#[derive(Debug)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
}

/// Validated partial update. `None` means "not supplied, keep the
/// existing value"; the merge happens in SQL via COALESCE.
#[derive(Debug)]
pub struct ProductPatch {
    pub title: String,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
}

const COLUMNS: &str = "id, user_id, title, description, cost, banner_image, created_at, updated_at";

impl Product {
    pub async fn list_by_owner(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        new: &NewProduct,
        banner_image: Option<&str>,
    ) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (user_id, title, description, cost, banner_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.cost)
        .bind(banner_image)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Apply a partial update. Unsupplied fields keep their stored values;
    /// `banner_image` is only replaced when a new key is supplied.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        patch: &ProductPatch,
        banner_image: Option<&str>,
    ) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET title = $2,
                description = COALESCE($3, description),
                cost = COALESCE($4, cost),
                banner_image = COALESCE($5, banner_image),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.cost)
        .bind(banner_image)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
