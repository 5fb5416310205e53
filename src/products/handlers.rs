use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    products::{
        dto::{DeleteResponse, ProductForm, ProductJson, ProductListResponse, ProductResponse, UploadedFile},
        repo::Product,
        services,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(store))
        .route(
            "/products/:id",
            get(show).put(update).patch(update).delete(destroy),
        )
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

/// Pull the known fields out of a multipart body. Unknown fields are
/// ignored; an uploaded file with an empty body counts as absent.
async fn read_form(mut mp: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "cost" => form.cost = Some(text(field).await?),
            "banner_image" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?;
                if !bytes.is_empty() {
                    form.banner_image = Some(UploadedFile {
                        bytes,
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))
}

/// 404 when the row does not exist, 403 when it belongs to someone else.
fn owned_by(product: Option<Product>, user_id: Uuid) -> Result<Product, ApiError> {
    let product = product.ok_or(ApiError::NotFound("Product"))?;
    if product.user_id != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(product)
}

#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = Product::list_by_owner(&state.db, user.id).await?;
    let products = products
        .into_iter()
        .map(|p| ProductJson::resolve(p, state.storage.as_ref()))
        .collect();
    Ok(Json(ProductListResponse {
        status: true,
        message: "Products retrieved successfully",
        products,
    }))
}

#[instrument(skip(state, user, mp))]
pub async fn store(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let (new, file) = read_form(mp).await?.validate_create()?;

    // Blob first, then the row that references it.
    let banner_key = match file {
        Some(f) => Some(services::store_banner(&state, f).await?),
        None => None,
    };

    let product = Product::insert(&state.db, user.id, &new, banner_key.as_deref()).await?;

    info!(user_id = %user.id, product_id = %product.id, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            status: true,
            message: "Product created successfully",
            product: ProductJson::resolve(product, state.storage.as_ref()),
        }),
    ))
}

#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = owned_by(Product::find(&state.db, id).await?, user.id)?;
    Ok(Json(ProductResponse {
        status: true,
        message: "Product retrieved successfully",
        product: ProductJson::resolve(product, state.storage.as_ref()),
    }))
}

#[instrument(skip(state, user, mp))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<ProductResponse>, ApiError> {
    let existing = owned_by(Product::find(&state.db, id).await?, user.id)?;
    let (patch, file) = read_form(mp).await?.validate_update()?;

    // Write-new-then-delete-old: the replacement object lands before the row
    // points away from the old one, so a partial failure can leak a blob but
    // never lose the current image.
    let new_key = match file {
        Some(f) => Some(services::store_banner(&state, f).await?),
        None => None,
    };

    let product = Product::update(&state.db, id, &patch, new_key.as_deref()).await?;

    if new_key.is_some() {
        if let Some(old_key) = existing.banner_image.as_deref() {
            services::delete_banner_best_effort(&state, old_key).await;
        }
    }

    info!(user_id = %user.id, product_id = %product.id, "product updated");
    Ok(Json(ProductResponse {
        status: true,
        message: "Product updated successfully",
        product: ProductJson::resolve(product, state.storage.as_ref()),
    }))
}

#[instrument(skip(state, user))]
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let product = owned_by(Product::find(&state.db, id).await?, user.id)?;

    // Blob before row: a storage failure surfaces as 500 and leaves the row
    // intact, so the delete can be retried.
    if let Some(key) = product.banner_image.as_deref() {
        services::delete_banner(&state, key).await?;
    }
    Product::delete(&state.db, id).await?;

    info!(user_id = %user.id, product_id = %id, "product deleted");
    Ok(Json(DeleteResponse {
        status: true,
        message: "Product deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn product_owned_by(user_id: Uuid) -> Product {
        Product {
            id: Uuid::new_v4(),
            user_id,
            title: "Chair".into(),
            description: None,
            cost: None,
            banner_image: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owned_by_passes_through_own_product() {
        let user_id = Uuid::new_v4();
        let product = product_owned_by(user_id);
        let id = product.id;
        assert_eq!(owned_by(Some(product), user_id).unwrap().id, id);
    }

    #[test]
    fn owned_by_missing_is_not_found() {
        let err = owned_by(None, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Product")));
    }

    #[test]
    fn owned_by_foreign_product_is_forbidden() {
        let product = product_owned_by(Uuid::new_v4());
        let err = owned_by(Some(product), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }
}
