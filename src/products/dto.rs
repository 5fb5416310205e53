use bytes::Bytes;
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{ApiError, ValidationErrors};
use crate::products::repo::{NewProduct, Product, ProductPatch};
use crate::products::services::ext_from_mime;
use crate::storage::StorageClient;

const MAX_TITLE_LEN: usize = 255;
const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// A file field lifted out of the multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Raw multipart fields as received. Absence is structural here, which is
/// what lets the patch distinguish "not supplied" from "supplied empty".
#[derive(Debug, Default)]
pub struct ProductForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<String>,
    pub banner_image: Option<UploadedFile>,
}

fn validate_title(title: &Option<String>, errors: &mut ValidationErrors) -> Option<String> {
    match title.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push("title", "The title field is required.");
            None
        }
        Some(t) if t.chars().count() > MAX_TITLE_LEN => {
            errors.push("title", "The title may not be greater than 255 characters.");
            None
        }
        Some(t) => Some(t.to_string()),
    }
}

fn validate_cost(cost: &Option<String>, errors: &mut ValidationErrors) -> Option<Decimal> {
    let raw = cost.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<Decimal>() {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push("cost", "The cost must be a number.");
            None
        }
    }
}

fn validate_file(file: &Option<UploadedFile>, errors: &mut ValidationErrors) {
    if let Some(f) = file {
        if ext_from_mime(&f.content_type).is_none() {
            errors.push("banner_image", "The banner image must be an image.");
        }
        if f.bytes.len() > MAX_IMAGE_BYTES {
            errors.push(
                "banner_image",
                "The banner image may not be greater than 2048 kilobytes.",
            );
        }
    }
}

impl ProductForm {
    pub fn validate_create(self) -> Result<(NewProduct, Option<UploadedFile>), ApiError> {
        let mut errors = ValidationErrors::new();
        let title = validate_title(&self.title, &mut errors);
        let cost = validate_cost(&self.cost, &mut errors);
        validate_file(&self.banner_image, &mut errors);
        errors.into_result()?;

        Ok((
            NewProduct {
                title: title.unwrap_or_default(),
                description: self.description,
                cost,
            },
            self.banner_image,
        ))
    }

    pub fn validate_update(self) -> Result<(ProductPatch, Option<UploadedFile>), ApiError> {
        let mut errors = ValidationErrors::new();
        let title = validate_title(&self.title, &mut errors);
        let cost = validate_cost(&self.cost, &mut errors);
        validate_file(&self.banner_image, &mut errors);
        errors.into_result()?;

        Ok((
            ProductPatch {
                title: title.unwrap_or_default(),
                description: self.description,
                cost,
            },
            self.banner_image,
        ))
    }
}

/// Product as it leaves the API: the stored banner key resolved to a
/// publicly fetchable URL on every read path.
#[derive(Debug, Serialize)]
pub struct ProductJson {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub banner_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProductJson {
    pub fn resolve(p: Product, storage: &dyn StorageClient) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            description: p.description,
            cost: p.cost,
            banner_image: p.banner_image.map(|key| storage.public_url(&key)),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub status: bool,
    pub message: &'static str,
    pub products: Vec<ProductJson>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub status: bool,
    pub message: &'static str,
    pub product: ProductJson,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: bool,
    pub message: &'static str,
}
