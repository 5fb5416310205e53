use anyhow::Context;
use tracing::warn;
use uuid::Uuid;

use crate::products::dto::UploadedFile;
use crate::state::AppState;

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Write an uploaded banner to the blob store under a products-scoped key
/// and return the key. The caller persists the key on the row.
pub async fn store_banner(st: &AppState, file: UploadedFile) -> anyhow::Result<String> {
    let ext = ext_from_mime(&file.content_type).unwrap_or("bin");
    let key = format!("products/{}.{}", Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, file.bytes, &file.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

pub async fn delete_banner(st: &AppState, key: &str) -> anyhow::Result<()> {
    st.storage
        .delete_object(key)
        .await
        .with_context(|| format!("delete_object {}", key))
}

/// Replacement path: the new object is already stored and the row already
/// points at it, so a failed delete only leaks the old blob. Log and move on.
pub async fn delete_banner_best_effort(st: &AppState, key: &str) {
    if let Err(e) = delete_banner(st, key).await {
        warn!(error = %e, key, "failed to delete replaced banner image");
    }
}
