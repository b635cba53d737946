use axum::extract::Multipart;

use crate::api::errors::ApiError;
use crate::api::validation::validate_image_upload;
use crate::core::state::AppState;

/// Reads the `file` part of a multipart body, validates it as an image and
/// stores it under `{prefix}/{owner_id}/{filename}`. Returns the object key.
pub(crate) async fn store_photo(
    state: &AppState,
    prefix: &str,
    owner_id: &str,
    mut multipart: Multipart,
) -> Result<String, ApiError> {
    let Some(storage) = state.storage() else {
        return Err(ApiError::ServiceUnavailable("File uploads are not configured".to_string()));
    };

    let max_bytes = state.settings().uploads().max_upload_size_mb * 1024 * 1024;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|name| name.to_string())
            .ok_or_else(|| ApiError::BadRequest("File part must have a filename".to_string()))?;
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .ok_or_else(|| ApiError::BadRequest("File part must have a content type".to_string()))?;

        validate_image_upload(
            &filename,
            &content_type,
            &state.settings().uploads().allowed_image_extensions,
        )?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;

        if bytes.len() as u64 > max_bytes {
            return Err(ApiError::BadRequest(format!(
                "File exceeds the {} MB upload limit",
                state.settings().uploads().max_upload_size_mb
            )));
        }

        let key = format!("{prefix}/{owner_id}/{filename}");
        storage
            .upload_bytes(&key, &content_type, bytes.to_vec())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to upload file"))?;

        tracing::info!(key = %key, size = bytes.len(), action = "photo_upload", "Stored photo");

        return Ok(key);
    }

    Err(ApiError::BadRequest("Multipart body must contain a 'file' part".to_string()))
}
