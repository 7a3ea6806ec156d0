use axum::extract::Multipart;

use crate::api::errors::ApiError;
use crate::core::state::AppState;

pub(crate) struct SubmissionUpload {
    pub(crate) file: Option<UploadedFile>,
    pub(crate) text_content: Option<String>,
}

pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

/// Reads the `file` and `text` fields out of a multipart submit request,
/// enforcing the configured size cap while streaming.
pub(crate) async fn read_submission_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<SubmissionUpload, ApiError> {
    let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;

    let mut file: Option<UploadedFile> = None;
    let mut text_content: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let filename =
                field.file_name().map(|s| s.to_string()).unwrap_or_else(|| "upload".to_string());
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
            {
                let next_size = bytes.len() as u64 + chunk.len() as u64;
                if next_size > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File size exceeds {}MB limit",
                        state.settings().storage().max_upload_size_mb
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            file = Some(UploadedFile { filename, content_type, bytes });
        } else if name == "text" {
            let text = field
                .text()
                .await
                .map_err(|_| ApiError::BadRequest("Invalid text field".to_string()))?;
            if !text.trim().is_empty() {
                text_content = Some(text);
            }
        }
    }

    if file.is_none() && text_content.is_none() {
        return Err(ApiError::BadRequest(
            "Submission requires a file or text content".to_string(),
        ));
    }

    Ok(SubmissionUpload { file, text_content })
}

pub(crate) fn sanitized_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// Best-effort removal of an object that lost its database row.
pub(crate) async fn gc_object(state: &AppState, key: &str) {
    if let Some(storage) = state.storage() {
        if let Err(err) = storage.delete_object(key).await {
            tracing::warn!(error = %err, key, "failed to delete orphaned object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sanitized_filename;

    #[test]
    fn sanitized_filename_strips_path_tricks() {
        assert_eq!(sanitized_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitized_filename("essay final.pdf"), "essayfinal.pdf");
        assert_eq!(sanitized_filename("###"), "upload");
    }
}
