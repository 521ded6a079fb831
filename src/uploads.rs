use axum::extract::multipart::Field;

use crate::error::AppError;

/// Declared mimetypes accepted for uploads. The declared type is trusted;
/// content is never sniffed.
pub const ALLOWED_MIMETYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/zip",
];

/// An uploaded file pulled out of a multipart field, carried in memory
/// until it is written to the database as a blob.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Read a multipart `file` field into memory, rejecting mimetypes
    /// outside the allow-list. The request body size cap is enforced by
    /// the router's body limit layer.
    pub async fn from_field(field: Field<'_>) -> Result<Self, AppError> {
        let name = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !ALLOWED_MIMETYPES.contains(&content_type.as_str()) {
            return Err(AppError::Validation("Unsupported file type".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
            .to_vec();

        Ok(UploadedFile {
            name,
            content_type,
            size: data.len() as i64,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_covers_document_types() {
        assert!(ALLOWED_MIMETYPES.contains(&"application/pdf"));
        assert!(ALLOWED_MIMETYPES.contains(&"application/zip"));
        assert!(!ALLOWED_MIMETYPES.contains(&"text/html"));
        assert!(!ALLOWED_MIMETYPES.contains(&"application/octet-stream"));
    }
}
