use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::documents::models::Document;

/// The only MIME type the upload gate accepts
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Upper bound for the multipart request body (50MB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Upload request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentDto {
    /// The PDF file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO describing one document
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    /// Unique identifier assigned by the record store
    pub id: i64,
    /// Original filename as uploaded
    pub filename: String,
    /// Server-relative path of the stored blob
    pub filepath: String,
    /// Size of the file in bytes
    pub filesize: i64,
    /// Timestamp when the document was uploaded
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponseDto {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            filepath: doc.filepath,
            filesize: doc.filesize,
            created_at: doc.created_at,
        }
    }
}

/// Response DTO for a successful upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    pub message: String,
    pub doc: DocumentResponseDto,
}

/// Response DTO carrying only a confirmation message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponseDto {
    pub message: String,
}
