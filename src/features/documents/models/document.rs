use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for documents (one row per stored blob)
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    /// Original client-supplied name; display and download naming only
    pub filename: String,
    /// Server-relative path of the blob on disk
    pub filepath: String,
    /// Size in bytes, copied from the upload at creation time
    pub filesize: i64,
    pub created_at: DateTime<Utc>,
}
