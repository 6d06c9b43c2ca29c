use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Metadata for a file attached to a post. The bytes live on disk under the
/// configured upload root, keyed by `stored_name`; the original `file_name`
/// is kept for the download response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub post_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub byte_size: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// An attachment resolved for download: metadata plus the file contents.
#[derive(Debug)]
pub struct AttachmentDownload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}
