use bytes::Bytes;
use sqlx::Row;

use crate::app::ServiceError;
use crate::domain::attachment::AttachmentDownload;
use crate::infra::db::Db;
use crate::infra::storage::FileStore;

/// A file part pulled out of a multipart request, not yet persisted.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct AttachmentService {
    db: Db,
    files: FileStore,
}

impl AttachmentService {
    pub fn new(db: Db, files: FileStore) -> Self {
        Self { db, files }
    }

    pub async fn download(
        &self,
        attachment_id: i64,
    ) -> Result<Option<AttachmentDownload>, ServiceError> {
        let row = sqlx::query(
            "SELECT file_name, stored_name, content_type \
             FROM post_files WHERE id = $1",
        )
        .bind(attachment_id)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored_name: String = row.get("stored_name");
        let data = self.files.read(&stored_name).await?;

        Ok(Some(AttachmentDownload {
            file_name: row.get("file_name"),
            content_type: row.get("content_type"),
            data,
        }))
    }
}
