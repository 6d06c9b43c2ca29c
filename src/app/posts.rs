use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::attachments::UploadedFile;
use crate::app::credentials::{hash_password, require_password};
use crate::app::ServiceError;
use crate::domain::attachment::Attachment;
use crate::domain::post::{Post, PostDetail, PostSummary, SearchField};
use crate::infra::db::Db;
use crate::infra::storage::FileStore;

#[derive(Debug)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub password: String,
}

#[derive(Debug)]
pub struct PostEdit {
    pub title: String,
    pub content: String,
    pub author: String,
    pub password: String,
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
    files: FileStore,
}

impl PostService {
    pub fn new(db: Db, files: FileStore) -> Self {
        Self { db, files }
    }

    pub async fn create(
        &self,
        new_post: NewPost,
        uploads: Vec<UploadedFile>,
    ) -> Result<Post, ServiceError> {
        let password_hash = hash_password(&new_post.password)?;

        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(
            "INSERT INTO posts (title, content, author, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, content, author, liked, created_at, updated_at",
        )
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(&new_post.author)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let post = post_from_row(&row);
        let stored_names = self.store_uploads(post.id, uploads, &mut tx).await?;

        if let Err(err) = tx.commit().await {
            self.discard_stored(&stored_names).await;
            return Err(err.into());
        }
        Ok(post)
    }

    pub async fn get(&self, post_id: i64) -> Result<Option<PostDetail>, ServiceError> {
        let row = sqlx::query(
            "SELECT id, title, content, author, liked, created_at, updated_at \
             FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let post = post_from_row(&row);

        let files = self.list_attachments(post_id).await?;

        let comment_rows = sqlx::query(
            "SELECT id, post_id, parent_id, author, body, deleted, created_at, updated_at \
             FROM comments WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        let comments = comment_rows
            .iter()
            .map(crate::app::comments::comment_from_row)
            .collect();

        Ok(Some(PostDetail {
            post,
            files,
            comments,
        }))
    }

    pub async fn list(&self) -> Result<Vec<PostSummary>, ServiceError> {
        let rows = sqlx::query(
            "SELECT id, title, author, liked, created_at \
             FROM posts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(summary_from_row).collect())
    }

    pub async fn search(
        &self,
        field: SearchField,
        keyword: &str,
    ) -> Result<Vec<PostSummary>, ServiceError> {
        let pattern = format!("%{}%", escape_like_pattern(keyword));
        // column() yields a fixed identifier, never user input
        let query = format!(
            "SELECT id, title, author, liked, created_at \
             FROM posts WHERE {} ILIKE $1 ESCAPE '\\' \
             ORDER BY created_at DESC, id DESC",
            field.column()
        );

        let rows = sqlx::query(&query)
            .bind(&pattern)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.iter().map(summary_from_row).collect())
    }

    pub async fn update(
        &self,
        post_id: i64,
        edit: PostEdit,
        uploads: Vec<UploadedFile>,
    ) -> Result<Post, ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        let stored_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let stored_hash = stored_hash.ok_or(ServiceError::NotFound("post"))?;
        require_password(&edit.password, &stored_hash)?;

        let row = sqlx::query(
            "UPDATE posts \
             SET title = $2, content = $3, author = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, title, content, author, liked, created_at, updated_at",
        )
        .bind(post_id)
        .bind(&edit.title)
        .bind(&edit.content)
        .bind(&edit.author)
        .fetch_one(&mut *tx)
        .await?;

        let post = post_from_row(&row);
        let stored_names = self.store_uploads(post_id, uploads, &mut tx).await?;

        if let Err(err) = tx.commit().await {
            self.discard_stored(&stored_names).await;
            return Err(err.into());
        }
        Ok(post)
    }

    pub async fn delete(&self, post_id: i64, password: &str) -> Result<(), ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        let stored_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let stored_hash = stored_hash.ok_or(ServiceError::NotFound("post"))?;
        require_password(password, &stored_hash)?;

        let stored_names: Vec<String> =
            sqlx::query_scalar("SELECT stored_name FROM post_files WHERE post_id = $1")
                .bind(post_id)
                .fetch_all(&mut *tx)
                .await?;

        // attachments and comments go with the post via ON DELETE CASCADE
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for stored_name in stored_names {
            self.files.remove(&stored_name).await;
        }

        Ok(())
    }

    pub async fn like(&self, post_id: i64) -> Result<i32, ServiceError> {
        let liked: Option<i32> = sqlx::query_scalar(
            "UPDATE posts SET liked = liked + 1 WHERE id = $1 RETURNING liked",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        liked.ok_or(ServiceError::NotFound("post"))
    }

    async fn list_attachments(&self, post_id: i64) -> Result<Vec<Attachment>, ServiceError> {
        let rows = sqlx::query(
            "SELECT id, post_id, file_name, content_type, byte_size, created_at \
             FROM post_files WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        let files = rows
            .iter()
            .map(|row| Attachment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                file_name: row.get("file_name"),
                content_type: row.get("content_type"),
                byte_size: row.get("byte_size"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(files)
    }

    /// Writes each upload to the file store and records its metadata row in
    /// the open transaction. Disk writes are not transactional, so any
    /// failure removes the files stored so far before reporting the error;
    /// the returned names let the caller do the same if the commit fails.
    async fn store_uploads(
        &self,
        post_id: i64,
        uploads: Vec<UploadedFile>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Vec<String>, ServiceError> {
        let mut stored_names: Vec<String> = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let stored_name = match self.files.save(&upload.file_name, &upload.data).await {
                Ok(stored_name) => stored_name,
                Err(err) => {
                    self.discard_stored(&stored_names).await;
                    return Err(err.into());
                }
            };

            let inserted = sqlx::query(
                "INSERT INTO post_files (post_id, file_name, stored_name, content_type, byte_size) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(post_id)
            .bind(&upload.file_name)
            .bind(&stored_name)
            .bind(&upload.content_type)
            .bind(upload.data.len() as i64)
            .execute(&mut **tx)
            .await;

            match inserted {
                Ok(_) => stored_names.push(stored_name),
                Err(err) => {
                    self.files.remove(&stored_name).await;
                    self.discard_stored(&stored_names).await;
                    return Err(err.into());
                }
            }
        }

        Ok(stored_names)
    }

    async fn discard_stored(&self, stored_names: &[String]) {
        for stored_name in stored_names {
            self.files.remove(stored_name).await;
        }
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author: row.get("author"),
        liked: row.get("liked"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn summary_from_row(row: &PgRow) -> PostSummary {
    PostSummary {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        liked: row.get("liked"),
        created_at: row.get("created_at"),
    }
}

fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
