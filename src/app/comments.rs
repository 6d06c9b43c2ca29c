use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::credentials::{hash_password, require_password};
use crate::app::ServiceError;
use crate::domain::comment::Comment;
use crate::infra::db::Db;

#[derive(Debug)]
pub struct NewComment {
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub password: String,
    pub body: String,
}

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_comment: NewComment) -> Result<Comment, ServiceError> {
        let post_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1")
            .bind(new_comment.post_id)
            .fetch_optional(self.db.pool())
            .await?;
        if post_exists.is_none() {
            return Err(ServiceError::NotFound("post"));
        }

        // replies may only nest one level: the parent must be a top-level
        // comment on the same post
        if let Some(parent_id) = new_comment.parent_id {
            let parent: Option<(i64, Option<i64>)> =
                sqlx::query_as("SELECT post_id, parent_id FROM comments WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(self.db.pool())
                    .await?;
            match parent {
                Some((post_id, None)) if post_id == new_comment.post_id => {}
                _ => return Err(ServiceError::NotFound("parent comment")),
            }
        }

        let password_hash = hash_password(&new_comment.password)?;

        let row = sqlx::query(
            "INSERT INTO comments (post_id, parent_id, author, password_hash, body) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, post_id, parent_id, author, body, deleted, created_at, updated_at",
        )
        .bind(new_comment.post_id)
        .bind(new_comment.parent_id)
        .bind(&new_comment.author)
        .bind(&password_hash)
        .bind(&new_comment.body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(comment_from_row(&row))
    }

    /// All comments for a post, oldest first. Soft-deleted rows stay in the
    /// listing with `deleted` set; filtering is the presentation layer's call.
    pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>, ServiceError> {
        let post_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;
        if post_exists.is_none() {
            return Err(ServiceError::NotFound("post"));
        }

        let rows = sqlx::query(
            "SELECT id, post_id, parent_id, author, body, deleted, created_at, updated_at \
             FROM comments WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn update(
        &self,
        comment_id: i64,
        password: &str,
        body: &str,
    ) -> Result<Comment, ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        let stored_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM comments WHERE id = $1 FOR UPDATE")
                .bind(comment_id)
                .fetch_optional(&mut *tx)
                .await?;
        let stored_hash = stored_hash.ok_or(ServiceError::NotFound("comment"))?;
        require_password(password, &stored_hash)?;

        let row = sqlx::query(
            "UPDATE comments SET body = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, post_id, parent_id, author, body, deleted, created_at, updated_at",
        )
        .bind(comment_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(comment_from_row(&row))
    }

    /// Soft delete: flips the flag, keeps the row.
    pub async fn soft_delete(
        &self,
        comment_id: i64,
        password: &str,
    ) -> Result<Comment, ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        let stored_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM comments WHERE id = $1 FOR UPDATE")
                .bind(comment_id)
                .fetch_optional(&mut *tx)
                .await?;
        let stored_hash = stored_hash.ok_or(ServiceError::NotFound("comment"))?;
        require_password(password, &stored_hash)?;

        let row = sqlx::query(
            "UPDATE comments SET deleted = TRUE, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, post_id, parent_id, author, body, deleted, created_at, updated_at",
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(comment_from_row(&row))
    }
}

pub(crate) fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        parent_id: row.get("parent_id"),
        author: row.get("author"),
        body: row.get("body"),
        deleted: row.get("deleted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
