use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A threaded reply to a post. `parent_id` points at another comment on the
/// same post, giving one level of nesting. The password hash never leaves the
/// database layer; soft-deleted comments keep their row and are exposed with
/// `deleted` set so listings can flag or filter them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub body: String,
    pub deleted: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
