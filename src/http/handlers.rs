use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app::attachments::{AttachmentService, UploadedFile};
use crate::app::comments::{CommentService, NewComment};
use crate::app::posts::{NewPost, PostEdit, PostService};
use crate::domain::comment::Comment;
use crate::domain::post::{Post, PostDetail, PostSummary, SearchField};
use crate::http::AppError;
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_AUTHOR_LEN: usize = 100;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_COMMENT_LEN: usize = 2000;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub author: String,
    pub password: String,
}

fn validate_post_form(form: &PostForm) -> Result<(), AppError> {
    if form.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    if form.title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    if form.content.trim().is_empty() {
        return Err(AppError::bad_request("content is required"));
    }
    if form.author.trim().is_empty() {
        return Err(AppError::bad_request("author is required"));
    }
    if form.author.chars().count() > MAX_AUTHOR_LEN {
        return Err(AppError::bad_request(format!(
            "author must be at most {} characters",
            MAX_AUTHOR_LEN
        )));
    }
    validate_password(&form.password)
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::bad_request("password is required"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Pulls the `data` JSON part and any `files` parts out of a multipart body.
/// Everything else is ignored.
async fn parse_multipart_form<T: DeserializeOwned>(
    mut multipart: Multipart,
) -> Result<(T, Vec<UploadedFile>), AppError> {
    let mut data: Option<T> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart body: {}", err)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("data") => {
                let text = field.text().await.map_err(|err| {
                    AppError::bad_request(format!("invalid data part: {}", err))
                })?;
                data = Some(serde_json::from_str(&text).map_err(|err| {
                    AppError::bad_request(format!("invalid data part: {}", err))
                })?);
            }
            Some("files") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "file".to_string());
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(|err| {
                    AppError::bad_request(format!("invalid file part: {}", err))
                })?;
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    data: bytes,
                });
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::bad_request("missing data part"))?;
    Ok((data, files))
}

pub async fn create_post(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Post>, AppError> {
    let (form, files) = parse_multipart_form::<PostForm>(multipart).await?;
    validate_post_form(&form)?;

    let service = PostService::new(state.db.clone(), state.files.clone());
    let post = service
        .create(
            NewPost {
                title: form.title,
                content: form.content,
                author: form.author,
                password: form.password,
            },
            files,
        )
        .await?;

    Ok(Json(post))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostDetail>, AppError> {
    let service = PostService::new(state.db.clone(), state.files.clone());
    let detail = service.get(post_id).await?;

    match detail {
        Some(detail) => Ok(Json(detail)),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let service = PostService::new(state.db.clone(), state.files.clone());
    let posts = service.list().await?;
    Ok(Json(posts))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub field: SearchField,
    pub keyword: String,
}

pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    if query.keyword.trim().is_empty() {
        return Err(AppError::bad_request("keyword is required"));
    }

    let service = PostService::new(state.db.clone(), state.files.clone());
    let posts = service.search(query.field, &query.keyword).await?;
    Ok(Json(posts))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Post>, AppError> {
    let (form, files) = parse_multipart_form::<PostForm>(multipart).await?;
    validate_post_form(&form)?;

    let service = PostService::new(state.db.clone(), state.files.clone());
    let post = service
        .update(
            post_id,
            PostEdit {
                title: form.title,
                content: form.content,
                author: form.author,
                password: form.password,
            },
            files,
        )
        .await?;

    Ok(Json(post))
}

#[derive(Deserialize)]
pub struct PasswordBody {
    pub password: String,
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(payload): Json<PasswordBody>,
) -> Result<StatusCode, AppError> {
    validate_password(&payload.password)?;

    let service = PostService::new(state.db.clone(), state.files.clone());
    service.delete(post_id, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: i32,
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeResponse>, AppError> {
    let service = PostService::new(state.db.clone(), state.files.clone());
    let liked = service.like(post_id).await?;
    Ok(Json(LikeResponse { liked }))
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

pub async fn download_file(
    State(state): State<AppState>,
    Path(attachment_id): Path<i64>,
) -> Result<Response, AppError> {
    let service = AttachmentService::new(state.db.clone(), state.files.clone());
    let download = service.download(attachment_id).await?;

    let Some(download) = download else {
        return Err(AppError::not_found("file not found"));
    };

    // keep the disposition header parseable whatever the original name was
    let file_name = download.file_name.replace(['"', '\r', '\n'], "_");
    let headers = [
        (header::CONTENT_TYPE, download.content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];

    Ok((headers, download.data).into_response())
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub password: String,
    pub body: String,
}

fn validate_comment_body(body: &str) -> Result<(), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::bad_request("body is required"));
    }
    if body.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(format!(
            "body must be at most {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(())
}

pub async fn create_comment(
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    if payload.author.trim().is_empty() {
        return Err(AppError::bad_request("author is required"));
    }
    if payload.author.chars().count() > MAX_AUTHOR_LEN {
        return Err(AppError::bad_request(format!(
            "author must be at most {} characters",
            MAX_AUTHOR_LEN
        )));
    }
    validate_password(&payload.password)?;
    validate_comment_body(&payload.body)?;

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create(NewComment {
            post_id: payload.post_id,
            parent_id: payload.parent_id,
            author: payload.author,
            password: payload.password,
            body: payload.body,
        })
        .await?;

    Ok(Json(comment))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comments = service.list_by_post(post_id).await?;
    Ok(Json(comments))
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub password: String,
    pub body: String,
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    validate_password(&payload.password)?;
    validate_comment_body(&payload.body)?;

    let service = CommentService::new(state.db.clone());
    let comment = service
        .update(comment_id, &payload.password, &payload.body)
        .await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Json(payload): Json<PasswordBody>,
) -> Result<Json<Comment>, AppError> {
    validate_password(&payload.password)?;

    let service = CommentService::new(state.db.clone());
    let comment = service.soft_delete(comment_id, &payload.password).await?;

    Ok(Json(comment))
}
