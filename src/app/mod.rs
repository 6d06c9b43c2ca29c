pub mod attachments;
pub mod comments;
pub mod credentials;
pub mod posts;

use thiserror::Error;

/// Failure surface shared by the services. Password mismatches and missing
/// entities are typed so the HTTP layer can map them to client errors;
/// everything else bubbles up as a server error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid password")]
    InvalidPassword,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
