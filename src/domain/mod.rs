pub mod attachment;
pub mod comment;
pub mod post;
