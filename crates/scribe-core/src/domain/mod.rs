//! Domain entities - the core business objects.

mod page;
mod post;
mod user;

pub use page::Page;
pub use post::{NewPost, Post, PostChanges, Viewer};
pub use user::{User, normalize_email};
