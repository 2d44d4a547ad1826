//! Application services - use cases composed from domain rules and ports.

mod posts;

pub use posts::{PUBLISHED_PAGE_SIZE, PostService};
