//! In-memory repositories.
//!
//! Used when no database is configured and by tests. Data is lost on restart.

mod posts;
mod users;

pub use posts::InMemoryPostRepository;
pub use users::InMemoryUserRepository;
