//! # Scribe Core
//!
//! The domain layer of the Scribe publishing API: post and user entities, the
//! visibility policy, request validation schemas, ports, and the post service.
//! No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod validation;

pub use error::{DomainError, RepoError};
pub use services::PostService;
