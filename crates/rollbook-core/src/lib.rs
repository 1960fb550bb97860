//! # Rollbook Core
//!
//! Foundational types shared by every Rollbook crate:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page-based pagination parameters and response metadata

pub mod errors;
pub mod pagination;

pub use errors::{AppError, ErrorResponse};
pub use pagination::{PaginationMeta, PaginationParams};
