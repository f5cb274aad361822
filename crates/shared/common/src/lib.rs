//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - Unified error handling with HTTP response conversion
//! - Configuration structures
//! - Pagination types for list operations

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{PageRequest, Paginated, PaginationMeta, PaginationParams, RowRange};

#[cfg(feature = "openapi")]
pub use pagination::{ArchivePage, GradePage, LoginRecordPage, StudentPage};
