//! # Canvass Shared Library
//!
//! Shared types and business logic for the canvass voter-tracking service.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, JWT tokens, and role guards
//! - `scope`: Role-scoped visibility over the organizational tree
//! - `stats`: Statistics aggregation per scope
//! - `import`: Spreadsheet bulk import
//! - `pagination`: Page math shared by list endpoints
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod import;
pub mod models;
pub mod pagination;
pub mod scope;
pub mod stats;

/// Current version of the canvass shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
