//! # Taskboard Shared Library
//!
//! Domain core of the Taskboard task manager, used by the API server and its
//! tests.
//!
//! ## Module Organization
//!
//! - `models`: Users, statuses, labels and tasks, with their store operations
//! - `db`: Connection pool, migrations and SQLSTATE helpers
//! - `auth`: Passwords, session tokens, principals and the ownership policy
//! - `guard`: Deletion guard for entities that tasks reference
//! - `filter`: Task list filtering and pagination

pub mod auth;
pub mod db;
pub mod filter;
pub mod guard;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
