//! # Taskboard API Server Library
//!
//! Request handling for the task manager: sessions, the access gate,
//! ownership checks and the CRUD pages for users, statuses, labels and tasks.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Access gate, host validation, security headers
//! - `notice`: One-shot notices carried across redirects
//! - `routes`: Route handlers
//! - `telemetry`: Optional error reporting

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod notice;
pub mod routes;
pub mod telemetry;
