//! Core library for the planner bot.
//!
//! This crate provides the domain models and database operations for the
//! to-do list, independent of any transport layer (Telegram, CLI, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use planner_core::db::Database;
//! use planner_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let tasks = db.list_tasks(42)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod models;

// Re-export commonly used types at crate root
pub use db::Database;
