//! Task domain module.
//!
//! This module contains the background generation task record, its closed
//! kind/status/source enums and the snapshot type broadcast to listeners.
//!
//! # Usage
//!
//! ```ignore
//! use tutor_core::task::{Task, TaskKind, TaskSnapshot, TaskSource, TaskStatus};
//! ```

mod model;

// Re-export public API
pub use model::{Task, TaskKind, TaskSnapshot, TaskSource, TaskStatus};
