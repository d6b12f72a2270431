pub mod config;
pub mod error;
pub mod event;
pub mod generation;
pub mod notification;
pub mod progress;
pub mod retry;
pub mod task;

// Re-export common error type
pub use error::TutorError;
