//! Application layer for the tutoring client.
//!
//! This crate hosts the background task service: the in-memory registry of
//! long-running AI generation requests, its progress simulator, and the
//! listener mechanism the UI subscribes to.

pub mod background_task;

pub use background_task::{BackgroundTaskService, Subscription, TaskHandle, TaskListener};
