//! Background task services.
//!
//! This module contains the task registry that tracks fire-and-forget
//! generation requests, the timer driver that simulates their progress,
//! and the subscription plumbing used to broadcast registry snapshots.

mod handle;
mod listeners;
mod service;
mod simulator;

pub use handle::TaskHandle;
pub use listeners::{Subscription, TaskListener};
pub use service::BackgroundTaskService;
