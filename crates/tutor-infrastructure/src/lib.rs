//! Adapters for the tutor client: configuration on disk, platform paths,
//! tracing setup and default notification sinks.

pub mod config_service;
pub mod logging;
pub mod notification;
pub mod paths;
pub mod timeout_api;

pub use crate::config_service::ConfigService;
pub use crate::logging::init_tracing;
pub use crate::notification::{TracingNotificationGateway, TracingToastSink};
pub use crate::paths::{PathError, TutorPaths};
pub use crate::timeout_api::TimeoutGenerationApi;
