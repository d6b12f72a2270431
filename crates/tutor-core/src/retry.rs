//! Failure policy for background generation.
//!
//! Maps a [`GenerationError`] to the toast the learner sees and, for learning
//! path creation, to whether one automatic retry is scheduled.

use std::time::Duration;

use crate::config::BackgroundTaskConfig;
use crate::generation::{ErrorClass, GenerationError};
use crate::notification::Toast;
use crate::task::TaskKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_auto_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&BackgroundTaskConfig::default())
    }
}

impl From<&BackgroundTaskConfig> for RetryPolicy {
    fn from(config: &BackgroundTaskConfig) -> Self {
        Self {
            max_auto_retries: config.max_auto_retries,
            delay: config.auto_retry_delay(),
        }
    }
}

/// What to tell the learner, and whether to try again on their behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureResponse {
    pub toast: Toast,
    pub retry_after: Option<Duration>,
}

/// Decides the response to a failed learning path creation.
///
/// `attempt` counts the automatic retries already spent on this request.
pub fn learning_path_failure_response(
    error: &GenerationError,
    subject: &str,
    attempt: u32,
    policy: &RetryPolicy,
) -> FailureResponse {
    let title = "Learning path creation failed";

    if error.is_auto_retryable() {
        if attempt < policy.max_auto_retries {
            return FailureResponse {
                toast: Toast::warning(
                    "Temporary server issue",
                    format!(
                        "The AI service hit a temporary issue while creating \"{subject}\". \
                         Retrying automatically in {} seconds...",
                        policy.delay.as_secs()
                    ),
                ),
                retry_after: Some(policy.delay),
            };
        }
        return FailureResponse {
            toast: Toast::error(
                title,
                format!(
                    "Creating \"{subject}\" failed again after an automatic retry. \
                     Please try again manually in a moment."
                ),
            ),
            retry_after: None,
        };
    }

    let message = match (error.class(), error) {
        (ErrorClass::TransientRemote, GenerationError::Server { status, .. }) => format!(
            "The server encountered an error ({status}) while creating \"{subject}\". \
             Please try again shortly."
        ),
        (ErrorClass::TransientRemote, _) => {
            "The learning path service is temporarily unavailable. Please try again in a few minutes."
                .to_string()
        }
        (ErrorClass::Network, _) => {
            "Could not reach the server. Check your connection and try again.".to_string()
        }
        (ErrorClass::Validation, _) => {
            format!("The request for \"{subject}\" was rejected: {error}")
        }
        (ErrorClass::Other, _) => {
            format!("Failed to create a learning path for \"{subject}\": {error}")
        }
    };

    FailureResponse {
        toast: Toast::error(title, message),
        retry_after: None,
    }
}

/// The single error toast for modules and topic generation; never retried.
pub fn generation_failure_toast(kind: TaskKind, title: &str, error: &GenerationError) -> Toast {
    Toast::error(
        format!("Failed to generate {}", kind.label()),
        format!("Could not generate {} for \"{title}\": {error}", kind.label()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::ToastLevel;

    fn known_bug() -> GenerationError {
        GenerationError::KnownTransientBug {
            message: "connection pool exhausted".to_string(),
        }
    }

    #[test]
    fn test_known_bug_retries_once() {
        let policy = RetryPolicy::default();

        let first = learning_path_failure_response(&known_bug(), "Rust", 0, &policy);
        assert_eq!(first.retry_after, Some(Duration::from_secs(5)));
        assert_eq!(first.toast.level, ToastLevel::Warning);
        assert!(first.toast.message.contains("5 seconds"));

        let second = learning_path_failure_response(&known_bug(), "Rust", 1, &policy);
        assert_eq!(second.retry_after, None);
        assert_eq!(second.toast.level, ToastLevel::Error);
        assert!(second.toast.message.contains("manually"));
    }

    #[test]
    fn test_retries_can_be_disabled() {
        let policy = RetryPolicy {
            max_auto_retries: 0,
            delay: Duration::from_secs(5),
        };
        let response = learning_path_failure_response(&known_bug(), "Rust", 0, &policy);
        assert!(response.retry_after.is_none());
    }

    #[test]
    fn test_other_errors_never_retry_and_differ() {
        let policy = RetryPolicy::default();
        let errors = [
            GenerationError::Unavailable {
                message: "maintenance".into(),
            },
            GenerationError::server(502, "bad gateway"),
            GenerationError::network("ECONNREFUSED"),
            GenerationError::server(400, "subject missing"),
            GenerationError::other("weird"),
        ];

        let messages: Vec<String> = errors
            .iter()
            .map(|err| {
                let response = learning_path_failure_response(err, "Rust", 0, &policy);
                assert!(response.retry_after.is_none(), "{err}");
                assert_eq!(response.toast.level, ToastLevel::Error);
                response.toast.message
            })
            .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_timeout_reads_like_network() {
        let policy = RetryPolicy::default();
        let timeout =
            learning_path_failure_response(&GenerationError::Timeout { after_ms: 1 }, "Rust", 0, &policy);
        let network =
            learning_path_failure_response(&GenerationError::network("down"), "Rust", 0, &policy);
        assert_eq!(timeout.toast, network.toast);
    }

    #[test]
    fn test_message_follows_error_class() {
        let policy = RetryPolicy::default();
        let respond = |err: GenerationError| {
            learning_path_failure_response(&err, "Rust", 0, &policy).toast.message
        };

        assert!(respond(GenerationError::server(502, "bad gateway")).contains("(502)"));
        assert!(respond(GenerationError::server(404, "missing")).contains("was rejected"));
        assert!(
            respond(GenerationError::InvalidRequest {
                message: "empty subject".to_string()
            })
            .contains("was rejected")
        );
        assert!(
            respond(GenerationError::Unavailable {
                message: "maintenance".to_string()
            })
            .contains("temporarily unavailable")
        );
    }

    #[test]
    fn test_generation_failure_toast() {
        let toast = generation_failure_toast(
            TaskKind::Modules,
            "Ownership",
            &GenerationError::server(500, "oops"),
        );
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.title, "Failed to generate modules");
        assert!(toast.message.contains("Ownership"));
    }
}
