//! Request timeouts for any [`GenerationApi`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tutor_core::config::RequestTimeoutConfig;
use tutor_core::generation::{GenerationApi, GenerationError, LearningPreferences};

/// Wraps a [`GenerationApi`] and fails calls that exceed their configured
/// timeout with [`GenerationError::Timeout`].
#[derive(Debug)]
pub struct TimeoutGenerationApi<A> {
    inner: A,
    learning_path: Duration,
    modules: Duration,
    topics: Duration,
}

impl<A: GenerationApi> TimeoutGenerationApi<A> {
    pub fn new(inner: A, config: &RequestTimeoutConfig) -> Self {
        Self {
            inner,
            learning_path: Duration::from_secs(config.learning_path_secs),
            modules: Duration::from_secs(config.modules_secs),
            topics: Duration::from_secs(config.topics_secs),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

async fn bounded<F>(operation: &str, limit: Duration, call: F) -> Result<Value, GenerationError>
where
    F: Future<Output = Result<Value, GenerationError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => {
            let after_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(target: "generation", operation, after_ms, "Generation request timed out");
            Err(GenerationError::Timeout { after_ms })
        }
    }
}

#[async_trait]
impl<A: GenerationApi> GenerationApi for TimeoutGenerationApi<A> {
    async fn create_learning_path(
        &self,
        subject: &str,
        preferences: &LearningPreferences,
    ) -> Result<Value, GenerationError> {
        bounded(
            "create_learning_path",
            self.learning_path,
            self.inner.create_learning_path(subject, preferences),
        )
        .await
    }

    async fn generate_modules(&self, path_id: &str) -> Result<Value, GenerationError> {
        bounded(
            "generate_modules",
            self.modules,
            self.inner.generate_modules(path_id),
        )
        .await
    }

    async fn generate_topic_content(&self, module_id: &str) -> Result<Value, GenerationError> {
        bounded(
            "generate_topic_content",
            self.topics,
            self.inner.generate_topic_content(module_id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Answers every call after a fixed delay.
    struct SlowApi(Duration);

    #[async_trait]
    impl GenerationApi for SlowApi {
        async fn create_learning_path(
            &self,
            subject: &str,
            _preferences: &LearningPreferences,
        ) -> Result<Value, GenerationError> {
            tokio::time::sleep(self.0).await;
            Ok(json!({ "subject": subject }))
        }

        async fn generate_modules(&self, _path_id: &str) -> Result<Value, GenerationError> {
            tokio::time::sleep(self.0).await;
            Err(GenerationError::server(500, "boom"))
        }

        async fn generate_topic_content(&self, module_id: &str) -> Result<Value, GenerationError> {
            tokio::time::sleep(self.0).await;
            Ok(json!({ "module": module_id }))
        }
    }

    fn config() -> RequestTimeoutConfig {
        RequestTimeoutConfig {
            learning_path_secs: 10,
            modules_secs: 10,
            topics_secs: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_calls_pass_through() {
        let api = TimeoutGenerationApi::new(SlowApi(Duration::from_secs(5)), &config());

        let path = api
            .create_learning_path("Rust", &LearningPreferences::default())
            .await
            .unwrap();
        assert_eq!(path, json!({ "subject": "Rust" }));

        let err = api.generate_modules("p-1").await.unwrap_err();
        assert_eq!(err, GenerationError::server(500, "boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let api = TimeoutGenerationApi::new(SlowApi(Duration::from_secs(5)), &config());

        let err = api.generate_topic_content("m-1").await.unwrap_err();

        assert_eq!(err, GenerationError::Timeout { after_ms: 1_000 });
        assert!(matches!(
            err.class(),
            tutor_core::generation::ErrorClass::Network
        ));
    }
}
