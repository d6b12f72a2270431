use serde_json::Value;
use tokio::task::JoinHandle;
use tutor_core::error::{Result, TutorError};

/// Handle to a background generation started by [`BackgroundTaskService`].
///
/// The task is registered before the handle is returned. Dropping the handle
/// does not cancel anything; the request runs to completion and the outcome
/// is still recorded on the task.
///
/// [`BackgroundTaskService`]: super::BackgroundTaskService
#[derive(Debug)]
pub struct TaskHandle {
    id: String,
    join: JoinHandle<Result<Value>>,
}

impl TaskHandle {
    pub(crate) fn new(id: String, join: JoinHandle<Result<Value>>) -> Self {
        Self { id, join }
    }

    /// Id of the registered task.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the request has settled.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the request to settle.
    ///
    /// Resolves after the task has been finalized in the registry. A rejected
    /// request comes back as [`TutorError::Generation`] carrying the original
    /// error; the rejection has already been recorded on the task.
    pub async fn wait(self) -> Result<Value> {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => Err(TutorError::internal(format!(
                "Background task {} did not finish: {}",
                self.id, e
            ))),
        }
    }
}
