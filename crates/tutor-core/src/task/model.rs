//! Background task domain model.
//!
//! This module contains the Task record tracked by the background task
//! registry, the closed enums describing it, and the forward-only state
//! machine that governs its lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::error::{Result, TutorError};

/// The category of content a background task generates.
///
/// The kind decides which progress messages and which completion copy are
/// shown to the learner.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaskKind {
    LearningPath,
    Modules,
    Topics,
    OnboardingPath,
    Course,
}

impl TaskKind {
    /// Heading and body shown when content of this kind becomes ready.
    pub fn content_ready_copy(&self, title: &str) -> (String, String) {
        match self {
            TaskKind::LearningPath => (
                "Learning path ready".to_string(),
                format!("Your learning path for \"{title}\" is ready to explore."),
            ),
            TaskKind::OnboardingPath => (
                "Your personalized path is ready".to_string(),
                format!("We finished building \"{title}\" from your onboarding answers."),
            ),
            TaskKind::Modules => (
                "Modules generated".to_string(),
                format!("New modules for \"{title}\" are ready."),
            ),
            TaskKind::Topics => (
                "Topics generated".to_string(),
                format!("Topic content for \"{title}\" is ready to study."),
            ),
            TaskKind::Course => (
                "Course ready".to_string(),
                format!("Your course \"{title}\" has been generated."),
            ),
        }
    }

    /// Short label used in toasts and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::LearningPath | TaskKind::OnboardingPath => "learning path",
            TaskKind::Modules => "modules",
            TaskKind::Topics => "topic content",
            TaskKind::Course => "course",
        }
    }
}

/// Represents the current status of a background task.
///
/// Transitions are strictly forward: `Pending -> InProgress -> {Completed | Failed}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaskStatus {
    /// Reserved; the generation flows start directly in `InProgress`.
    Pending,
    /// The remote request is in flight and progress is being simulated.
    InProgress,
    /// The request resolved successfully.
    Completed,
    /// The request was rejected.
    Failed,
}

impl TaskStatus {
    /// Returns true for `Pending` and `InProgress`.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Provenance of a background task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaskSource {
    /// Queued by the onboarding wizard, which aggregates feedback itself.
    Onboarding,
    /// Started directly by the learner.
    Manual,
    /// Started from the enhanced creation form.
    Enhanced,
}

impl TaskSource {
    /// Whether the registry must leave toasts and notifications to the caller.
    pub fn suppresses_feedback(&self) -> bool {
        matches!(self, TaskSource::Onboarding)
    }
}

/// One tracked background generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, also the correlation token for lifecycle events.
    pub id: String,
    pub kind: TaskKind,
    /// Human-readable label (subject name, module title, ...).
    pub title: String,
    pub status: TaskStatus,
    /// 0-100. Capped below 100 until the request resolves.
    pub progress: u8,
    /// Epoch milliseconds.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TaskSource>,
    /// Id of the failed task this one automatically retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<String>,
    /// Number of automatic retries that preceded this task.
    #[serde(default)]
    pub attempt: u32,
}

impl Task {
    /// Creates a task that is already in flight.
    ///
    /// All generation flows start in `InProgress`; `Pending` is never used as
    /// an entry state.
    pub fn in_progress(
        kind: TaskKind,
        title: impl Into<String>,
        source: Option<TaskSource>,
        start_time: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            status: TaskStatus::InProgress,
            progress: 0,
            start_time,
            end_time: None,
            error: None,
            result: None,
            source,
            retry_of: None,
            attempt: 0,
        }
    }

    /// Marks this task as an automatic retry of `original_id`.
    pub fn retrying(mut self, original_id: impl Into<String>, attempt: u32) -> Self {
        self.retry_of = Some(original_id.into());
        self.attempt = attempt;
        self
    }

    /// Whether the caller owns the user-facing feedback for this task.
    pub fn suppresses_feedback(&self) -> bool {
        self.source.is_some_and(|s| s.suppresses_feedback())
    }

    /// Raises the simulated progress.
    ///
    /// Returns `false` without touching the record when the task is not in
    /// flight. Progress never decreases.
    pub fn advance_progress(&mut self, progress: u8) -> bool {
        if self.status != TaskStatus::InProgress {
            return false;
        }
        self.progress = self.progress.max(progress.min(100));
        true
    }

    /// `InProgress -> Completed`: stores the result and pins progress at 100.
    pub fn complete(&mut self, result: Value, at: i64) -> Result<()> {
        self.transition(TaskStatus::Completed)?;
        self.progress = 100;
        self.end_time = Some(at);
        self.result = Some(result);
        Ok(())
    }

    /// `InProgress -> Failed`: records the error, progress stays where it was.
    pub fn fail(&mut self, error: impl Into<String>, at: i64) -> Result<()> {
        self.transition(TaskStatus::Failed)?;
        self.end_time = Some(at);
        self.error = Some(error.into());
        Ok(())
    }

    /// Wall-clock duration in milliseconds, once terminal.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time.map(|end| end - self.start_time)
    }

    fn transition(&mut self, to: TaskStatus) -> Result<()> {
        let legal = matches!(
            (self.status, to),
            (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Completed | TaskStatus::Failed)
        );
        if !legal {
            return Err(TutorError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Full registry state handed to listeners on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Strictly increasing per broadcast; larger means newer.
    pub revision: u64,
    pub tasks: Vec<Task>,
}

impl TaskSnapshot {
    /// Tasks that are pending or in progress.
    pub fn active(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.status.is_active())
    }

    /// Point lookup by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
