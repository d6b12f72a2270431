//! Background task registry.
//!
//! This module provides the `BackgroundTaskService`, which tracks long-running
//! AI generation requests (learning paths, modules, topic content), simulates
//! their progress while they are in flight, finalizes them when the request
//! settles, and broadcasts every change to registered listeners.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tutor_core::config::BackgroundTaskConfig;
use tutor_core::error::TutorError;
use tutor_core::event::{DomainEvent, EventBus, GenerationEvent};
use tutor_core::generation::{GenerationApi, GenerationError, LearningPreferences};
use tutor_core::notification::{NotificationGateway, Toast, ToastSink};
use tutor_core::progress::{estimated_ticks, simulated_progress, stage_message};
use tutor_core::retry::{self, RetryPolicy};
use tutor_core::task::{Task, TaskKind, TaskSnapshot, TaskSource};

use super::handle::TaskHandle;
use super::listeners::{ListenerSet, Subscription, TaskListener};
use super::simulator::{self, ProgressSink, SimulationPlan, TickOutcome};

/// The remote call behind a task, kept so it can be retried verbatim.
#[derive(Debug, Clone)]
enum Request {
    LearningPath {
        subject: String,
        preferences: LearningPreferences,
        source: TaskSource,
    },
    Modules {
        path_id: String,
    },
    Topics {
        module_id: String,
    },
}

/// Identity of a launched task, carried by its request future.
#[derive(Debug, Clone)]
struct Launch {
    task_id: String,
    kind: TaskKind,
    title: String,
    suppress_feedback: bool,
    attempt: u32,
}

#[derive(Default)]
struct RegistryState {
    tasks: HashMap<String, Task>,
    /// Simulator handle per in-flight task.
    timers: HashMap<String, JoinHandle<()>>,
    revision: u64,
}

impl RegistryState {
    fn sorted_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    /// Snapshot for a broadcast. Bumps the revision.
    fn next_snapshot(&mut self) -> TaskSnapshot {
        self.revision += 1;
        TaskSnapshot {
            revision: self.revision,
            tasks: self.sorted_tasks(),
        }
    }

    fn stop_timer(&mut self, task_id: &str) {
        if let Some(timer) = self.timers.remove(task_id) {
            timer.abort();
        }
    }
}

/// In-memory registry of background generation tasks.
///
/// `BackgroundTaskService` is responsible for:
/// - Registering a task the moment a generation is requested
/// - Simulating progress while the request is in flight
/// - Finalizing the task when the request resolves or rejects
/// - Applying the failure policy (toasts, one automatic retry)
/// - Broadcasting a full snapshot to listeners after every change
/// - Publishing domain events for successful generations
///
/// # Runtime
///
/// Queries and removals are synchronous. The `*_in_background` operations
/// spawn onto the current Tokio runtime and must be called from within one.
pub struct BackgroundTaskService {
    /// Remote generation endpoints
    api: Arc<dyn GenerationApi>,
    /// System notifications (content ready, progress lines)
    notifications: Arc<dyn NotificationGateway>,
    /// In-app toasts
    toasts: Arc<dyn ToastSink>,
    /// Domain events for unrelated consumers
    events: EventBus,
    config: BackgroundTaskConfig,
    state: Mutex<RegistryState>,
    listeners: Arc<ListenerSet>,
}

impl BackgroundTaskService {
    /// Creates a new `BackgroundTaskService`.
    ///
    /// # Arguments
    ///
    /// * `api` - The remote generation endpoints
    /// * `notifications` - Gateway for system notifications
    /// * `toasts` - Sink for in-app toasts
    /// * `config` - Simulator pacing and retry settings
    pub fn new(
        api: Arc<dyn GenerationApi>,
        notifications: Arc<dyn NotificationGateway>,
        toasts: Arc<dyn ToastSink>,
        config: BackgroundTaskConfig,
    ) -> Self {
        Self {
            api,
            notifications,
            toasts,
            events: EventBus::new(),
            config,
            state: Mutex::new(RegistryState::default()),
            listeners: Arc::new(ListenerSet::default()),
        }
    }

    /// Publishes domain events on `events` instead of a private bus.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Receiver for `LearningPathCreated`, `ModulesGenerated` and `TopicsGenerated`.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Asks for notification permission unless it was granted already.
    pub async fn init_notifications(&self) -> bool {
        if self.notifications.is_permission_granted() {
            return true;
        }
        let granted = self.notifications.request_permission().await;
        tracing::info!("[BackgroundTasks] Notification permission granted: {}", granted);
        granted
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Starts creating a learning path for `subject`.
    ///
    /// The task is registered (and listeners notified) before this returns.
    /// Tasks from onboarding get the `onboarding-path` kind and leave toasts
    /// and notifications to the onboarding flow.
    pub fn create_learning_path_in_background(
        self: &Arc<Self>,
        subject: impl Into<String>,
        preferences: LearningPreferences,
        source: TaskSource,
    ) -> TaskHandle {
        self.launch_learning_path(subject.into(), preferences, source, None)
    }

    /// Starts generating the modules of the learning path `path_id`.
    pub fn generate_modules_in_background(
        self: &Arc<Self>,
        path_id: impl Into<String>,
        path_title: impl Into<String>,
    ) -> TaskHandle {
        let task = Task::in_progress(TaskKind::Modules, path_title, None, now_ms());
        self.launch(
            task,
            Request::Modules {
                path_id: path_id.into(),
            },
        )
    }

    /// Starts generating the topic content of module `module_id`.
    pub fn generate_topics_in_background(
        self: &Arc<Self>,
        module_id: impl Into<String>,
        module_title: impl Into<String>,
    ) -> TaskHandle {
        let task = Task::in_progress(TaskKind::Topics, module_title, None, now_ms());
        self.launch(
            task,
            Request::Topics {
                module_id: module_id.into(),
            },
        )
    }

    fn launch_learning_path(
        self: &Arc<Self>,
        subject: String,
        preferences: LearningPreferences,
        source: TaskSource,
        retry_of: Option<(String, u32)>,
    ) -> TaskHandle {
        let kind = match source {
            TaskSource::Onboarding => TaskKind::OnboardingPath,
            TaskSource::Manual | TaskSource::Enhanced => TaskKind::LearningPath,
        };
        let mut task = Task::in_progress(kind, subject.clone(), Some(source), now_ms());
        if let Some((original_id, attempt)) = retry_of {
            task = task.retrying(original_id, attempt);
        }

        self.launch(
            task,
            Request::LearningPath {
                subject,
                preferences,
                source,
            },
        )
    }

    fn launch(self: &Arc<Self>, task: Task, request: Request) -> TaskHandle {
        let launch = Launch {
            task_id: task.id.clone(),
            kind: task.kind,
            title: task.title.clone(),
            suppress_feedback: task.suppresses_feedback(),
            attempt: task.attempt,
        };
        let plan = self.simulation_plan(task.kind);

        let snapshot = {
            let mut state = self.lock_state();
            let timer = simulator::spawn(Arc::downgrade(self), task.id.clone(), plan);
            state.timers.insert(task.id.clone(), timer);
            state.tasks.insert(task.id.clone(), task);
            state.next_snapshot()
        };
        tracing::info!(
            "[BackgroundTasks] Started {} task {} for '{}' (attempt {})",
            launch.kind,
            launch.task_id,
            launch.title,
            launch.attempt
        );
        self.listeners.notify(&snapshot);

        let service = Arc::clone(self);
        let task_id = launch.task_id.clone();
        let join = tokio::spawn(async move {
            match service.execute(&request).await {
                Ok(result) => {
                    service.finish_success(&launch, result.clone()).await;
                    Ok(result)
                }
                Err(err) => {
                    service.finish_failure(&launch, &request, &err);
                    Err(TutorError::Generation(err))
                }
            }
        });

        TaskHandle::new(task_id, join)
    }

    async fn execute(&self, request: &Request) -> Result<Value, GenerationError> {
        match request {
            Request::LearningPath {
                subject,
                preferences,
                ..
            } => self.api.create_learning_path(subject, preferences).await,
            Request::Modules { path_id } => self.api.generate_modules(path_id).await,
            Request::Topics { module_id } => self.api.generate_topic_content(module_id).await,
        }
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    async fn finish_success(&self, launch: &Launch, result: Value) {
        let snapshot = {
            let mut state = self.lock_state();
            state.stop_timer(&launch.task_id);
            let completed = state
                .tasks
                .get_mut(&launch.task_id)
                .map(|task| task.complete(result.clone(), now_ms()));
            match completed {
                Some(Ok(())) => Some(state.next_snapshot()),
                Some(Err(e)) => {
                    tracing::warn!("[BackgroundTasks] Ignoring completion: {}", e);
                    None
                }
                None => None,
            }
        };

        match snapshot {
            Some(snapshot) => {
                tracing::info!(
                    "[BackgroundTasks] {} task {} for '{}' completed",
                    launch.kind,
                    launch.task_id,
                    launch.title
                );
                self.listeners.notify(&snapshot);

                if !launch.suppress_feedback {
                    self.notifications
                        .notify_content_ready(launch.kind, &launch.title)
                        .await;
                    let (heading, body) = launch.kind.content_ready_copy(&launch.title);
                    self.toasts.show(Toast::success(heading, body));
                }
            }
            None => tracing::info!(
                "[BackgroundTasks] Task {} was dismissed before its request completed",
                launch.task_id
            ),
        }

        // Consumers may still need to refresh even if the record was dismissed
        let payload = GenerationEvent {
            title: launch.title.clone(),
            task_id: launch.task_id.clone(),
            result,
        };
        if let Some(event) = DomainEvent::for_kind(launch.kind, payload) {
            self.events.publish(event);
        }
    }

    fn finish_failure(self: &Arc<Self>, launch: &Launch, request: &Request, err: &GenerationError) {
        let snapshot = {
            let mut state = self.lock_state();
            state.stop_timer(&launch.task_id);
            let failed = state
                .tasks
                .get_mut(&launch.task_id)
                .map(|task| task.fail(err.to_string(), now_ms()));
            match failed {
                Some(Ok(())) => Some(state.next_snapshot()),
                Some(Err(e)) => {
                    tracing::warn!("[BackgroundTasks] Ignoring failure: {}", e);
                    None
                }
                None => None,
            }
        };

        let Some(snapshot) = snapshot else {
            tracing::info!(
                "[BackgroundTasks] Task {} was dismissed before its request failed: {}",
                launch.task_id,
                err
            );
            return;
        };

        tracing::warn!(
            "[BackgroundTasks] {} task {} for '{}' failed: {}",
            launch.kind,
            launch.task_id,
            launch.title,
            err
        );
        self.listeners.notify(&snapshot);

        match request {
            Request::LearningPath {
                subject,
                preferences,
                source,
            } => {
                let response = retry::learning_path_failure_response(
                    err,
                    subject,
                    launch.attempt,
                    &self.retry_policy(),
                );
                if !launch.suppress_feedback {
                    self.toasts.show(response.toast);
                }
                if let Some(delay) = response.retry_after {
                    self.schedule_retry(
                        delay,
                        launch,
                        subject.clone(),
                        preferences.clone(),
                        *source,
                    );
                }
            }
            Request::Modules { .. } | Request::Topics { .. } => {
                self.toasts.show(retry::generation_failure_toast(
                    launch.kind,
                    &launch.title,
                    err,
                ));
            }
        }
    }

    /// Re-issues a failed learning path request as a new task after `delay`.
    ///
    /// The failed task stays failed; the retry links back to it via `retry_of`.
    fn schedule_retry(
        self: &Arc<Self>,
        delay: Duration,
        launch: &Launch,
        subject: String,
        preferences: LearningPreferences,
        source: TaskSource,
    ) {
        let service = Arc::clone(self);
        let original_id = launch.task_id.clone();
        let attempt = launch.attempt + 1;
        tracing::info!(
            "[BackgroundTasks] Retrying '{}' in {}ms (attempt {})",
            subject,
            delay.as_millis(),
            attempt
        );

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let handle =
                service.launch_learning_path(subject, preferences, source, Some((original_id, attempt)));
            tracing::debug!("[BackgroundTasks] Retry task {} started", handle.id());
        });
    }

    // ========================================================================
    // Queries and removal
    // ========================================================================

    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.lock_state().tasks.get(task_id).cloned()
    }

    /// Every tracked task, oldest first.
    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.lock_state().sorted_tasks()
    }

    /// Tasks that are pending or in progress.
    pub fn get_active_tasks(&self) -> Vec<Task> {
        self.get_all_tasks()
            .into_iter()
            .filter(|task| task.status.is_active())
            .collect()
    }

    /// Current state without bumping the revision; for listeners that attach late.
    pub fn snapshot(&self) -> TaskSnapshot {
        let state = self.lock_state();
        TaskSnapshot {
            revision: state.revision,
            tasks: state.sorted_tasks(),
        }
    }

    /// Stops simulation and drops the record.
    ///
    /// The remote request itself is not cancelled. Unknown ids are a no-op.
    /// Returns whether a task was removed.
    pub fn remove_task(&self, task_id: &str) -> bool {
        let snapshot = {
            let mut state = self.lock_state();
            state.stop_timer(task_id);
            if state.tasks.remove(task_id).is_none() {
                return false;
            }
            state.next_snapshot()
        };

        tracing::debug!("[BackgroundTasks] Removed task {}", task_id);
        self.listeners.notify(&snapshot);
        true
    }

    /// Removes every completed or failed task. Returns how many were removed.
    pub fn clear_completed_tasks(&self) -> usize {
        let finished: Vec<String> = self
            .lock_state()
            .tasks
            .values()
            .filter(|task| task.status.is_terminal())
            .map(|task| task.id.clone())
            .collect();

        finished
            .iter()
            .filter(|task_id| self.remove_task(task_id))
            .count()
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers `listener` to receive the full snapshot after every change.
    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TaskSnapshot) + Send + Sync + 'static,
    {
        let listener: TaskListener = Arc::new(listener);
        self.listeners.add(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config)
    }

    fn simulation_plan(&self, kind: TaskKind) -> SimulationPlan {
        let estimates = &self.config.estimates;
        let estimate_secs = match kind {
            TaskKind::LearningPath | TaskKind::OnboardingPath => estimates.learning_path_secs,
            TaskKind::Modules | TaskKind::Course => estimates.modules_secs,
            TaskKind::Topics => estimates.topics_secs,
        };
        let tick_interval = self.config.tick_interval();

        SimulationPlan {
            tick_interval,
            total_ticks: estimated_ticks(Duration::from_secs(estimate_secs), tick_interval),
            message_every: self.config.progress_message_every_ticks,
        }
    }
}

impl ProgressSink for BackgroundTaskService {
    fn on_tick(&self, task_id: &str, ticks_elapsed: u32, plan: &SimulationPlan) -> TickOutcome {
        let progress = simulated_progress(ticks_elapsed, plan.total_ticks);

        let (snapshot, message) = {
            let mut state = self.lock_state();
            let advanced = match state.tasks.get_mut(task_id) {
                Some(task) => task.advance_progress(progress).then(|| {
                    (
                        task.kind,
                        task.title.clone(),
                        task.progress,
                        task.suppresses_feedback(),
                    )
                }),
                None => None,
            };
            let Some((kind, title, current, suppressed)) = advanced else {
                // Terminal or removed; the timer entry is normally gone already
                state.timers.remove(task_id);
                return TickOutcome::Stop;
            };

            // Onboarding aggregates its own status lines
            let message = (!suppressed
                && plan.message_every > 0
                && ticks_elapsed % plan.message_every == 0)
                .then(|| stage_message(kind, &title, current));
            (state.next_snapshot(), message)
        };

        tracing::debug!(
            target: "background_tasks",
            "Tick {} for {}: {}%",
            ticks_elapsed,
            task_id,
            progress
        );
        self.listeners.notify(&snapshot);
        if let Some(message) = message {
            self.notifications.notify_progress(&message);
        }
        TickOutcome::Continue
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
