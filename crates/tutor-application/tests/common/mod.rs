//! Shared test doubles for the background task service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tutor_application::BackgroundTaskService;
use tutor_core::config::BackgroundTaskConfig;
use tutor_core::generation::{GenerationApi, GenerationError, LearningPreferences};
use tutor_core::notification::{NotificationGateway, Toast, ToastSink};
use tutor_core::task::TaskKind;

/// Generation API that replays scripted outcomes in call order.
///
/// Calls beyond the script succeed with `{"ok": true}` after the default delay.
pub struct ScriptedGenerationApi {
    default_delay: Duration,
    script: Mutex<VecDeque<(Duration, Result<Value, GenerationError>)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerationApi {
    pub fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: Result<Value, GenerationError>) -> Self {
        let delay = self.default_delay;
        self.then_after(delay, result)
    }

    pub fn then_after(self, delay: Duration, result: Result<Value, GenerationError>) -> Self {
        self.script.lock().unwrap().push_back((delay, result));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, call: String) -> Result<Value, GenerationError> {
        self.calls.lock().unwrap().push(call);
        let (delay, result) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((self.default_delay, Ok(json!({"ok": true}))));
        tokio::time::sleep(delay).await;
        result
    }
}

#[async_trait]
impl GenerationApi for ScriptedGenerationApi {
    async fn create_learning_path(
        &self,
        subject: &str,
        _preferences: &LearningPreferences,
    ) -> Result<Value, GenerationError> {
        self.respond(format!("learning_path:{subject}")).await
    }

    async fn generate_modules(&self, path_id: &str) -> Result<Value, GenerationError> {
        self.respond(format!("modules:{path_id}")).await
    }

    async fn generate_topic_content(&self, module_id: &str) -> Result<Value, GenerationError> {
        self.respond(format!("topics:{module_id}")).await
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    pub granted: AtomicBool,
    pub permission_requests: AtomicUsize,
    pub content_ready: Mutex<Vec<(TaskKind, String)>>,
    pub progress: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn request_permission(&self) -> bool {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        self.granted.store(true, Ordering::SeqCst);
        true
    }

    fn is_permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn notify_content_ready(&self, kind: TaskKind, title: &str) {
        self.content_ready
            .lock()
            .unwrap()
            .push((kind, title.to_string()));
    }

    fn notify_progress(&self, message: &str) {
        self.progress.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingToasts {
    pub shown: Mutex<Vec<Toast>>,
}

impl RecordingToasts {
    pub fn all(&self) -> Vec<Toast> {
        self.shown.lock().unwrap().clone()
    }
}

impl ToastSink for RecordingToasts {
    fn show(&self, toast: Toast) {
        self.shown.lock().unwrap().push(toast);
    }
}

pub struct Harness {
    pub service: Arc<BackgroundTaskService>,
    pub api: Arc<ScriptedGenerationApi>,
    pub gateway: Arc<RecordingGateway>,
    pub toasts: Arc<RecordingToasts>,
}

pub fn harness(api: ScriptedGenerationApi) -> Harness {
    let api = Arc::new(api);
    let gateway = Arc::new(RecordingGateway::default());
    let toasts = Arc::new(RecordingToasts::default());
    let service = Arc::new(BackgroundTaskService::new(
        api.clone(),
        gateway.clone(),
        toasts.clone(),
        BackgroundTaskConfig::default(),
    ));

    Harness {
        service,
        api,
        gateway,
        toasts,
    }
}

/// Lets virtual time pass and spawned tasks run.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
