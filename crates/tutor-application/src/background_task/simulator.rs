//! Timer driver for simulated progress.
//!
//! The driver only counts ticks. What a tick means for a task is decided by
//! the [`ProgressSink`], which also tells the driver when to stop.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SimulationPlan {
    pub tick_interval: Duration,
    /// Ticks expected before the request resolves.
    pub total_ticks: u32,
    /// A status line is surfaced every this many ticks; 0 disables it.
    pub message_every: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Continue,
    Stop,
}

pub(crate) trait ProgressSink: Send + Sync + 'static {
    fn on_tick(&self, task_id: &str, ticks_elapsed: u32, plan: &SimulationPlan) -> TickOutcome;
}

/// Spawns the ticking loop for `task_id`.
///
/// The loop ends when the sink says so, when the sink is dropped, or when the
/// returned handle is aborted.
pub(crate) fn spawn<S: ProgressSink>(
    sink: Weak<S>,
    task_id: String,
    plan: SimulationPlan,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + plan.tick_interval, plan.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u32 = 0;

        loop {
            ticker.tick().await;
            let Some(sink) = sink.upgrade() else {
                break;
            };
            ticks = ticks.saturating_add(1);
            if sink.on_tick(&task_id, ticks, &plan) == TickOutcome::Stop {
                break;
            }
        }

        tracing::debug!(target: "background_tasks", "Simulator for {} stopped after {} ticks", task_id, ticks);
    })
}
