//! Simulated progress.
//!
//! Generation endpoints report nothing until they finish, so progress is
//! estimated from elapsed time. The estimate decelerates and never reaches
//! 100 on its own; only the settled request may complete a task.

use std::time::Duration;

use crate::task::TaskKind;

/// Upper bound for time-based progress.
pub const MAX_SIMULATED_PROGRESS: u8 = 95;

/// Shapes the curve: larger values keep early progress lower for longer.
const DECELERATION: f64 = 30.0;

/// Percentage for `ticks_elapsed` out of an estimated `total_ticks`.
///
/// `raw = ticks / total * 100`, then `min(95, raw * (1 - e^(-raw / 30)))`.
/// Non-decreasing in `ticks_elapsed`.
pub fn simulated_progress(ticks_elapsed: u32, total_ticks: u32) -> u8 {
    if total_ticks == 0 {
        return MAX_SIMULATED_PROGRESS;
    }
    let raw = f64::from(ticks_elapsed) / f64::from(total_ticks) * 100.0;
    let adjusted = raw * (1.0 - (-raw / DECELERATION).exp());
    adjusted.clamp(0.0, f64::from(MAX_SIMULATED_PROGRESS)).floor() as u8
}

/// Number of ticks that fit in `estimate`, rounded up, at least one.
pub fn estimated_ticks(estimate: Duration, tick_interval: Duration) -> u32 {
    let tick_ms = tick_interval.as_millis().max(1);
    let ticks = estimate.as_millis().div_ceil(tick_ms);
    u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
}

/// Coarse phase of a generation, derived from its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// 0-25%
    Analyzing,
    /// 25-50%
    Structuring,
    /// 50-75%
    Writing,
    /// 75-100%
    Finalizing,
}

impl ProgressStage {
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0..25 => Self::Analyzing,
            25..50 => Self::Structuring,
            50..75 => Self::Writing,
            _ => Self::Finalizing,
        }
    }
}

/// Human-readable status line for a task of `kind` at `progress`.
pub fn stage_message(kind: TaskKind, title: &str, progress: u8) -> String {
    use ProgressStage::*;

    let stage = ProgressStage::from_progress(progress);
    match (kind, stage) {
        (TaskKind::LearningPath | TaskKind::OnboardingPath, Analyzing) => {
            format!("Analyzing {title} and your learning preferences...")
        }
        (TaskKind::LearningPath | TaskKind::OnboardingPath, Structuring) => {
            format!("Designing the structure of your {title} learning path...")
        }
        (TaskKind::LearningPath | TaskKind::OnboardingPath, Writing) => {
            format!("Creating modules and milestones for {title}...")
        }
        (TaskKind::LearningPath | TaskKind::OnboardingPath, Finalizing) => {
            format!("Finalizing your {title} learning path...")
        }
        (TaskKind::Modules, Analyzing) => format!("Reviewing the goals of {title}..."),
        (TaskKind::Modules, Structuring) => format!("Outlining modules for {title}..."),
        (TaskKind::Modules, Writing) => format!("Writing module descriptions for {title}..."),
        (TaskKind::Modules, Finalizing) => format!("Polishing the modules of {title}..."),
        (TaskKind::Topics, Analyzing) => format!("Planning topics for {title}..."),
        (TaskKind::Topics, Structuring) => format!("Drafting explanations for {title}..."),
        (TaskKind::Topics, Writing) => format!("Adding examples and exercises to {title}..."),
        (TaskKind::Topics, Finalizing) => format!("Reviewing the topic content of {title}..."),
        (TaskKind::Course, Analyzing) => format!("Gathering material for {title}..."),
        (TaskKind::Course, Structuring) => format!("Organizing the {title} course..."),
        (TaskKind::Course, Writing) => format!("Writing lessons for {title}..."),
        (TaskKind::Course, Finalizing) => format!("Wrapping up the {title} course..."),
    }
}
