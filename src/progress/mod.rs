pub mod simulator;

pub use simulator::ProgressSimulator;
use std::time::Duration;

/// Polling period of the simulated progress timer
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Highest percentage the timer may reach on its own; the rest is
/// reserved for an explicit completion.
pub const RUNNING_CAP: f64 = 95.0;

/// Lifecycle phase of a simulated progress run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Idle,
    Running,
    Completed,
    Reset,
}

/// Snapshot of the simulated progress, as shown by the progress bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    pub percent: f64,
    pub phase: ProgressPhase,
}

impl ProgressState {
    pub const IDLE: Self = Self {
        percent: 0.0,
        phase: ProgressPhase::Idle,
    };

    pub fn is_running(&self) -> bool {
        self.phase == ProgressPhase::Running
    }

    /// Percentage rounded for display
    pub fn rounded_percent(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Percentage shown after `elapsed` of a run that targets `target`
///
/// A zero target jumps straight to the cap.
pub fn simulated_percent(elapsed: Duration, target: Duration) -> f64 {
    if target.is_zero() {
        return RUNNING_CAP;
    }
    (100.0 * elapsed.as_secs_f64() / target.as_secs_f64()).min(RUNNING_CAP)
}
