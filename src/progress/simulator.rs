use super::{simulated_percent, ProgressPhase, ProgressState, TICK_INTERVAL};
use crate::subscription::Subscriptions;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

struct Run {
    started_at: Instant,
    target: Duration,
}

struct Shared {
    state: ProgressState,
    run: Option<Run>,
    /// Bumped by every start/complete/reset; a ticker only writes while
    /// its generation is current.
    generation: u64,
}

impl Shared {
    /// Current percentage, computed from the clock while running
    fn current(&self) -> ProgressState {
        match (&self.run, self.state.phase) {
            (Some(run), ProgressPhase::Running) => ProgressState {
                percent: self
                    .state
                    .percent
                    .max(simulated_percent(run.started_at.elapsed(), run.target)),
                phase: ProgressPhase::Running,
            },
            _ => self.state,
        }
    }

    fn settle(&mut self, state: ProgressState) -> bool {
        self.generation += 1;
        self.run = None;
        let changed = self.state != state;
        self.state = state;
        changed
    }
}

struct Inner {
    shared: Arc<Mutex<Shared>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let ticker = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }
}

/// Drives a determinate-looking progress value while a request of
/// unknown duration is in flight
///
/// Clones share the same run and the same timer.
#[derive(Clone)]
pub struct ProgressSimulator {
    inner: Arc<Inner>,
    runtime_handle: tokio::runtime::Handle,
    updates: Subscriptions<ProgressState>,
}

impl ProgressSimulator {
    pub fn new(runtime_handle: tokio::runtime::Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Arc::new(Mutex::new(Shared {
                    state: ProgressState::IDLE,
                    run: None,
                    generation: 0,
                })),
                ticker: Mutex::new(None),
            }),
            runtime_handle,
            updates: Subscriptions::new(),
        }
    }

    /// Restart the run from zero and begin advancing towards the cap
    pub fn start(&self, target: Duration) {
        self.cancel_ticker();

        let generation = {
            let mut shared = self.shared();
            shared.generation += 1;
            shared.run = Some(Run {
                started_at: Instant::now(),
                target,
            });
            shared.state = ProgressState {
                percent: 0.0,
                phase: ProgressPhase::Running,
            };
            shared.generation
        };
        debug!("Progress started, target {:?}", target);
        self.updates.publish(self.state());

        let shared = self.inner.shared.clone();
        let updates = self.updates.clone();
        let ticker = self.runtime_handle.spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let update = {
                    let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if shared.generation != generation {
                        break;
                    }
                    let next = shared.current();
                    if next == shared.state {
                        continue;
                    }
                    shared.state = next;
                    next
                };
                updates.publish(update);
            }
        });

        *self.ticker() = Some(ticker);
    }

    /// Stop the timer and show 100 %
    pub fn complete(&self) {
        self.settle(ProgressState {
            percent: 100.0,
            phase: ProgressPhase::Completed,
        });
    }

    /// Stop the timer and return to 0 %
    pub fn reset(&self) {
        self.settle(ProgressState {
            percent: 0.0,
            phase: ProgressPhase::Reset,
        });
    }

    pub fn state(&self) -> ProgressState {
        self.shared().current()
    }

    pub fn percent(&self) -> f64 {
        self.state().percent
    }

    pub fn phase(&self) -> ProgressPhase {
        self.state().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == ProgressPhase::Running
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<ProgressState> {
        self.updates.subscribe()
    }

    fn settle(&self, state: ProgressState) {
        self.cancel_ticker();
        let changed = self.shared().settle(state);
        if changed {
            debug!("Progress settled at {:?}", state.phase);
            self.updates.publish(state);
        }
    }

    fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker().take() {
            ticker.abort();
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RUNNING_CAP;

    fn simulator() -> ProgressSimulator {
        ProgressSimulator::new(tokio::runtime::Handle::current())
    }

    fn drain(rx: &mut tokio_mpsc::UnboundedReceiver<ProgressState>) -> Vec<ProgressState> {
        let mut seen = Vec::new();
        while let Ok(state) = rx.try_recv() {
            seen.push(state);
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle() {
        let progress = simulator();
        assert_eq!(progress.state(), ProgressState::IDLE);
        assert!(!progress.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn halfway_through_target_shows_fifty_percent() {
        let progress = simulator();
        progress.start(Duration::from_millis(45_000));

        tokio::time::sleep(Duration::from_millis(22_500)).await;

        assert!((progress.percent() - 50.0).abs() < 0.01);
        assert_eq!(progress.phase(), ProgressPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_never_passes_the_cap() {
        let progress = simulator();
        progress.start(Duration::from_secs(2));

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(progress.percent(), RUNNING_CAP);
        assert!(progress.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn sampled_percent_follows_elapsed_time() {
        let progress = simulator();
        let target = Duration::from_secs(10);
        progress.start(target);

        let mut last = 0.0;
        for step in 1..=120u64 {
            tokio::time::sleep(Duration::from_millis(97)).await;
            let elapsed = Duration::from_millis(97 * step);
            let percent = progress.percent();
            assert!((percent - simulated_percent(elapsed, target)).abs() < 0.05);
            assert!(percent >= last);
            last = percent;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_publish_non_decreasing_updates() {
        let progress = simulator();
        let mut rx = progress.subscribe();
        progress.start(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(550)).await;

        let seen = drain(&mut rx);
        assert!(seen.len() >= 5, "expected ticks, got {:?}", seen);
        assert_eq!(seen[0].percent, 0.0);
        assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!(seen.iter().all(|s| s.percent <= RUNNING_CAP));
    }

    #[tokio::test(start_paused = true)]
    async fn complete_shows_full_bar_and_stops_ticking() {
        let progress = simulator();
        let mut rx = progress.subscribe();
        progress.start(Duration::from_secs(45));
        tokio::time::sleep(Duration::from_secs(3)).await;

        progress.complete();
        assert_eq!(progress.percent(), 100.0);
        assert_eq!(progress.phase(), ProgressPhase::Completed);
        drain(&mut rx);

        tokio::time::sleep(Duration::from_secs(10)).await;
        progress.complete();

        assert_eq!(progress.percent(), 100.0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn complete_without_start_is_safe() {
        let progress = simulator();
        progress.complete();
        progress.complete();
        assert_eq!(progress.percent(), 100.0);
        assert_eq!(progress.phase(), ProgressPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_the_bar_and_stops_ticking() {
        let progress = simulator();
        let mut rx = progress.subscribe();
        progress.start(Duration::from_secs(45));
        tokio::time::sleep(Duration::from_secs(5)).await;

        progress.reset();
        progress.reset();
        let after_reset = drain(&mut rx);
        assert_eq!(after_reset.last().map(|s| s.phase), Some(ProgressPhase::Reset));

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(progress.percent(), 0.0);
        assert_eq!(progress.phase(), ProgressPhase::Reset);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_begins_again_from_zero() {
        let progress = simulator();
        progress.start(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!((progress.percent() - 50.0).abs() < 0.01);

        progress.start(Duration::from_secs(10));
        assert_eq!(progress.percent(), 0.0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!((progress.percent() - 10.0).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn running_can_follow_a_terminal_phase() {
        let progress = simulator();
        progress.start(Duration::from_secs(10));
        progress.complete();
        progress.start(Duration::from_secs(10));
        assert!(progress.is_running());
        assert_eq!(progress.percent(), 0.0);

        progress.reset();
        progress.start(Duration::from_secs(10));
        assert!(progress.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn only_one_ticker_survives_restarts() {
        let progress = simulator();
        let mut rx = progress.subscribe();
        for _ in 0..5 {
            progress.start(Duration::from_secs(1));
        }
        drain(&mut rx);

        tokio::time::sleep(Duration::from_millis(150)).await;

        // A single live ticker publishes a single update per tick
        assert_eq!(drain(&mut rx).len(), 1);
    }
}
