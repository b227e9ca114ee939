//! Countdown engine.
//!
//! A background task that recomputes remaining time from the current wall
//! clock on every tick and publishes it on a `watch` channel. Ticks stop as
//! soon as a cycle completes; a new duration or target starts a fresh cycle
//! and re-arms the one-shot completion signal.

mod clock;

pub use clock::*;

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Tick cadence; the headless stand-in for a per-frame repaint callback.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How often a target-bound cycle re-derives its anchor from the target
/// instant, correcting for suspension gaps.
const RESYNC_INTERVAL: Duration = Duration::from_secs(1);

enum Command {
    SetDuration(u64),
    SetTarget(Option<DateTime<Utc>>),
}

/// Handle to a running countdown task.
///
/// Cheap to clone; dropping every handle shuts the task down.
#[derive(Clone)]
pub struct CountdownEngine {
    cmd_tx: mpsc::UnboundedSender<Command>,
    remaining_rx: watch::Receiver<Remaining>,
}

impl CountdownEngine {
    /// Spawn the engine task. `on_complete` fires exactly once per cycle, at
    /// the first observation of zero remaining.
    pub fn spawn<F>(on_complete: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (remaining_tx, remaining_rx) = watch::channel(Remaining::ZERO);

        tokio::spawn(run(cmd_rx, remaining_tx, on_complete));

        Self {
            cmd_tx,
            remaining_rx,
        }
    }

    /// Start a fresh cycle of `duration_ms`, discarding the previous
    /// schedule. Zero completes immediately without scheduling a tick.
    pub fn set_duration_ms(&self, duration_ms: u64) {
        let _ = self.cmd_tx.send(Command::SetDuration(duration_ms));
    }

    /// Start a fresh cycle counting down to `target`. `None` means "no
    /// countdown configured": the engine idles at zero without firing the
    /// completion signal. A target in the past completes immediately.
    pub fn set_target(&self, target: Option<DateTime<Utc>>) {
        let _ = self.cmd_tx.send(Command::SetTarget(target));
    }

    /// Most recently published remaining time.
    pub fn remaining(&self) -> Remaining {
        *self.remaining_rx.borrow()
    }

    /// Watch the live remaining-time value.
    pub fn watch(&self) -> watch::Receiver<Remaining> {
        self.remaining_rx.clone()
    }
}

async fn run<F>(
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    out: watch::Sender<Remaining>,
    on_complete: F,
) where
    F: Fn() + Send + 'static,
{
    let mut clock = CountdownClock::new(Utc::now(), 0);
    let mut target: Option<DateTime<Utc>> = None;
    let mut running = false;

    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut resync = tokio::time::interval(RESYNC_INTERVAL);
    resync.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break; // all handles dropped
                };
                let now = Utc::now();
                match cmd {
                    Command::SetDuration(ms) => {
                        target = None;
                        clock = CountdownClock::new(now, ms);
                        running = start_cycle(&clock, now, &out, &on_complete);
                    }
                    Command::SetTarget(Some(t)) => {
                        target = Some(t);
                        clock = CountdownClock::for_target(now, t);
                        running = start_cycle(&clock, now, &out, &on_complete);
                    }
                    Command::SetTarget(None) => {
                        target = None;
                        running = false;
                        out.send_replace(Remaining::ZERO);
                    }
                }
                tick.reset();
                resync.reset();
            }
            _ = tick.tick(), if running => {
                let remaining = clock.remaining_at(Utc::now());
                out.send_replace(remaining);
                if remaining.is_zero() {
                    running = false; // stop scheduling further ticks
                    on_complete();
                }
            }
            _ = resync.tick(), if running && target.is_some() => {
                if let Some(t) = target {
                    clock = CountdownClock::for_target(Utc::now(), t);
                }
            }
        }
    }

    tracing::debug!("Engine: Command channel closed, stopping");
}

/// Publish the opening value of a cycle. A cycle that is already at zero
/// completes on the spot and never schedules a tick.
fn start_cycle<F>(
    clock: &CountdownClock,
    now: DateTime<Utc>,
    out: &watch::Sender<Remaining>,
    on_complete: &F,
) -> bool
where
    F: Fn(),
{
    let remaining = clock.remaining_at(now);
    out.send_replace(remaining);
    if remaining.is_zero() {
        on_complete();
        false
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn engine_with_counter() -> (CountdownEngine, Arc<AtomicUsize>) {
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = completions.clone();
        let engine = CountdownEngine::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (engine, completions)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test]
    async fn test_zero_duration_completes_immediately() {
        let (engine, completions) = engine_with_counter();

        engine.set_duration_ms(0);
        sleep_ms(50).await;

        assert_eq!(engine.remaining().ms, 0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);

        // No re-fire on subsequent ticks while still at zero.
        sleep_ms(250).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_countdown_reaches_zero_and_completes_once() {
        let (engine, completions) = engine_with_counter();

        engine.set_duration_ms(300);
        sleep_ms(20).await;
        let early = engine.remaining().ms;
        assert!(early > 0 && early <= 300, "early = {}", early);

        sleep_ms(600).await;
        assert_eq!(engine.remaining().ms, 0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remaining_tracks_elapsed_wall_clock() {
        let (engine, _completions) = engine_with_counter();

        engine.set_duration_ms(2_000);
        sleep_ms(150).await;
        let first = engine.remaining().ms;
        sleep_ms(400).await;
        let second = engine.remaining().ms;

        assert!(second < first);
        // The drop between samples tracks the elapsed wall clock to within
        // tick granularity plus scheduler jitter.
        let drop = first - second;
        assert!((250..=650).contains(&drop), "drop = {}", drop);
    }

    #[tokio::test]
    async fn test_new_duration_resets_the_anchor() {
        let (engine, completions) = engine_with_counter();

        engine.set_duration_ms(100_000);
        sleep_ms(250).await;

        engine.set_duration_ms(90_000);
        sleep_ms(30).await;

        // Remaining reflects the new duration, not the new duration minus
        // time elapsed in the previous cycle.
        let remaining = engine.remaining().ms;
        assert!(remaining > 89_500, "remaining = {}", remaining);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restart_re_arms_completion() {
        let (engine, completions) = engine_with_counter();

        engine.set_duration_ms(0);
        sleep_ms(50).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);

        engine.set_duration_ms(150);
        sleep_ms(500).await;
        assert_eq!(completions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_past_target_completes_without_positive_value() {
        let (engine, completions) = engine_with_counter();

        engine.set_target(Some(Utc::now() - ChronoDuration::hours(1)));
        sleep_ms(50).await;

        assert_eq!(engine.remaining().ms, 0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unset_target_idles_without_completing() {
        let (engine, completions) = engine_with_counter();

        engine.set_target(None);
        sleep_ms(50).await;

        assert_eq!(engine.remaining().ms, 0);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_future_target_counts_down() {
        let (engine, completions) = engine_with_counter();

        engine.set_target(Some(Utc::now() + ChronoDuration::milliseconds(300)));
        sleep_ms(50).await;
        assert!(engine.remaining().ms > 0);

        sleep_ms(600).await;
        assert_eq!(engine.remaining().ms, 0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }
}
