//! Render-side state.
//!
//! Wires the settings store to the countdown engine: the countdown duration
//! is derived from `targetDateTime` exclusively, re-derived whenever the
//! operator edits the field, and `completionDurationMs` only controls how
//! long completion content lingers after zero.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::CountdownEngine;
use crate::events::{UpdateBus, UpdateEvent};
use crate::settings::{keys, CompletionContent, CompletionMode, CountdownSettings};
use crate::store::{Binding, SettingsStore};

/// Cadence of the heartbeat pushed to render subscribers.
const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the signage surface needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    #[serde(flatten)]
    pub settings: CountdownSettings,
    pub remaining_ms: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub completed: bool,
    pub show_completion: bool,
    pub completes_at_label: Option<String>,
}

/// Long-lived render state shared by the HTTP surface.
pub struct Renderer {
    store: Arc<SettingsStore>,
    engine: CountdownEngine,
    completed_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl Renderer {
    /// Start the renderer: bind the engine to the current target, follow
    /// target edits from the store, and publish heartbeat ticks on the bus.
    pub fn start(store: Arc<SettingsStore>, bus: Arc<UpdateBus>) -> Arc<Self> {
        let completed_at = Arc::new(Mutex::new(None));

        let completion_slot = completed_at.clone();
        let completion_bus = bus.clone();
        let engine = CountdownEngine::spawn(move || {
            let at = Utc::now();
            *completion_slot.lock().unwrap() = Some(at);
            completion_bus.publish(UpdateEvent::Completed { at });
            tracing::info!("Renderer: Countdown completed at {}", at);
        });

        let renderer = Arc::new(Self {
            store: store.clone(),
            engine: engine.clone(),
            completed_at: completed_at.clone(),
        });

        // Bind the current target, then follow edits. Each change is a full
        // engine reset and re-arms the completion lifecycle. Subscribing
        // before the initial bind means an edit can never fall between the
        // seed read and the subscription.
        let target: Binding<Option<DateTime<Utc>>> =
            Binding::new(store.clone(), keys::TARGET_DATE_TIME, None);
        let mut target_rx = target.watch();
        target_rx.borrow_and_update();
        engine.set_target(target.get());

        let follow_engine = engine.clone();
        let follow_completed = completed_at.clone();
        tokio::spawn(async move {
            while target_rx.changed().await.is_ok() {
                target_rx.borrow_and_update();
                let instant = target.get();
                tracing::info!("Renderer: Target changed to {:?}", instant);
                *follow_completed.lock().unwrap() = None;
                follow_engine.set_target(instant);
            }
        });

        let heartbeat_engine = engine.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PUBLISH_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let remaining = heartbeat_engine.remaining();
                bus.publish(UpdateEvent::TimerTick {
                    remaining_ms: remaining.ms,
                    days: remaining.days(),
                    hours: remaining.hours(),
                    minutes: remaining.minutes(),
                    seconds: remaining.seconds(),
                });
            }
        });

        renderer
    }

    /// Assemble the current render snapshot.
    pub fn snapshot(&self) -> RenderSnapshot {
        let settings = self.store.snapshot();
        let remaining = self.engine.remaining();
        let completed_at = *self.completed_at.lock().unwrap();
        let now = Utc::now();

        RenderSnapshot {
            remaining_ms: remaining.ms,
            days: remaining.days(),
            hours: remaining.hours(),
            minutes: remaining.minutes(),
            seconds: remaining.seconds(),
            completed: completed_at.is_some(),
            show_completion: show_completion(&settings, completed_at, now),
            completes_at_label: completes_at_label(&settings),
            settings,
        }
    }
}

/// Whether completion content should currently be shown.
///
/// Content type `none` keeps the zeroed countdown on screen instead;
/// `completionDurationMs == 0` lingers indefinitely.
fn show_completion(
    settings: &CountdownSettings,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(completed_at) = completed_at else {
        return false;
    };
    if settings.completion_content_type == CompletionContent::None {
        return false;
    }
    if settings.completion_duration_ms == 0 {
        return true;
    }
    let shown_for_ms = (now - completed_at).num_milliseconds().max(0) as u64;
    shown_for_ms < settings.completion_duration_ms
}

/// Human-readable "completes at" caption, derived per `completionMode`.
fn completes_at_label(settings: &CountdownSettings) -> Option<String> {
    match settings.completion_mode {
        CompletionMode::Calculated => settings
            .target_date_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        CompletionMode::Provided | CompletionMode::Preview => settings.completion_label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn memory_store(bus: &Arc<UpdateBus>) -> Arc<SettingsStore> {
        let store = Arc::new(SettingsStore::with_backend(
            Arc::new(MemoryBackend::new()),
            bus.clone(),
        ));
        store.hydrate_defaults();
        store
    }

    #[test]
    fn test_show_completion_linger_window() {
        let mut settings = CountdownSettings::default();
        settings.completion_duration_ms = 5_000;

        let done = Utc::now();
        assert!(show_completion(&settings, Some(done), done));
        assert!(show_completion(
            &settings,
            Some(done),
            done + ChronoDuration::milliseconds(4_999)
        ));
        assert!(!show_completion(
            &settings,
            Some(done),
            done + ChronoDuration::milliseconds(5_000)
        ));
    }

    #[test]
    fn test_show_completion_zero_duration_is_indefinite() {
        let settings = CountdownSettings::default();
        let done = Utc::now();
        assert!(show_completion(
            &settings,
            Some(done),
            done + ChronoDuration::days(30)
        ));
    }

    #[test]
    fn test_show_completion_respects_content_type_none() {
        let mut settings = CountdownSettings::default();
        settings.completion_content_type = CompletionContent::None;
        assert!(!show_completion(&settings, Some(Utc::now()), Utc::now()));
    }

    #[test]
    fn test_no_completion_before_zero() {
        let settings = CountdownSettings::default();
        assert!(!show_completion(&settings, None, Utc::now()));
    }

    #[test]
    fn test_completes_at_label_modes() {
        let mut settings = CountdownSettings::default();
        settings.target_date_time = Some("2030-12-31T23:59:00Z".parse().unwrap());
        settings.completion_label = Some("Midnight sharp".to_string());

        settings.completion_mode = CompletionMode::Calculated;
        assert_eq!(
            completes_at_label(&settings).unwrap(),
            "2030-12-31 23:59:00 UTC"
        );

        settings.completion_mode = CompletionMode::Provided;
        assert_eq!(completes_at_label(&settings).unwrap(), "Midnight sharp");

        settings.completion_label = None;
        assert_eq!(completes_at_label(&settings), None);
    }

    #[tokio::test]
    async fn test_target_edit_restarts_the_countdown() {
        let bus = Arc::new(UpdateBus::default());
        let store = memory_store(&bus);
        let renderer = Renderer::start(store.clone(), bus);

        // No target configured: all-zero, not completed.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let snap = renderer.snapshot();
        assert_eq!(snap.remaining_ms, 0);
        assert!(!snap.completed);

        // Operator sets a target one minute out; the render surface picks it
        // up without any explicit re-fetch.
        let target = Utc::now() + ChronoDuration::seconds(60);
        store.set(keys::TARGET_DATE_TIME, json!(target.to_rfc3339()));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snap = renderer.snapshot();
        assert!(snap.remaining_ms > 55_000, "remaining = {}", snap.remaining_ms);
        assert!(!snap.completed);
    }

    #[tokio::test]
    async fn test_past_target_reports_completed_snapshot() {
        let bus = Arc::new(UpdateBus::default());
        let store = memory_store(&bus);
        let past = Utc::now() - ChronoDuration::minutes(5);
        store.set(keys::TARGET_DATE_TIME, json!(past.to_rfc3339()));

        let mut rx = bus.subscribe();
        let renderer = Renderer::start(store, bus.clone());

        // Completion is signalled once, then reflected in the snapshot.
        loop {
            match rx.recv().await.unwrap() {
                UpdateEvent::Completed { .. } => break,
                _ => continue,
            }
        }
        let snap = renderer.snapshot();
        assert_eq!(snap.remaining_ms, 0);
        assert!(snap.completed);
        assert!(snap.show_completion);
    }

    #[tokio::test]
    async fn test_target_edit_resets_completion_state() {
        let bus = Arc::new(UpdateBus::default());
        let store = memory_store(&bus);
        let past = Utc::now() - ChronoDuration::minutes(5);
        store.set(keys::TARGET_DATE_TIME, json!(past.to_rfc3339()));

        let renderer = Renderer::start(store.clone(), bus);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(renderer.snapshot().completed);

        let future = Utc::now() + ChronoDuration::hours(1);
        store.set(keys::TARGET_DATE_TIME, json!(future.to_rfc3339()));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snap = renderer.snapshot();
        assert!(!snap.completed);
        assert!(!snap.show_completion);
        assert!(snap.remaining_ms > 0);
    }
}
