//! Idle/activity watcher.
//!
//! Drives the pure idle machine from `tether-core` with a real tokio timer
//! and an activity channel. The caller's input layer reports activity events
//! through [`IdleWatcher::record`]; non-qualifying kinds are ignored, and
//! every qualifying one restarts the countdown.

use std::time::Duration;
use tether_core::idle::{IdleAction, IdleEvent, IdleState};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Activity event kinds the watcher can be configured to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// Pointer movement.
    PointerMove,
    /// Pointer press.
    PointerDown,
    /// Key press.
    KeyDown,
    /// Scrolling.
    Scroll,
    /// Touch start.
    TouchStart,
    /// Wheel input.
    Wheel,
}

impl ActivityKind {
    /// The default qualifying set: pointer movement/press, key press,
    /// scroll, touch start, wheel.
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::PointerMove,
            Self::PointerDown,
            Self::KeyDown,
            Self::Scroll,
            Self::TouchStart,
            Self::Wheel,
        ]
    }
}

/// Watcher configuration.
#[derive(Debug, Clone)]
pub struct IdleOptions {
    /// Silence required before the watcher reports idle.
    pub timeout: Duration,
    /// Qualifying activity kinds; events outside the set are ignored.
    pub events: Vec<ActivityKind>,
    /// Start in the idle state instead of active.
    pub initial_idle: bool,
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            events: ActivityKind::default_set(),
            initial_idle: false,
        }
    }
}

enum WatcherMessage {
    Activity,
    Stop,
}

/// A live idle/activity watcher.
///
/// Spawns one tokio task owning the inactivity timer; dropped or stopped
/// watchers release the timer and perform no further transitions.
#[derive(Debug)]
pub struct IdleWatcher {
    inbox: mpsc::UnboundedSender<WatcherMessage>,
    idle_rx: watch::Receiver<bool>,
    events: Vec<ActivityKind>,
    task: tokio::task::JoinHandle<()>,
}

impl IdleWatcher {
    /// Spawn a watcher. Must be called within a tokio runtime.
    pub fn spawn(options: IdleOptions) -> Self {
        let (inbox, mut messages) = mpsc::unbounded_channel::<WatcherMessage>();
        let (idle_tx, idle_rx) = watch::channel(options.initial_idle);
        let timeout = options.timeout;
        let initial_idle = options.initial_idle;

        let task = tokio::spawn(async move {
            let (mut state, actions) = IdleState::start(initial_idle);
            let mut deadline = Instant::now() + timeout;
            let mut armed = false;
            apply(&idle_tx, &mut deadline, &mut armed, timeout, actions);

            loop {
                tokio::select! {
                    message = messages.recv() => {
                        let event = match message {
                            Some(WatcherMessage::Activity) => IdleEvent::Activity,
                            Some(WatcherMessage::Stop) | None => IdleEvent::Stopped,
                        };
                        let (next, actions) = state.on_event(event);
                        state = next;
                        apply(&idle_tx, &mut deadline, &mut armed, timeout, actions);
                        if state == IdleState::Stopped {
                            return;
                        }
                    }
                    _ = tokio::time::sleep_until(deadline), if armed => {
                        armed = false;
                        let (next, actions) = state.on_event(IdleEvent::TimerFired);
                        state = next;
                        apply(&idle_tx, &mut deadline, &mut armed, timeout, actions);
                    }
                }
            }
        });

        Self {
            inbox,
            idle_rx,
            events: options.events,
            task,
        }
    }

    /// Report an activity event. Kinds outside the configured set are
    /// ignored; qualifying ones restart the countdown and force active.
    pub fn record(&self, kind: ActivityKind) {
        if !self.events.contains(&kind) {
            return;
        }
        let _ = self.inbox.send(WatcherMessage::Activity);
    }

    /// Current idle flag.
    pub fn is_idle(&self) -> bool {
        *self.idle_rx.borrow()
    }

    /// Subscribe to idle flag changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.idle_rx.clone()
    }

    /// Tear down the watcher: timer released, no further transitions.
    pub fn stop(&self) {
        let _ = self.inbox.send(WatcherMessage::Stop);
    }
}

impl Drop for IdleWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Execute the actions a transition produced.
fn apply(
    idle_tx: &watch::Sender<bool>,
    deadline: &mut Instant,
    armed: &mut bool,
    timeout: Duration,
    actions: Vec<IdleAction>,
) {
    for action in actions {
        match action {
            IdleAction::ArmTimer => {
                *deadline = Instant::now() + timeout;
                *armed = true;
            }
            IdleAction::CancelTimer => *armed = false,
            IdleAction::Announce(idle) => {
                idle_tx.send_replace(idle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Let the watcher task observe advanced time / queued messages.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn watcher_with_timeout(ms: u64) -> IdleWatcher {
        IdleWatcher::spawn(IdleOptions {
            timeout: Duration::from_millis(ms),
            ..IdleOptions::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn idle_after_exactly_the_timeout() {
        let watcher = watcher_with_timeout(1000);
        settle().await;

        tokio::time::advance(Duration::from_millis(999)).await;
        settle().await;
        assert!(!watcher.is_idle());

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert!(watcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_countdown() {
        let watcher = watcher_with_timeout(1000);
        settle().await;

        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        watcher.record(ActivityKind::PointerMove);
        settle().await;

        // 600ms after the reset: total 1200ms, still active.
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert!(!watcher.is_idle());

        // 400ms more completes the restarted 1000ms window.
        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert!(watcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_wakes_an_idle_watcher() {
        let watcher = watcher_with_timeout(100);
        settle().await;
        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert!(watcher.is_idle());

        watcher.record(ActivityKind::KeyDown);
        settle().await;
        assert!(!watcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn non_qualifying_events_are_ignored() {
        let watcher = IdleWatcher::spawn(IdleOptions {
            timeout: Duration::from_millis(1000),
            events: vec![ActivityKind::KeyDown],
            initial_idle: false,
        });
        settle().await;

        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        watcher.record(ActivityKind::PointerMove); // not in the set
        settle().await;

        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert!(watcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn initial_idle_state_is_respected() {
        let watcher = IdleWatcher::spawn(IdleOptions {
            timeout: Duration::from_millis(1000),
            events: ActivityKind::default_set(),
            initial_idle: true,
        });
        settle().await;
        assert!(watcher.is_idle());

        watcher.record(ActivityKind::Scroll);
        settle().await;
        assert!(!watcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_state() {
        let watcher = watcher_with_timeout(100);
        settle().await;
        watcher.stop();
        settle().await;

        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        // Torn down while active: never transitions to idle.
        assert!(!watcher.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_sees_transitions() {
        let watcher = watcher_with_timeout(50);
        let mut idle = watcher.subscribe();
        settle().await;

        tokio::time::advance(Duration::from_millis(50)).await;
        idle.changed().await.unwrap();
        assert!(*idle.borrow());
    }
}
