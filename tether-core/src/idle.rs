//! Idle/activity state machine - NO timers, just state transitions.
//!
//! The machine is driven by `tether-hooks`, which owns the actual timer and
//! feeds activity events in. Firing the timer transitions Active → Idle; any
//! qualifying activity transitions back to Active and asks the driver to
//! re-arm the timer (debounce-style, not throttle).

/// The two live idle states plus the terminal stopped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// Activity seen within the timeout window.
    Active,
    /// The timeout elapsed with no qualifying activity.
    Idle,
    /// Torn down; no further transitions occur.
    Stopped,
}

/// Events fed to the idle machine by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// A qualifying activity event occurred.
    Activity,
    /// The inactivity timer fired.
    TimerFired,
    /// The watcher was torn down.
    Stopped,
}

/// Actions the driver must execute after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    /// (Re)arm the single inactivity timer for the configured timeout.
    ArmTimer,
    /// Cancel the inactivity timer.
    CancelTimer,
    /// Announce the new idle flag to subscribers.
    Announce(bool),
}

impl IdleState {
    /// Initial state and actions for a freshly mounted watcher.
    ///
    /// Starts Active (unless `initially_idle` overrides it) with the timer
    /// armed either way: an initially-idle watcher still becomes active on
    /// the first qualifying event.
    pub fn start(initially_idle: bool) -> (Self, Vec<IdleAction>) {
        let state = if initially_idle {
            Self::Idle
        } else {
            Self::Active
        };
        (state, vec![IdleAction::ArmTimer])
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// Pure function - the driver owns the timer and the announcement
    /// channel.
    pub fn on_event(self, event: IdleEvent) -> (Self, Vec<IdleAction>) {
        match (self, event) {
            // Debounce: every qualifying event restarts the countdown.
            (Self::Active, IdleEvent::Activity) => (Self::Active, vec![IdleAction::ArmTimer]),
            (Self::Active, IdleEvent::TimerFired) => {
                (Self::Idle, vec![IdleAction::Announce(true)])
            }

            (Self::Idle, IdleEvent::Activity) => (
                Self::Active,
                vec![IdleAction::ArmTimer, IdleAction::Announce(false)],
            ),

            (Self::Active | Self::Idle, IdleEvent::Stopped) => {
                (Self::Stopped, vec![IdleAction::CancelTimer])
            }

            // Stopped absorbs everything; stale timer fires do nothing.
            (state, _) => (state, vec![]),
        }
    }

    /// Whether this state reports as idle.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
