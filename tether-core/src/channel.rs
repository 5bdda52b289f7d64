//! Reconnecting-channel state machine - NO I/O, just state transitions.
//!
//! Models the lifecycle of one duplex transport handle with bounded
//! auto-reconnect. The machine takes events as input and produces a new
//! state plus a list of actions; `tether-hooks` executes the actions
//! (opening/closing the transport, scheduling the retry timer, emitting
//! events to subscribers).
//!
//! One attempt counter is owned here: reset to 0 on every successful open,
//! incremented on every auto-scheduled retry. A manual disconnect permanently
//! disables auto-reconnect for the remaining lifetime of the machine.

/// Connection state of the channel, mirroring the transport's ready state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// A transport is being established.
    Connecting,
    /// The transport is open; messages flow.
    Open,
    /// A close was requested and is in flight.
    Closing,
    /// No live transport.
    Closed,
}

/// Auto-reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether auto-reconnect is enabled at all.
    pub enabled: bool,
    /// Maximum auto-reconnect attempts; `None` means unlimited.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: Some(20),
        }
    }
}

/// Events that can occur in the channel lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The caller requested a connection.
    ConnectRequested,
    /// The transport reported open.
    TransportOpen,
    /// The transport closed (peer close, failure, or requested close).
    TransportClosed,
    /// The transport signaled an error without closing by itself.
    TransportError(String),
    /// The scheduled retry timer fired.
    RetryTimer,
    /// The caller requested a manual disconnect.
    DisconnectRequested,
}

/// Actions the driver must execute after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    /// Construct and connect a new transport.
    OpenTransport,
    /// Close the current transport.
    CloseTransport,
    /// Schedule a `RetryTimer` event after the configured interval.
    ScheduleRetry,
    /// Cancel a pending scheduled retry.
    CancelRetry,
    /// Emit the open event to subscribers.
    NotifyOpen,
    /// Emit the close event to subscribers.
    NotifyClose,
    /// Emit a transport error to subscribers.
    NotifyError(String),
}

/// The channel state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMachine {
    state: SocketState,
    attempts: u32,
    manually_closed: bool,
    policy: RetryPolicy,
}

impl ChannelMachine {
    /// Create a machine in the `Closed` state with the given retry policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: SocketState::Closed,
            attempts: 0,
            manually_closed: false,
            policy,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// Auto-reconnect attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether a manual disconnect has permanently disabled auto-reconnect.
    pub fn is_manually_closed(&self) -> bool {
        self.manually_closed
    }

    /// Process an event and return the new machine plus actions to execute.
    pub fn on_event(mut self, event: ChannelEvent) -> (Self, Vec<ChannelAction>) {
        let actions = match event {
            ChannelEvent::ConnectRequested => match self.state {
                // Already open or in progress: no-op.
                SocketState::Open | SocketState::Connecting => vec![],
                SocketState::Closing | SocketState::Closed => {
                    self.state = SocketState::Connecting;
                    vec![ChannelAction::OpenTransport]
                }
            },

            ChannelEvent::TransportOpen => {
                self.state = SocketState::Open;
                self.attempts = 0;
                vec![ChannelAction::NotifyOpen]
            }

            ChannelEvent::TransportClosed => {
                self.state = SocketState::Closed;
                let mut actions = vec![ChannelAction::NotifyClose];
                if self.retry_allowed() {
                    self.attempts = self.attempts.saturating_add(1);
                    actions.push(ChannelAction::ScheduleRetry);
                }
                actions
            }

            // Errors notify without forcing a state transition; the state
            // still follows the subsequent open/close signals.
            ChannelEvent::TransportError(error) => vec![ChannelAction::NotifyError(error)],

            ChannelEvent::RetryTimer => {
                if self.manually_closed || self.state != SocketState::Closed {
                    vec![]
                } else {
                    self.state = SocketState::Connecting;
                    vec![ChannelAction::OpenTransport]
                }
            }

            ChannelEvent::DisconnectRequested => {
                self.manually_closed = true;
                let mut actions = vec![ChannelAction::CancelRetry];
                match self.state {
                    SocketState::Open | SocketState::Connecting => {
                        self.state = SocketState::Closing;
                        actions.push(ChannelAction::CloseTransport);
                    }
                    SocketState::Closing | SocketState::Closed => {}
                }
                actions
            }
        };
        (self, actions)
    }

    fn retry_allowed(&self) -> bool {
        if self.manually_closed || !self.policy.enabled {
            return false;
        }
        match self.policy.max_attempts {
            None => true,
            Some(max) => self.attempts < max,
        }
    }
}
