//! Sign node state machine
//!
//! Tracks WiFi association and decides, on every pass of the main loop,
//! which work the node should do: associate, refresh the simulated sensors,
//! report status, poll for a command, or restart.

use alloc::vec::Vec;

use crate::config;
use crate::schedule::Interval;

/// Sign node states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    // Boot
    SystemInit,

    // Association
    WiFiConnecting,

    // Reporting and polling
    Operational,

    // Association gave up; only a restart recovers
    WiFiError,
}

/// Events fed into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    SystemStarted,
    WiFiConnected,
    WiFiConnectionFailed,
    WiFiDisconnected,
}

/// State transition result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    /// Keep the current state
    Stay,
    /// Move to a new state
    Transition(SystemState),
}

/// Work the main loop has to carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Associate with the configured access point
    StartWiFiConnection,
    /// Check the association is still up
    MonitorConnection,
    /// Redraw simulated sensor values that are due
    RefreshSensors,
    /// POST the current telemetry sample
    SendStatus,
    /// GET the current display command
    PollCommand,
    /// Log the failed state
    LogError(SystemState),
    /// Reboot the node
    Restart,
}

/// Sign node state machine
pub struct SystemStateMachine {
    current_state: SystemState,
    previous_state: Option<SystemState>,
    state_entry_time: u64,
    status_timer: Interval,
    command_timer: Interval,
}

impl Default for SystemStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: SystemState::SystemInit,
            previous_state: None,
            state_entry_time: 0,
            status_timer: Interval::due_now(config::STATUS_INTERVAL_MS),
            command_timer: Interval::due_now(config::COMMAND_POLL_INTERVAL_MS),
        }
    }

    pub fn get_current_state(&self) -> SystemState {
        self.current_state
    }

    pub fn get_previous_state(&self) -> Option<SystemState> {
        self.previous_state
    }

    /// Timestamp of the last state change
    pub fn state_entry_time(&self) -> u64 {
        self.state_entry_time
    }

    /// Apply an event at `now_ms`
    pub fn handle_event(&mut self, event: SystemEvent, now_ms: u64) -> StateTransition {
        let transition = Self::get_state_transition(self.current_state, event);

        if let StateTransition::Transition(new_state) = transition {
            self.transition_to_state(new_state, now_ms);
        }

        transition
    }

    /// Actions for the current state at `now_ms`
    pub fn update(&mut self, now_ms: u64) -> Vec<Action> {
        let mut actions = Vec::new();

        match self.current_state {
            SystemState::SystemInit => {}

            SystemState::WiFiConnecting => {
                actions.push(Action::StartWiFiConnection);
            }

            SystemState::Operational => {
                actions.push(Action::MonitorConnection);
                actions.push(Action::RefreshSensors);
                if self.status_timer.poll(now_ms) {
                    actions.push(Action::SendStatus);
                }
                if self.command_timer.poll(now_ms) {
                    actions.push(Action::PollCommand);
                }
            }

            SystemState::WiFiError => {
                actions.push(Action::LogError(self.current_state));
                actions.push(Action::Restart);
            }
        }

        actions
    }

    fn transition_to_state(&mut self, new_state: SystemState, now_ms: u64) {
        if new_state == self.current_state {
            return;
        }

        match new_state {
            SystemState::Operational => log::info!("[STATE] Sign operational"),
            SystemState::WiFiError => log::error!("[STATE] Error state: {:?}", new_state),
            _ => log::debug!("[STATE] {:?} -> {:?}", self.current_state, new_state),
        }

        self.previous_state = Some(self.current_state);
        self.current_state = new_state;
        self.state_entry_time = now_ms;
    }

    fn get_state_transition(current_state: SystemState, event: SystemEvent) -> StateTransition {
        match (current_state, event) {
            (SystemState::SystemInit, SystemEvent::SystemStarted) => {
                StateTransition::Transition(SystemState::WiFiConnecting)
            }

            (SystemState::WiFiConnecting, SystemEvent::WiFiConnected) => {
                StateTransition::Transition(SystemState::Operational)
            }
            // The WiFi manager already spent its bounded attempts
            (SystemState::WiFiConnecting, SystemEvent::WiFiConnectionFailed) => {
                StateTransition::Transition(SystemState::WiFiError)
            }

            (SystemState::Operational, SystemEvent::WiFiDisconnected) => {
                StateTransition::Transition(SystemState::WiFiConnecting)
            }

            _ => StateTransition::Stay,
        }
    }

    /// Whether the node is associated and doing its regular work
    pub fn is_operational(&self) -> bool {
        self.current_state == SystemState::Operational
    }

    pub fn is_error_state(&self) -> bool {
        self.current_state == SystemState::WiFiError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operational_at(now_ms: u64) -> SystemStateMachine {
        let mut sm = SystemStateMachine::new();
        sm.handle_event(SystemEvent::SystemStarted, now_ms);
        sm.handle_event(SystemEvent::WiFiConnected, now_ms);
        sm
    }

    #[test]
    fn startup_flow() {
        let mut sm = SystemStateMachine::new();
        assert_eq!(sm.get_current_state(), SystemState::SystemInit);
        assert!(sm.update(0).is_empty());

        sm.handle_event(SystemEvent::SystemStarted, 10);
        assert_eq!(sm.get_current_state(), SystemState::WiFiConnecting);
        assert_eq!(sm.update(10), vec![Action::StartWiFiConnection]);

        assert_eq!(
            sm.handle_event(SystemEvent::WiFiConnected, 4_000),
            StateTransition::Transition(SystemState::Operational)
        );
        assert!(sm.is_operational());
        assert_eq!(sm.get_previous_state(), Some(SystemState::WiFiConnecting));
        assert_eq!(sm.state_entry_time(), 4_000);
    }

    #[test]
    fn association_failure_restarts() {
        let mut sm = SystemStateMachine::new();
        sm.handle_event(SystemEvent::SystemStarted, 0);
        sm.handle_event(SystemEvent::WiFiConnectionFailed, 10_000);

        assert!(sm.is_error_state());
        assert_eq!(
            sm.update(10_000),
            vec![Action::LogError(SystemState::WiFiError), Action::Restart]
        );
    }

    #[test]
    fn first_operational_pass_reports_and_polls() {
        let mut sm = operational_at(1_000);
        assert_eq!(
            sm.update(1_000),
            vec![
                Action::MonitorConnection,
                Action::RefreshSensors,
                Action::SendStatus,
                Action::PollCommand,
            ]
        );
        assert_eq!(
            sm.update(1_100),
            vec![Action::MonitorConnection, Action::RefreshSensors]
        );
    }

    #[test]
    fn status_and_command_keep_their_own_periods() {
        let mut sm = operational_at(0);
        sm.update(0);

        let mut status = 0;
        let mut polls = 0;
        let mut now = 100;
        while now <= 60_000 {
            for action in sm.update(now) {
                match action {
                    Action::SendStatus => status += 1,
                    Action::PollCommand => polls += 1,
                    _ => {}
                }
            }
            now += 100;
        }

        assert_eq!(status, 2);
        assert_eq!(polls, 6);
    }

    #[test]
    fn disconnect_goes_back_to_association() {
        let mut sm = operational_at(0);
        sm.handle_event(SystemEvent::WiFiDisconnected, 500);
        assert_eq!(sm.get_current_state(), SystemState::WiFiConnecting);
        assert_eq!(sm.update(500), vec![Action::StartWiFiConnection]);
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut sm = SystemStateMachine::new();
        assert_eq!(
            sm.handle_event(SystemEvent::WiFiConnected, 0),
            StateTransition::Stay
        );
        assert_eq!(sm.get_current_state(), SystemState::SystemInit);

        let mut sm = operational_at(0);
        assert_eq!(
            sm.handle_event(SystemEvent::SystemStarted, 5),
            StateTransition::Stay
        );
        assert!(sm.is_operational());
    }
}
