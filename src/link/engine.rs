use statig::blocking::IntoStateMachineExt as _;

use super::machine::{DispatchContext, LinkMachine};
use super::types::{ActionBuffer, LinkEvent, LinkInput, LinkPayload, LinkSnapshot};

/// Outcome of feeding one input through the state machine: the snapshots on
/// both sides of the transition, at most one lifecycle notice, and the
/// driver actions to issue in order.
#[derive(Clone, Copy, Debug)]
pub struct LinkApplyResult {
    pub before: LinkSnapshot,
    pub after: LinkSnapshot,
    pub notice: Option<(LinkEvent, LinkPayload)>,
    pub actions: ActionBuffer,
}

impl LinkApplyResult {
    pub fn state_changed(self) -> bool {
        self.before.state != self.after.state
    }

    pub fn requests_teardown_ack(self) -> bool {
        self.actions.contains_teardown()
    }
}

/// Owns the statig machine; the single dispatcher task (or a test) drives
/// it one input at a time. Not designed for concurrent invocation.
pub struct LinkEngine {
    machine: statig::blocking::StateMachine<LinkMachine>,
}

impl LinkEngine {
    pub fn new() -> Self {
        Self::with_snapshot(LinkSnapshot::default())
    }

    pub fn with_snapshot(snapshot: LinkSnapshot) -> Self {
        Self {
            machine: LinkMachine::new(snapshot).state_machine(),
        }
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        self.machine.inner().snapshot
    }

    pub fn apply(&mut self, input: LinkInput) -> LinkApplyResult {
        let before = self.snapshot();
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&input, &mut context);
        let after = self.snapshot();
        LinkApplyResult {
            before,
            after,
            notice: context.notice,
            actions: context.actions,
        }
    }
}

impl Default for LinkEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use super::*;

    #[test]
    fn connect_command_queues_config_and_start() {
        let mut engine = LinkEngine::new();
        let credentials = WifiCredentials::from_parts(b"net", b"pw");
        let result = engine.apply(LinkInput::Command(LinkCommand::Connect(credentials)));
        assert_eq!(result.after.desired, DesiredLink::Connected);
        assert_eq!(result.after.retries, 0);
        let mut actions = result.actions.iter();
        assert!(matches!(
            actions.next(),
            Some(DriverAction::ApplyStation(_))
        ));
        assert!(matches!(actions.next(), Some(DriverAction::Start)));
        assert!(actions.next().is_none());
    }

    #[test]
    fn iface_started_moves_to_connecting() {
        let mut engine = LinkEngine::new();
        let credentials = WifiCredentials::from_parts(b"net", b"pw");
        let _ = engine.apply(LinkInput::Command(LinkCommand::Connect(credentials)));
        let result = engine.apply(LinkInput::Driver(DriverEvent::IfaceStarted));
        assert_eq!(result.after.state, LinkState::Connecting);
        assert!(matches!(
            result.notice,
            Some((LinkEvent::Connecting, LinkPayload::None))
        ));
        assert!(result
            .actions
            .iter()
            .any(|action| matches!(action, DriverAction::Connect)));
    }
}
