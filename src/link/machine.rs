use statig::prelude::*;

use super::types::{
    ActionBuffer, DesiredLink, DriverAction, DriverEvent, LinkCommand, LinkEvent, LinkInput,
    LinkPayload, LinkSnapshot, LinkState, WifiCredentials, MAX_CONNECT_RETRIES,
};

#[derive(Clone, Copy, Debug)]
pub(super) struct LinkMachine {
    pub(super) snapshot: LinkSnapshot,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    pub(super) notice: Option<(LinkEvent, LinkPayload)>,
    pub(super) actions: ActionBuffer,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            notice: None,
            actions: ActionBuffer::new(),
        }
    }
}

impl DispatchContext {
    fn notify(&mut self, event: LinkEvent, payload: LinkPayload) {
        self.notice = Some((event, payload));
    }
}

impl LinkMachine {
    pub(super) fn new(snapshot: LinkSnapshot) -> Self {
        Self { snapshot }
    }

    /// Reconfigure for station mode. `stop_first` tears the previous mode
    /// down; station and AP are never simultaneously active.
    fn begin_station(
        &mut self,
        context: &mut DispatchContext,
        credentials: WifiCredentials,
        stop_first: bool,
        disconnect_first: bool,
    ) {
        if disconnect_first {
            context.actions.push(DriverAction::Disconnect);
        }
        if stop_first {
            context.actions.push(DriverAction::Stop);
        }
        self.snapshot.desired = DesiredLink::Connected;
        self.snapshot.retries = 0;
        self.snapshot.ip = None;
        self.snapshot.state = LinkState::Disconnected;
        context.actions.push(DriverAction::ApplyStation(credentials));
        context.actions.push(DriverAction::Start);
    }

    fn begin_soft_ap(
        &mut self,
        context: &mut DispatchContext,
        credentials: WifiCredentials,
        stop_first: bool,
        disconnect_first: bool,
    ) {
        if disconnect_first {
            context.actions.push(DriverAction::Disconnect);
        }
        if stop_first {
            context.actions.push(DriverAction::Stop);
        }
        self.snapshot.desired = DesiredLink::ApStarted;
        self.snapshot.retries = 0;
        self.snapshot.ip = None;
        self.snapshot.state = LinkState::ApStarting;
        context.actions.push(DriverAction::ApplyAp(credentials));
        context.actions.push(DriverAction::Start);
    }

    /// Explicit teardown request; the outcome is settled later by the
    /// dispatcher's `TeardownDone` acknowledgement.
    fn request_teardown(&mut self, context: &mut DispatchContext, disconnect_first: bool) {
        self.snapshot.desired = DesiredLink::Disconnected;
        if disconnect_first {
            context.actions.push(DriverAction::Disconnect);
        }
        context.actions.push(DriverAction::Stop);
    }

    /// Station link dropped. Exactly one branch fires: unexpected drop with
    /// budget left retries, an exhausted budget gives up, anything else is
    /// an accepted explicit disconnect.
    fn station_dropped(
        &mut self,
        context: &mut DispatchContext,
        reason: u8,
    ) -> Outcome<State> {
        self.snapshot.ip = None;
        if self.snapshot.desired == DesiredLink::Connected {
            self.snapshot.retries = self.snapshot.retries.saturating_add(1);
            if self.snapshot.retries >= MAX_CONNECT_RETRIES {
                context.actions.push(DriverAction::Stop);
                self.snapshot.desired = DesiredLink::Disconnected;
                self.snapshot.state = LinkState::Disconnected;
                context.notify(LinkEvent::ConnectFail, LinkPayload::DisconnectReason(reason));
                return Transition(State::disconnected());
            }
            context.actions.push(DriverAction::Connect);
            self.snapshot.state = LinkState::Connecting;
            context.notify(LinkEvent::Retrying, LinkPayload::DisconnectReason(reason));
            return Transition(State::connecting());
        }
        context.actions.push(DriverAction::Stop);
        self.snapshot.retries = 0;
        self.snapshot.state = LinkState::Disconnected;
        context.notify(LinkEvent::Disconnected, LinkPayload::DisconnectReason(reason));
        Transition(State::disconnected())
    }

    /// Settle an explicit teardown. Ignored unless the caller asked for
    /// `Disconnected`; implicit teardowns mid-reconfigure settle via the
    /// driver's own events instead.
    fn settle_teardown(
        &mut self,
        context: &mut DispatchContext,
        ok: bool,
        success_event: LinkEvent,
    ) -> Outcome<State> {
        if self.snapshot.desired != DesiredLink::Disconnected {
            return Handled;
        }
        if !ok {
            // Acknowledged inconsistency window: state stays put until a
            // later driver event resolves it.
            context.notify(LinkEvent::DisconnectFail, LinkPayload::None);
            return Handled;
        }
        self.snapshot.retries = 0;
        self.snapshot.ip = None;
        self.snapshot.state = LinkState::Disconnected;
        context.notify(success_event, LinkPayload::None);
        Transition(State::disconnected())
    }

    fn station_restart(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        if self.snapshot.desired != DesiredLink::Connected {
            return Handled;
        }
        self.snapshot.retries = 0;
        self.snapshot.state = LinkState::Connecting;
        context.actions.push(DriverAction::Connect);
        context.notify(LinkEvent::Connecting, LinkPayload::None);
        Transition(State::connecting())
    }

    fn got_ip(&mut self, context: &mut DispatchContext, ip: [u8; 4]) -> Outcome<State> {
        self.snapshot.ip = Some(ip);
        self.snapshot.retries = 0;
        self.snapshot.state = LinkState::Connected;
        context.notify(LinkEvent::Connected, LinkPayload::Ip(ip));
        Transition(State::connected())
    }
}

#[state_machine(initial = "State::disconnected()")]
impl LinkMachine {
    #[state]
    fn disconnected(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::Command(LinkCommand::Connect(credentials)) => {
                self.begin_station(context, *credentials, false, false);
                Handled
            }
            LinkInput::Command(LinkCommand::StartSoftAp(credentials)) => {
                self.begin_soft_ap(context, *credentials, false, false);
                Transition(State::ap_starting())
            }
            LinkInput::Driver(DriverEvent::IfaceStarted) => self.station_restart(context),
            // Already settled; repeated teardown requests and stale driver
            // events are ignored rather than re-notified.
            _ => Handled,
        }
    }

    #[state]
    fn connecting(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::Driver(DriverEvent::GotIp { ip }) => self.got_ip(context, *ip),
            LinkInput::Driver(DriverEvent::Disconnected { reason }) => {
                self.station_dropped(context, *reason)
            }
            LinkInput::Driver(DriverEvent::IfaceStarted) => self.station_restart(context),
            LinkInput::Command(LinkCommand::Connect(credentials)) => {
                self.begin_station(context, *credentials, true, true);
                Transition(State::disconnected())
            }
            LinkInput::Command(LinkCommand::StartSoftAp(credentials)) => {
                self.begin_soft_ap(context, *credentials, true, true);
                Transition(State::ap_starting())
            }
            LinkInput::Command(LinkCommand::Disconnect) => {
                self.request_teardown(context, true);
                Handled
            }
            LinkInput::TeardownDone { ok } => {
                self.settle_teardown(context, *ok, LinkEvent::Disconnected)
            }
            _ => Handled,
        }
    }

    #[state]
    fn connected(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::Driver(DriverEvent::GotIp { ip }) => self.got_ip(context, *ip),
            LinkInput::Driver(DriverEvent::Disconnected { reason }) => {
                self.station_dropped(context, *reason)
            }
            LinkInput::Driver(DriverEvent::IfaceStarted) => self.station_restart(context),
            LinkInput::Command(LinkCommand::Connect(credentials)) => {
                self.begin_station(context, *credentials, true, true);
                Transition(State::disconnected())
            }
            LinkInput::Command(LinkCommand::StartSoftAp(credentials)) => {
                self.begin_soft_ap(context, *credentials, true, true);
                Transition(State::ap_starting())
            }
            LinkInput::Command(LinkCommand::Disconnect) => {
                self.request_teardown(context, true);
                Handled
            }
            LinkInput::TeardownDone { ok } => {
                self.settle_teardown(context, *ok, LinkEvent::Disconnected)
            }
            _ => Handled,
        }
    }

    #[state]
    fn ap_starting(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::Driver(DriverEvent::ApStarted) => {
                self.snapshot.state = LinkState::ApStarted;
                context.notify(LinkEvent::ApStarted, LinkPayload::None);
                Transition(State::ap_started())
            }
            LinkInput::Command(LinkCommand::Connect(credentials)) => {
                self.begin_station(context, *credentials, true, false);
                Transition(State::disconnected())
            }
            LinkInput::Command(LinkCommand::StartSoftAp(credentials)) => {
                self.begin_soft_ap(context, *credentials, true, false);
                Handled
            }
            LinkInput::Command(LinkCommand::StopSoftAp) => {
                self.request_teardown(context, false);
                Handled
            }
            LinkInput::TeardownDone { ok } => {
                self.settle_teardown(context, *ok, LinkEvent::ApStopped)
            }
            // Station-path events while in AP mode are cross-mode leakage
            // and must not mis-transition the machine.
            _ => Handled,
        }
    }

    #[state]
    fn ap_started(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::Driver(DriverEvent::ApStopped) => {
                self.snapshot.desired = DesiredLink::Disconnected;
                self.snapshot.state = LinkState::Disconnected;
                context.notify(LinkEvent::ApStopped, LinkPayload::None);
                Transition(State::disconnected())
            }
            LinkInput::Driver(DriverEvent::StationJoined { mac, aid }) => {
                context.notify(
                    LinkEvent::ApConnected,
                    LinkPayload::Station {
                        mac: *mac,
                        aid: *aid,
                    },
                );
                Handled
            }
            LinkInput::Driver(DriverEvent::StationLeft { mac, aid }) => {
                context.notify(
                    LinkEvent::ApDisconnected,
                    LinkPayload::Station {
                        mac: *mac,
                        aid: *aid,
                    },
                );
                Handled
            }
            LinkInput::Command(LinkCommand::Connect(credentials)) => {
                self.begin_station(context, *credentials, true, false);
                Transition(State::disconnected())
            }
            LinkInput::Command(LinkCommand::StartSoftAp(credentials)) => {
                self.begin_soft_ap(context, *credentials, true, false);
                Transition(State::ap_starting())
            }
            LinkInput::Command(LinkCommand::StopSoftAp) => {
                self.request_teardown(context, false);
                Handled
            }
            LinkInput::TeardownDone { ok } => {
                self.settle_teardown(context, *ok, LinkEvent::ApStopped)
            }
            _ => Handled,
        }
    }
}
