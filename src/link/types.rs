pub const WIFI_SSID_MAX: usize = 32;
pub const WIFI_PASSWORD_MAX: usize = 64;

/// Consecutive reconnect attempts before the station path gives up.
pub const MAX_CONNECT_RETRIES: u8 = 5;

/// Fixed association limit configured for the soft AP.
pub const SOFT_AP_MAX_STATIONS: u16 = 4;

/// Station or soft-AP credentials in driver field widths.
///
/// Oversized input is truncated to the driver-imposed 32/64 byte limits
/// without surfacing an error; callers that care must validate beforehand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: [u8; WIFI_SSID_MAX],
    pub ssid_len: u8,
    pub password: [u8; WIFI_PASSWORD_MAX],
    pub password_len: u8,
}

impl WifiCredentials {
    pub fn from_parts(ssid: &[u8], password: &[u8]) -> Self {
        let ssid_len = ssid.len().min(WIFI_SSID_MAX);
        let password_len = password.len().min(WIFI_PASSWORD_MAX);
        let mut result = Self {
            ssid: [0; WIFI_SSID_MAX],
            ssid_len: ssid_len as u8,
            password: [0; WIFI_PASSWORD_MAX],
            password_len: password_len as u8,
        };
        result.ssid[..ssid_len].copy_from_slice(&ssid[..ssid_len]);
        result.password[..password_len].copy_from_slice(&password[..password_len]);
        result
    }

    pub fn ssid_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.ssid[..self.ssid_len as usize]).ok()
    }

    pub fn password_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.password[..self.password_len as usize]).ok()
    }

    /// Empty password maps to an open (unauthenticated) soft AP.
    pub fn is_open(&self) -> bool {
        self.password_len == 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    ApStarting,
    ApStarted,
}

impl LinkState {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::ApStarting => 3,
            Self::ApStarted => 4,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::ApStarting),
            4 => Some(Self::ApStarted),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::ApStarting => "ApStarting",
            Self::ApStarted => "ApStarted",
        }
    }
}

/// The caller's last-requested target; retry decisions converge toward it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DesiredLink {
    Disconnected,
    Connected,
    ApStarted,
}

impl DesiredLink {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connected => 1,
            Self::ApStarted => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connected),
            2 => Some(Self::ApStarted),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
            Self::ApStarted => "ApStarted",
        }
    }
}

/// Symbolic lifecycle event delivered to the notice queue subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkEvent {
    Connecting,
    Retrying,
    Connected,
    ConnectFail,
    Disconnected,
    DisconnectFail,
    ApStarted,
    ApStopped,
    ApConnected,
    ApDisconnected,
}

impl LinkEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Retrying => "retrying",
            Self::Connected => "connected",
            Self::ConnectFail => "connect_fail",
            Self::Disconnected => "disconnected",
            Self::DisconnectFail => "disconnect_fail",
            Self::ApStarted => "ap_started",
            Self::ApStopped => "ap_stopped",
            Self::ApConnected => "ap_connected",
            Self::ApDisconnected => "ap_disconnected",
        }
    }
}

/// Raw payload carried through with a lifecycle event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkPayload {
    None,
    DisconnectReason(u8),
    Ip([u8; 4]),
    Station { mac: [u8; 6], aid: u8 },
}

/// Driver-level event after platform classification.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DriverEvent {
    IfaceStarted,
    Disconnected { reason: u8 },
    GotIp { ip: [u8; 4] },
    ApStarted,
    ApStopped,
    StationJoined { mac: [u8; 6], aid: u8 },
    StationLeft { mac: [u8; 6], aid: u8 },
}

impl DriverEvent {
    pub const fn label(self) -> &'static str {
        match self {
            Self::IfaceStarted => "iface_started",
            Self::Disconnected { .. } => "disconnected",
            Self::GotIp { .. } => "got_ip",
            Self::ApStarted => "ap_started",
            Self::ApStopped => "ap_stopped",
            Self::StationJoined { .. } => "station_joined",
            Self::StationLeft { .. } => "station_left",
        }
    }
}

/// Command issued to the driver; all are fire-and-forget except
/// `Disconnect`/`Stop`, whose failure is recoverable and reported.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DriverAction {
    Disconnect,
    Stop,
    ApplyStation(WifiCredentials),
    ApplyAp(WifiCredentials),
    Start,
    Connect,
}

impl DriverAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disconnect => "disconnect",
            Self::Stop => "stop",
            Self::ApplyStation(_) => "apply_station",
            Self::ApplyAp(_) => "apply_ap",
            Self::Start => "start",
            Self::Connect => "connect",
        }
    }

    pub const fn is_teardown(self) -> bool {
        matches!(self, Self::Disconnect | Self::Stop)
    }
}

/// Caller-facing command surface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkCommand {
    Connect(WifiCredentials),
    Disconnect,
    StartSoftAp(WifiCredentials),
    StopSoftAp,
    Shutdown,
}

impl LinkCommand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Disconnect => "disconnect",
            Self::StartSoftAp(_) => "start_soft_ap",
            Self::StopSoftAp => "stop_soft_ap",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Everything the engine consumes, strictly one at a time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkInput {
    Command(LinkCommand),
    Driver(DriverEvent),
    /// Dispatcher acknowledgement after issuing a disconnect/stop batch.
    TeardownDone { ok: bool },
}

impl LinkInput {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Command(command) => command.label(),
            Self::Driver(event) => event.label(),
            Self::TeardownDone { .. } => "teardown_done",
        }
    }
}

/// Bounded buffer of driver actions produced by a single input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionBuffer {
    len: usize,
    slots: [Option<DriverAction>; Self::MAX],
}

impl ActionBuffer {
    pub const MAX: usize = 4;

    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [None; Self::MAX],
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.slots = [None; Self::MAX];
    }

    pub fn push(&mut self, action: DriverAction) {
        if self.len >= Self::MAX {
            return;
        }
        self.slots[self.len] = Some(action);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriverAction> {
        self.slots[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn contains_teardown(&self) -> bool {
        self.iter().any(|action| action.is_teardown())
    }
}

impl Default for ActionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LinkSnapshot {
    pub state: LinkState,
    pub desired: DesiredLink,
    pub retries: u8,
    /// Only meaningful while `state == Connected`.
    pub ip: Option<[u8; 4]>,
}

impl LinkSnapshot {
    pub const fn default_const() -> Self {
        Self {
            state: LinkState::Disconnected,
            desired: DesiredLink::Disconnected,
            retries: 0,
            ip: None,
        }
    }
}

impl Default for LinkSnapshot {
    fn default() -> Self {
        Self::default_const()
    }
}

/// One lifecycle record as written into the notice queue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LinkNotice {
    pub snapshot: LinkSnapshot,
    pub event: LinkEvent,
    pub payload: LinkPayload,
}
