//! Command surface over the link dispatcher.
//!
//! Commands are queued and return immediately; the outcome arrives later as
//! a [`LinkNotice`](airlink::link::LinkNotice) on `LINK_NOTICES`. The state
//! reads are synchronous and side-effect free.

use airlink::link::{
    read_link_snapshot, read_link_state, LinkCommand, LinkSnapshot, LinkState, WifiCredentials,
};

use super::config::LINK_COMMANDS;

pub(crate) async fn connect_ssid(ssid: &str, password: &str) {
    let credentials = WifiCredentials::from_parts(ssid.as_bytes(), password.as_bytes());
    LINK_COMMANDS.send(LinkCommand::Connect(credentials)).await;
}

pub(crate) async fn disconnect() {
    LINK_COMMANDS.send(LinkCommand::Disconnect).await;
}

pub(crate) async fn start_soft_ap(ssid: &str, password: &str) {
    let credentials = WifiCredentials::from_parts(ssid.as_bytes(), password.as_bytes());
    LINK_COMMANDS
        .send(LinkCommand::StartSoftAp(credentials))
        .await;
}

pub(crate) async fn stop_soft_ap() {
    LINK_COMMANDS.send(LinkCommand::StopSoftAp).await;
}

/// Detaches the driver event forwarders and stops the dispatcher. The last
/// published snapshot stays readable but is no longer maintained.
pub(crate) async fn shutdown() {
    LINK_COMMANDS.send(LinkCommand::Shutdown).await;
}

pub(crate) fn link_state() -> LinkState {
    read_link_state()
}

pub(crate) fn link_snapshot() -> LinkSnapshot {
    read_link_snapshot()
}
