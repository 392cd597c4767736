pub mod engine;
mod machine;
pub mod snapshot;
pub mod types;

pub use engine::{LinkApplyResult, LinkEngine};
pub use snapshot::{publish_link_snapshot, read_link_snapshot, read_link_state};
pub use types::{
    ActionBuffer, DesiredLink, DriverAction, DriverEvent, LinkCommand, LinkEvent, LinkInput,
    LinkNotice, LinkPayload, LinkSnapshot, LinkState, WifiCredentials, MAX_CONNECT_RETRIES,
    SOFT_AP_MAX_STATIONS, WIFI_PASSWORD_MAX, WIFI_SSID_MAX,
};
