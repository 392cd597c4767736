use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

use airlink::link::{DriverEvent, LinkCommand, LinkNotice};

use super::types::TimeSyncCommand;

pub(crate) const UART_BAUD: u32 = 115_200;
pub(crate) const CONSOLE_CMD_BUF_LEN: usize = 128;
pub(crate) const HEAP_BYTES: usize = 64 * 1024;

/// SSID of the open fallback AP raised after the station path gives up.
pub(crate) const FALLBACK_AP_SSID: &str = "airlink-setup";
/// Idle time in the fallback AP before another station attempt.
pub(crate) const STATION_RETRY_HOLDOFF_SECS: u64 = 300;

pub(crate) static LINK_COMMANDS: Channel<CriticalSectionRawMutex, LinkCommand, 4> = Channel::new();
pub(crate) static DRIVER_EVENTS: Channel<CriticalSectionRawMutex, DriverEvent, 8> = Channel::new();
pub(crate) static LINK_NOTICES: Channel<CriticalSectionRawMutex, LinkNotice, 8> = Channel::new();
pub(crate) static TIME_SYNC_COMMANDS: Channel<CriticalSectionRawMutex, TimeSyncCommand, 2> =
    Channel::new();
