use esp_hal::{uart::Uart, Async};

pub(crate) type SerialUart = Uart<'static, Async>;

/// Nudge for the SNTP collaborator once the station path holds an address.
#[derive(Clone, Copy)]
pub(crate) enum TimeSyncCommand {
    SyncOnIp { ip: [u8; 4] },
}
