pub(crate) mod api;
pub(crate) mod config;
mod serial;
pub(crate) mod types;
mod wifi;

use embassy_time::{with_timeout, Duration};
use esp_hal::{
    timer::timg::TimerGroup,
    uart::{Config as UartConfig, Uart},
};
use esp_println::println;

use airlink::link::{LinkEvent, LinkNotice, LinkPayload, LinkState};

use self::config::{
    FALLBACK_AP_SSID, HEAP_BYTES, LINK_NOTICES, STATION_RETRY_HOLDOFF_SECS, TIME_SYNC_COMMANDS,
    UART_BAUD,
};
use self::types::TimeSyncCommand;

pub(crate) fn run() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // The radio allocates from this heap.
    esp_alloc::heap_allocator!(size: HEAP_BYTES);

    let uart_cfg = UartConfig::default().with_baudrate(UART_BAUD);
    let uart = Uart::new(peripherals.UART0, uart_cfg)
        .expect("failed to init UART0")
        .with_rx(peripherals.GPIO3)
        .with_tx(peripherals.GPIO1)
        .into_async();

    let runtime = wifi::setup(peripherals.WIFI).expect("wifi bring-up failed");

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        spawner.must_spawn(wifi::net_task(runtime.net_runner));
        spawner.must_spawn(wifi::ip_watch_task(runtime.stack));
        spawner.must_spawn(wifi::link_dispatch_task(runtime.controller));
        spawner.must_spawn(supervisor_task());
        spawner.must_spawn(time_sync_task());
        spawner.must_spawn(serial::console_task(uart));
    });
}

/// Higher-layer link policy: kick off the initial connect, log every
/// lifecycle record, fall back to an open setup AP when the station path
/// gives up, and retry station mode after the AP has sat idle.
#[embassy_executor::task]
async fn supervisor_task() {
    let compiled = compiled_credentials();
    match compiled {
        Some((ssid, password)) => {
            println!("link: connecting to compiled ssid {}", ssid);
            api::connect_ssid(ssid, password).await;
        }
        None => {
            println!("link: no compiled credentials, starting setup AP");
            api::start_soft_ap(FALLBACK_AP_SSID, "").await;
        }
    }

    let mut fallback_active = false;
    let mut attached_stations: u8 = 0;

    loop {
        let retry_pending = fallback_active
            && compiled.is_some()
            && attached_stations == 0
            && api::link_state() == LinkState::ApStarted;

        let notice = if retry_pending {
            match with_timeout(
                Duration::from_secs(STATION_RETRY_HOLDOFF_SECS),
                LINK_NOTICES.receive(),
            )
            .await
            {
                Ok(notice) => notice,
                Err(_) => {
                    println!("link: setup AP idle, retrying station mode");
                    fallback_active = false;
                    api::stop_soft_ap().await;
                    continue;
                }
            }
        } else {
            LINK_NOTICES.receive().await
        };

        log_notice(&notice);

        match (notice.event, notice.payload) {
            (LinkEvent::Connected, LinkPayload::Ip(ip)) => {
                if TIME_SYNC_COMMANDS
                    .try_send(TimeSyncCommand::SyncOnIp { ip })
                    .is_err()
                {
                    println!("link: time sync queue full");
                }
            }
            (LinkEvent::ConnectFail, _) => {
                println!("link: station retries exhausted, falling back to setup AP");
                fallback_active = true;
                attached_stations = 0;
                api::start_soft_ap(FALLBACK_AP_SSID, "").await;
            }
            (LinkEvent::ApConnected, _) => {
                attached_stations = attached_stations.saturating_add(1);
            }
            (LinkEvent::ApDisconnected, _) => {
                attached_stations = attached_stations.saturating_sub(1);
            }
            (LinkEvent::ApStopped, _) => {
                attached_stations = 0;
                if !fallback_active {
                    if let Some((ssid, password)) = compiled {
                        api::connect_ssid(ssid, password).await;
                    }
                }
            }
            _ => {}
        }
    }
}

/// SNTP itself runs as an external collaborator; this end only records the
/// request so host tooling can correlate sync timing with link events.
#[embassy_executor::task]
async fn time_sync_task() {
    loop {
        let TimeSyncCommand::SyncOnIp { ip } = TIME_SYNC_COMMANDS.receive().await;
        println!(
            "time_sync: requested ip={}.{}.{}.{}",
            ip[0], ip[1], ip[2], ip[3]
        );
    }
}

fn compiled_credentials() -> Option<(&'static str, &'static str)> {
    let ssid = option_env!("AIRLINK_WIFI_SSID").or(option_env!("SSID"))?;
    let password = option_env!("AIRLINK_WIFI_PASSWORD")
        .or(option_env!("PASSWORD"))
        .unwrap_or("");
    Some((ssid, password))
}

fn log_notice(notice: &LinkNotice) {
    match notice.payload {
        LinkPayload::None => println!(
            "link: event {} state={}",
            notice.event.as_str(),
            notice.snapshot.state.as_str()
        ),
        LinkPayload::DisconnectReason(reason) => println!(
            "link: event {} reason={} ({}) retries={}",
            notice.event.as_str(),
            reason,
            wifi::disconnect_reason_label(reason),
            notice.snapshot.retries
        ),
        LinkPayload::Ip(ip) => println!(
            "link: event {} ip={}.{}.{}.{}",
            notice.event.as_str(),
            ip[0],
            ip[1],
            ip[2],
            ip[3]
        ),
        LinkPayload::Station { mac, aid } => println!(
            "link: event {} mac={:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x} aid={}",
            notice.event.as_str(),
            mac[0],
            mac[1],
            mac[2],
            mac[3],
            mac[4],
            mac[5],
            aid
        ),
    }
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}
