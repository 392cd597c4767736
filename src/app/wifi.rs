//! esp-radio adapter: bring-up, driver event forwarding and the dispatcher
//! task that owns the [`LinkEngine`].

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, Either};
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::Instant;
use esp_hal::rng::Rng;
use esp_println::println;
use esp_radio::wifi::{
    event::{self, EventExt},
    ApConfig, AuthMethod, ClientConfig, Config as WifiRuntimeConfig, InternalWifiError,
    ModeConfig, WifiController, WifiDevice, WifiError,
};
use static_cell::StaticCell;

use airlink::link::{
    publish_link_snapshot, DriverAction, DriverEvent, LinkCommand, LinkEngine, LinkInput,
    LinkNotice, LinkState, WifiCredentials, SOFT_AP_MAX_STATIONS,
};

use super::config::{DRIVER_EVENTS, LINK_COMMANDS, LINK_NOTICES};

const WIFI_RX_QUEUE_SIZE: usize = 3;
const WIFI_TX_QUEUE_SIZE: usize = 2;
const WIFI_STATIC_RX_BUF_NUM: u8 = 4;
const WIFI_DYNAMIC_RX_BUF_NUM: u16 = 8;
const WIFI_DYNAMIC_TX_BUF_NUM: u16 = 8;
const WIFI_RX_BA_WIN: u8 = 3;

/// Forwarders stay registered for the lifetime of the firmware; a shutdown
/// only flips this gate, since esp-radio handlers cannot be unregistered.
static FORWARDERS_ACTIVE: AtomicBool = AtomicBool::new(false);
static FORWARDERS_INSTALLED: AtomicBool = AtomicBool::new(false);

pub(crate) struct LinkRuntime {
    pub(crate) controller: WifiController<'static>,
    pub(crate) net_runner: Runner<'static, WifiDevice<'static>>,
    pub(crate) stack: Stack<'static>,
}

pub(crate) fn setup(
    wifi: esp_hal::peripherals::WIFI<'static>,
) -> Result<LinkRuntime, &'static str> {
    static RADIO_CTRL: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

    let radio_ctrl = esp_radio::init().map_err(|err| {
        println!("link: esp_radio::init err={:?}", err);
        "link: esp_radio::init failed"
    })?;
    let radio_ctrl = RADIO_CTRL.init(radio_ctrl);
    let (controller, ifaces) = esp_radio::wifi::new(radio_ctrl, wifi, wifi_runtime_config())
        .map_err(|err| match err {
            WifiError::InvalidArguments => "link: wifi init failed invalid_args",
            WifiError::Unsupported => "link: wifi init failed unsupported",
            WifiError::NotInitialized => "link: wifi init failed not_initialized",
            WifiError::InternalError(InternalWifiError::NoMem) => "link: wifi init failed no_mem",
            _ => "link: wifi init failed other",
        })?;

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let (stack, net_runner) = embassy_net::new(
        ifaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::<3>::new()),
        seed,
    );

    Ok(LinkRuntime {
        controller,
        net_runner,
        stack,
    })
}

fn wifi_runtime_config() -> WifiRuntimeConfig {
    WifiRuntimeConfig::default()
        .with_rx_queue_size(WIFI_RX_QUEUE_SIZE)
        .with_tx_queue_size(WIFI_TX_QUEUE_SIZE)
        .with_static_rx_buf_num(WIFI_STATIC_RX_BUF_NUM)
        .with_dynamic_rx_buf_num(WIFI_DYNAMIC_RX_BUF_NUM)
        .with_dynamic_tx_buf_num(WIFI_DYNAMIC_TX_BUF_NUM)
        .with_ampdu_rx_enable(false)
        .with_ampdu_tx_enable(false)
        .with_rx_ba_win(WIFI_RX_BA_WIN)
}

/// The dispatcher task. Owns the controller and the engine; consumes
/// commands and driver events strictly one at a time.
#[embassy_executor::task]
pub(crate) async fn link_dispatch_task(mut controller: WifiController<'static>) {
    install_event_forwarders();
    let started_at = Instant::now();
    let mut engine = LinkEngine::new();
    println!("link: dispatcher up");

    loop {
        let input = match select(LINK_COMMANDS.receive(), DRIVER_EVENTS.receive()).await {
            Either::First(LinkCommand::Shutdown) => {
                shutdown_driver(&mut controller);
                return;
            }
            Either::First(command) => LinkInput::Command(command),
            Either::Second(driver_event) => LinkInput::Driver(driver_event),
        };
        dispatch(&mut engine, &mut controller, input, started_at);
    }
}

#[embassy_executor::task]
pub(crate) async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// DHCP watcher: esp-radio has no got-IP event, so address acquisition is
/// observed through the embassy-net config and forwarded as a driver event.
#[embassy_executor::task]
pub(crate) async fn ip_watch_task(stack: Stack<'static>) {
    loop {
        stack.wait_config_up().await;
        if let Some(config) = stack.config_v4() {
            let ip = config.address.address().octets();
            forward(DriverEvent::GotIp { ip });
        }
        stack.wait_config_down().await;
    }
}

fn dispatch(
    engine: &mut LinkEngine,
    controller: &mut WifiController<'static>,
    input: LinkInput,
    started_at: Instant,
) {
    let mut next = Some(input);
    while let Some(input) = next.take() {
        let result = engine.apply(input);
        if result.state_changed() {
            emit_link_transition(
                result.before.state,
                result.after.state,
                input.label(),
                started_at,
            );
        }
        publish_link_snapshot(result.after);

        let mut teardown_ok = true;
        for action in result.actions.iter() {
            if let Err(err) = execute(controller, action) {
                println!("link: action {} err={:?}", action.label(), err);
                if action.is_teardown() {
                    teardown_ok = false;
                }
            }
        }

        if let Some((link_event, payload)) = result.notice {
            let notice = LinkNotice {
                snapshot: result.after,
                event: link_event,
                payload,
            };
            if LINK_NOTICES.try_send(notice).is_err() {
                println!("link: notice queue full, dropped {}", link_event.as_str());
            }
        }

        // A disconnect/stop batch settles through the engine again so the
        // success or failure notice comes from one place.
        if result.requests_teardown_ack() {
            next = Some(LinkInput::TeardownDone { ok: teardown_ok });
        }
    }
}

fn execute(
    controller: &mut WifiController<'static>,
    action: &DriverAction,
) -> Result<(), WifiError> {
    match action {
        DriverAction::Disconnect => controller.disconnect(),
        DriverAction::Stop => controller.stop(),
        DriverAction::ApplyStation(credentials) => {
            controller.set_config(&station_mode_config(credentials)?)
        }
        DriverAction::ApplyAp(credentials) => {
            controller.set_config(&soft_ap_mode_config(credentials)?)
        }
        DriverAction::Start => controller.start(),
        DriverAction::Connect => controller.connect(),
    }
}

fn station_mode_config(credentials: &WifiCredentials) -> Result<ModeConfig, WifiError> {
    let ssid = credentials.ssid_str().ok_or(WifiError::InvalidArguments)?;
    let password = credentials
        .password_str()
        .ok_or(WifiError::InvalidArguments)?;
    let auth_method = if credentials.is_open() {
        AuthMethod::None
    } else {
        AuthMethod::Wpa2Personal
    };
    Ok(ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(ssid.into())
            .with_password(password.into())
            .with_auth_method(auth_method),
    ))
}

fn soft_ap_mode_config(credentials: &WifiCredentials) -> Result<ModeConfig, WifiError> {
    let ssid = credentials.ssid_str().ok_or(WifiError::InvalidArguments)?;
    let password = credentials
        .password_str()
        .ok_or(WifiError::InvalidArguments)?;
    let auth_method = if credentials.is_open() {
        AuthMethod::None
    } else {
        AuthMethod::Wpa2Personal
    };
    Ok(ModeConfig::AccessPoint(
        ApConfig::default()
            .with_ssid(ssid.into())
            .with_password(password.into())
            .with_auth_method(auth_method)
            .with_max_connections(SOFT_AP_MAX_STATIONS),
    ))
}

fn shutdown_driver(controller: &mut WifiController<'static>) {
    detach_event_forwarders();
    if let Err(err) = controller.disconnect() {
        println!("link: shutdown disconnect err={:?}", err);
    }
    if let Err(err) = controller.stop() {
        println!("link: shutdown stop err={:?}", err);
    }
    println!("link: dispatcher stopped");
}

fn install_event_forwarders() {
    FORWARDERS_ACTIVE.store(true, Ordering::Relaxed);
    if FORWARDERS_INSTALLED.swap(true, Ordering::Relaxed) {
        return;
    }

    event::StaStart::update_handler(|_| forward(DriverEvent::IfaceStarted));
    event::StaDisconnected::update_handler(|event| {
        forward(DriverEvent::Disconnected {
            reason: event.reason(),
        })
    });
    event::ApStart::update_handler(|_| forward(DriverEvent::ApStarted));
    event::ApStop::update_handler(|_| forward(DriverEvent::ApStopped));
    event::ApStaConnected::update_handler(|event| {
        forward(DriverEvent::StationJoined {
            mac: mac_from(event.mac()),
            aid: event.aid(),
        })
    });
    event::ApStaDisconnected::update_handler(|event| {
        forward(DriverEvent::StationLeft {
            mac: mac_from(event.mac()),
            aid: event.aid(),
        })
    });
}

fn detach_event_forwarders() {
    FORWARDERS_ACTIVE.store(false, Ordering::Relaxed);
}

fn forward(driver_event: DriverEvent) {
    if !FORWARDERS_ACTIVE.load(Ordering::Relaxed) {
        return;
    }
    if DRIVER_EVENTS.try_send(driver_event).is_err() {
        println!(
            "link: driver event queue full, dropped {}",
            driver_event.label()
        );
    }
}

fn mac_from(raw: &[u8]) -> [u8; 6] {
    let mut mac = [0u8; 6];
    let len = raw.len().min(mac.len());
    mac[..len].copy_from_slice(&raw[..len]);
    mac
}

fn emit_link_transition(from: LinkState, to: LinkState, trigger: &str, started_at: Instant) {
    let at_ms = started_at.elapsed().as_millis() as u32;
    println!(
        "LINK_EVENT {{\"from\":\"{}\",\"to\":\"{}\",\"trigger\":\"{}\",\"at_ms\":{}}}",
        from.as_str(),
        to.as_str(),
        trigger,
        at_ms
    );
}

pub(super) fn disconnect_reason_label(reason: u8) -> &'static str {
    match reason {
        200 => "beacon_timeout",
        201 => "no_ap_found",
        202 => "auth_fail",
        203 => "assoc_fail",
        204 => "handshake_timeout",
        205 => "connection_fail",
        210 => "no_ap_found_compatible_security",
        211 => "no_ap_found_authmode_threshold",
        212 => "no_ap_found_rssi_threshold",
        _ => "other",
    }
}
