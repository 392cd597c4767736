//! On-target exercise of the link engine on xtensa/ESP32.
//!
//! Drives full command/event scenarios through a real `LinkEngine` instance
//! under the embassy executor, without touching the radio.

#![no_std]
#![no_main]

#[cfg(test)]
#[embedded_test::tests(executor = esp_rtos::embassy::Executor::new())]
mod tests {
    use airlink::link::{
        DesiredLink, DriverEvent, LinkCommand, LinkEngine, LinkEvent, LinkInput, LinkState,
        WifiCredentials, MAX_CONNECT_RETRIES,
    };

    #[init]
    fn init() {
        let peripherals = esp_hal::init(esp_hal::Config::default());
        let timg0 = esp_hal::timer::timg::TimerGroup::new(peripherals.TIMG0);
        esp_rtos::start(timg0.timer0);
    }

    #[test]
    async fn station_lifecycle_connect_then_explicit_disconnect() {
        let mut engine = LinkEngine::new();
        let credentials = WifiCredentials::from_parts(b"homenet", b"hunter2");

        let queued = engine.apply(LinkInput::Command(LinkCommand::Connect(credentials)));
        assert_eq!(queued.after.desired, DesiredLink::Connected);

        let connecting = engine.apply(LinkInput::Driver(DriverEvent::IfaceStarted));
        assert_eq!(connecting.after.state, LinkState::Connecting);

        let connected = engine.apply(LinkInput::Driver(DriverEvent::GotIp {
            ip: [192, 168, 4, 20],
        }));
        assert_eq!(connected.after.state, LinkState::Connected);
        assert_eq!(connected.after.ip, Some([192, 168, 4, 20]));

        let request = engine.apply(LinkInput::Command(LinkCommand::Disconnect));
        assert!(request.requests_teardown_ack());

        let settled = engine.apply(LinkInput::TeardownDone { ok: true });
        assert_eq!(settled.after.state, LinkState::Disconnected);
        assert_eq!(settled.after.retries, 0);
        assert!(settled.after.ip.is_none());
        assert!(matches!(settled.notice, Some((LinkEvent::Disconnected, _))));
    }

    #[test]
    async fn retry_budget_exhausts_into_connect_fail() {
        let mut engine = LinkEngine::new();
        let credentials = WifiCredentials::from_parts(b"homenet", b"hunter2");
        let _ = engine.apply(LinkInput::Command(LinkCommand::Connect(credentials)));
        let _ = engine.apply(LinkInput::Driver(DriverEvent::IfaceStarted));

        let mut retrying = 0u8;
        let mut connect_fail = 0u8;
        for _ in 0..MAX_CONNECT_RETRIES {
            let result = engine.apply(LinkInput::Driver(DriverEvent::Disconnected { reason: 201 }));
            assert!(result.after.retries <= MAX_CONNECT_RETRIES);
            match result.notice {
                Some((LinkEvent::Retrying, _)) => retrying += 1,
                Some((LinkEvent::ConnectFail, _)) => connect_fail += 1,
                _ => panic!("unexpected notice"),
            }
        }
        assert_eq!(retrying, MAX_CONNECT_RETRIES - 1);
        assert_eq!(connect_fail, 1);
        assert_eq!(engine.snapshot().state, LinkState::Disconnected);
    }

    #[test]
    async fn soft_ap_round_trip_with_station_churn() {
        let mut engine = LinkEngine::new();
        let credentials = WifiCredentials::from_parts(b"airlink-setup", b"");

        let starting = engine.apply(LinkInput::Command(LinkCommand::StartSoftAp(credentials)));
        assert_eq!(starting.after.state, LinkState::ApStarting);

        let up = engine.apply(LinkInput::Driver(DriverEvent::ApStarted));
        assert_eq!(up.after.state, LinkState::ApStarted);

        let mac = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        let joined = engine.apply(LinkInput::Driver(DriverEvent::StationJoined { mac, aid: 1 }));
        assert!(matches!(joined.notice, Some((LinkEvent::ApConnected, _))));
        assert_eq!(joined.after.state, LinkState::ApStarted);

        let _ = engine.apply(LinkInput::Driver(DriverEvent::StationLeft { mac, aid: 1 }));

        let request = engine.apply(LinkInput::Command(LinkCommand::StopSoftAp));
        assert!(request.requests_teardown_ack());
        let stopped = engine.apply(LinkInput::TeardownDone { ok: true });
        assert_eq!(stopped.after.state, LinkState::Disconnected);
        assert!(matches!(stopped.notice, Some((LinkEvent::ApStopped, _))));
    }

    #[test]
    async fn reconfigure_from_ap_to_station_is_exclusive() {
        let mut engine = LinkEngine::new();
        let ap = WifiCredentials::from_parts(b"airlink-setup", b"");
        let _ = engine.apply(LinkInput::Command(LinkCommand::StartSoftAp(ap)));
        let _ = engine.apply(LinkInput::Driver(DriverEvent::ApStarted));

        let station = WifiCredentials::from_parts(b"homenet", b"hunter2");
        let result = engine.apply(LinkInput::Command(LinkCommand::Connect(station)));
        assert_eq!(result.after.state, LinkState::Disconnected);
        assert_eq!(result.after.desired, DesiredLink::Connected);
        assert!(result.requests_teardown_ack());
    }
}
