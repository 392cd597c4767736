//! UART control console. Line-oriented commands over UART0 drive the link
//! API, mirroring what a provisioning host sends during bring-up:
//!
//! `WIFISET <ssid> [password]`, `WIFIOFF`, `APSET <ssid> [password]`,
//! `APOFF`, `WIFISTAT`, `WIFIKILL`.

use core::fmt::Write;

use airlink::link::{WIFI_PASSWORD_MAX, WIFI_SSID_MAX};

use super::{api, config::CONSOLE_CMD_BUF_LEN, types::SerialUart};

enum ConsoleCommand<'a> {
    WifiSet { ssid: &'a str, password: &'a str },
    WifiOff,
    ApSet { ssid: &'a str, password: &'a str },
    ApOff,
    Status,
    Kill,
}

#[embassy_executor::task]
pub(crate) async fn console_task(mut uart: SerialUart) {
    let mut line_buf = [0u8; CONSOLE_CMD_BUF_LEN];
    let mut line_len = 0usize;
    let mut rx = [0u8; 1];

    loop {
        let read = match uart.read_async(&mut rx).await {
            Ok(read) => read,
            Err(_) => continue,
        };
        if read == 0 {
            continue;
        }
        let byte = rx[0];
        if byte == b'\r' || byte == b'\n' {
            if line_len == 0 {
                continue;
            }
            match parse_console_command(&line_buf[..line_len]) {
                Some(command) => run_console_command(&mut uart, command).await,
                None => uart_write_all(&mut uart, b"CMD ERR\r\n").await,
            }
            line_len = 0;
        } else if line_len < line_buf.len() {
            line_buf[line_len] = byte;
            line_len += 1;
        } else {
            line_len = 0;
        }
    }
}

async fn run_console_command(uart: &mut SerialUart, command: ConsoleCommand<'_>) {
    match command {
        ConsoleCommand::WifiSet { ssid, password } => {
            api::connect_ssid(ssid, password).await;
            uart_write_all(uart, b"WIFISET OK\r\n").await;
        }
        ConsoleCommand::WifiOff => {
            api::disconnect().await;
            uart_write_all(uart, b"WIFIOFF OK\r\n").await;
        }
        ConsoleCommand::ApSet { ssid, password } => {
            api::start_soft_ap(ssid, password).await;
            uart_write_all(uart, b"APSET OK\r\n").await;
        }
        ConsoleCommand::ApOff => {
            api::stop_soft_ap().await;
            uart_write_all(uart, b"APOFF OK\r\n").await;
        }
        ConsoleCommand::Status => write_status(uart).await,
        ConsoleCommand::Kill => {
            api::shutdown().await;
            uart_write_all(uart, b"WIFIKILL OK\r\n").await;
        }
    }
}

async fn write_status(uart: &mut SerialUart) {
    let snapshot = api::link_snapshot();
    let mut line = heapless::String::<96>::new();
    let _ = write!(
        &mut line,
        "WIFISTAT state={} desired={} retries={}",
        snapshot.state.as_str(),
        snapshot.desired.as_str(),
        snapshot.retries
    );
    if let Some(ip) = snapshot.ip {
        let _ = write!(&mut line, " ip={}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
    }
    let _ = line.push_str("\r\n");
    uart_write_all(uart, line.as_bytes()).await;
}

async fn uart_write_all(uart: &mut SerialUart, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match uart.write_async(bytes).await {
            Ok(0) | Err(_) => return,
            Ok(written) => bytes = &bytes[written..],
        }
    }
}

fn parse_console_command(line: &[u8]) -> Option<ConsoleCommand<'_>> {
    let trimmed = trim_ascii_whitespace(line);
    if trimmed == b"WIFIOFF" {
        return Some(ConsoleCommand::WifiOff);
    }
    if trimmed == b"APOFF" {
        return Some(ConsoleCommand::ApOff);
    }
    if trimmed == b"WIFISTAT" {
        return Some(ConsoleCommand::Status);
    }
    if trimmed == b"WIFIKILL" {
        return Some(ConsoleCommand::Kill);
    }
    if let Some(rest) = strip_command(trimmed, b"WIFISET") {
        let (ssid, password) = parse_credentials(rest)?;
        return Some(ConsoleCommand::WifiSet { ssid, password });
    }
    if let Some(rest) = strip_command(trimmed, b"APSET") {
        let (ssid, password) = parse_credentials(rest)?;
        return Some(ConsoleCommand::ApSet { ssid, password });
    }
    None
}

fn strip_command<'a>(line: &'a [u8], cmd: &[u8]) -> Option<&'a [u8]> {
    if !line.starts_with(cmd) {
        return None;
    }
    let rest = &line[cmd.len()..];
    if rest.first().is_some_and(|byte| byte.is_ascii_whitespace()) {
        Some(rest)
    } else {
        None
    }
}

/// `<ssid> [password]`. Oversized fields are rejected here instead of being
/// silently truncated downstream.
fn parse_credentials(rest: &[u8]) -> Option<(&str, &str)> {
    let rest = trim_ascii_whitespace(rest);
    let (ssid_bytes, password_bytes) = match rest.iter().position(|b| b.is_ascii_whitespace()) {
        Some(split) => (&rest[..split], trim_ascii_whitespace(&rest[split..])),
        None => (rest, &rest[rest.len()..]),
    };
    if ssid_bytes.is_empty()
        || ssid_bytes.len() > WIFI_SSID_MAX
        || password_bytes.len() > WIFI_PASSWORD_MAX
        || password_bytes.iter().any(|b| b.is_ascii_whitespace())
    {
        return None;
    }
    let ssid = core::str::from_utf8(ssid_bytes).ok()?;
    let password = core::str::from_utf8(password_bytes).ok()?;
    Some((ssid, password))
}

fn trim_ascii_whitespace(line: &[u8]) -> &[u8] {
    let mut start = 0usize;
    let mut end = line.len();
    while start < end && line[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && line[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &line[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wifiset_with_password() {
        match parse_console_command(b"WIFISET homenet hunter2") {
            Some(ConsoleCommand::WifiSet { ssid, password }) => {
                assert_eq!(ssid, "homenet");
                assert_eq!(password, "hunter2");
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn parses_wifiset_open_network() {
        match parse_console_command(b"WIFISET cafe") {
            Some(ConsoleCommand::WifiSet { ssid, password }) => {
                assert_eq!(ssid, "cafe");
                assert!(password.is_empty());
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn parses_apset_with_surrounding_whitespace() {
        match parse_console_command(b"  APSET setup-net secret \r") {
            Some(ConsoleCommand::ApSet { ssid, password }) => {
                assert_eq!(ssid, "setup-net");
                assert_eq!(password, "secret");
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn parses_bare_commands() {
        assert!(matches!(
            parse_console_command(b"WIFIOFF"),
            Some(ConsoleCommand::WifiOff)
        ));
        assert!(matches!(
            parse_console_command(b"APOFF"),
            Some(ConsoleCommand::ApOff)
        ));
        assert!(matches!(
            parse_console_command(b"WIFISTAT"),
            Some(ConsoleCommand::Status)
        ));
        assert!(matches!(
            parse_console_command(b"WIFIKILL"),
            Some(ConsoleCommand::Kill)
        ));
    }

    #[test]
    fn rejects_oversized_ssid() {
        let mut line = heapless::Vec::<u8, 64>::new();
        line.extend_from_slice(b"WIFISET ").expect("prefix");
        for _ in 0..(WIFI_SSID_MAX + 1) {
            line.push(b'a').expect("ssid");
        }
        assert!(parse_console_command(&line).is_none());
    }

    #[test]
    fn rejects_missing_ssid_and_unknown_commands() {
        assert!(parse_console_command(b"WIFISET").is_none());
        assert!(parse_console_command(b"WIFISET  ").is_none());
        assert!(parse_console_command(b"REBOOT").is_none());
    }
}
