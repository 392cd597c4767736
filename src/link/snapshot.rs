use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use super::types::{DesiredLink, LinkSnapshot, LinkState};

static LINK_STATE: AtomicU8 = AtomicU8::new(LinkState::Disconnected.as_u8());
static LINK_DESIRED: AtomicU8 = AtomicU8::new(DesiredLink::Disconnected.as_u8());
static LINK_RETRIES: AtomicU8 = AtomicU8::new(0);
static LINK_HAS_IP: AtomicBool = AtomicBool::new(false);
static LINK_IP: AtomicU32 = AtomicU32::new(0);

/// Publish the snapshot for synchronous readers. Single writer (the
/// dispatcher task); readers may observe a torn ip/state pair for one
/// update, which the `has_ip` flag written last keeps benign.
pub fn publish_link_snapshot(snapshot: LinkSnapshot) {
    LINK_STATE.store(snapshot.state.as_u8(), Ordering::Relaxed);
    LINK_DESIRED.store(snapshot.desired.as_u8(), Ordering::Relaxed);
    LINK_RETRIES.store(snapshot.retries, Ordering::Relaxed);
    match snapshot.ip {
        Some(ip) => {
            LINK_IP.store(u32::from_be_bytes(ip), Ordering::Relaxed);
            LINK_HAS_IP.store(true, Ordering::Relaxed);
        }
        None => {
            LINK_HAS_IP.store(false, Ordering::Relaxed);
            LINK_IP.store(0, Ordering::Relaxed);
        }
    }
}

pub fn read_link_snapshot() -> LinkSnapshot {
    let state = LinkState::from_u8(LINK_STATE.load(Ordering::Relaxed))
        .unwrap_or(LinkState::Disconnected);
    let desired = DesiredLink::from_u8(LINK_DESIRED.load(Ordering::Relaxed))
        .unwrap_or(DesiredLink::Disconnected);
    let retries = LINK_RETRIES.load(Ordering::Relaxed);
    let ip = if LINK_HAS_IP.load(Ordering::Relaxed) {
        Some(LINK_IP.load(Ordering::Relaxed).to_be_bytes())
    } else {
        None
    };
    LinkSnapshot {
        state,
        desired,
        retries,
        ip,
    }
}

pub fn read_link_state() -> LinkState {
    LinkState::from_u8(LINK_STATE.load(Ordering::Relaxed)).unwrap_or(LinkState::Disconnected)
}
