//! Test-only helpers, adapted from the reference implementation's own
//! `test_utils.rs` (`next_available_port`, `setup_logger`) down to just
//! what this crate's integration tests need.

use std::net::TcpListener;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static PORT_OFFSET: AtomicU16 = AtomicU16::new(0);
const PORT_START: u16 = 18888;

#[allow(dead_code)]
pub fn setup_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[allow(dead_code)]
pub fn next_available_port() -> u16 {
    loop {
        let port = PORT_START + PORT_OFFSET.fetch_add(1, Ordering::SeqCst);
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return port;
        }
    }
}
