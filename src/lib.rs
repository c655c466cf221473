//! A non-blocking, buffered byte stream layered over a readiness-based
//! event loop.
//!
//! [`Stream`] wraps a single connected (or connecting) socket and exposes a
//! small, callback-driven API for framed reads (`read_bytes`, `read_until`,
//! `read_until_regex`, `read_until_close`) and asynchronous writes. A TLS
//! variant is folded into the same type via [`Transport::Tls`] rather than
//! bolted on as a subclass — see [`tls`] for the handshake state machine.
//!
//! The event loop itself ([`IoLoop`]) is a small external contract
//! (`add_handler` / `update_handler` / `remove_handler` / `add_callback`);
//! [`io_loop::MioEventLoop`] is the concrete `mio`-backed implementation
//! this crate ships, but `Stream` only ever talks to the trait.

#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;

pub mod buffer;
pub mod callback;
pub mod config;
pub mod error;
pub mod interest;
pub mod io_loop;
pub mod read_mode;
pub mod stream;
pub mod tls;
pub mod transport;

pub use config::StreamConfig;
pub use error::StreamError;
pub use interest::Interest;
pub use io_loop::{EventHandler, IoLoop, MioEventLoop};
pub use read_mode::ReadMode;
pub use stream::Stream;
pub use transport::Transport;
