//! The TLS handshake state machine.
//!
//! Driven the way `rustls`'s own `mio` examples drive a session: pump
//! `read_tls`/`write_tls` against the socket, feed the result to
//! `process_new_packets`, and inspect `wants_read`/`wants_write` to learn
//! which readiness the handshake is still blocked on. This crate keeps
//! those states explicit (`ssl_accepting`, `handshake_reading`,
//! `handshake_writing` on [`crate::stream::Stream`]) rather than hiding the
//! handshake behind a single opaque `read`/`write`, matching the reference
//! implementation's `SSLIOStream` state machine.

use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;

use rustls::{ClientConnection, ServerConnection};

use crate::error::{Fallible, StreamError};
use crate::transport::TlsTransport;

/// Either side of a TLS session. Both variants deref to
/// `rustls::ConnectionCommon`, so the handshake driver below can treat
/// them uniformly.
pub enum TlsSession {
    Server(ServerConnection),
    Client(ClientConnection),
}

impl TlsSession {
    pub fn new_server(config: Arc<rustls::ServerConfig>) -> Fallible<Self> {
        Ok(TlsSession::Server(
            ServerConnection::new(config).map_err(|e| StreamError::TlsHandshake {
                detail: e.to_string(),
                peer: String::new(),
            })?,
        ))
    }

    pub fn new_client(
        config: Arc<rustls::ClientConfig>,
        server_name: rustls_pki_types::ServerName<'static>,
    ) -> Fallible<Self> {
        Ok(TlsSession::Client(
            ClientConnection::new(config, server_name).map_err(|e| StreamError::TlsHandshake {
                detail: e.to_string(),
                peer: String::new(),
            })?,
        ))
    }

    pub fn is_handshaking(&self) -> bool {
        match self {
            TlsSession::Server(c) => c.is_handshaking(),
            TlsSession::Client(c) => c.is_handshaking(),
        }
    }

    pub fn wants_read(&self) -> bool {
        match self {
            TlsSession::Server(c) => c.wants_read(),
            TlsSession::Client(c) => c.wants_read(),
        }
    }

    pub fn wants_write(&self) -> bool {
        match self {
            TlsSession::Server(c) => c.wants_write(),
            TlsSession::Client(c) => c.wants_write(),
        }
    }

    fn read_tls(&mut self, rd: &mut dyn Read) -> io::Result<usize> {
        match self {
            TlsSession::Server(c) => c.read_tls(rd),
            TlsSession::Client(c) => c.read_tls(rd),
        }
    }

    fn write_tls(&mut self, wr: &mut dyn Write) -> io::Result<usize> {
        match self {
            TlsSession::Server(c) => c.write_tls(wr),
            TlsSession::Client(c) => c.write_tls(wr),
        }
    }

    fn process_new_packets(&mut self) -> Result<(), rustls::Error> {
        match self {
            TlsSession::Server(c) => c.process_new_packets().map(|_| ()),
            TlsSession::Client(c) => c.process_new_packets().map(|_| ()),
        }
    }

    pub fn reader(&mut self) -> Box<dyn Read + '_> {
        match self {
            TlsSession::Server(c) => Box::new(c.reader()),
            TlsSession::Client(c) => Box::new(c.reader()),
        }
    }

    pub fn writer(&mut self) -> Box<dyn Write + '_> {
        match self {
            TlsSession::Server(c) => Box::new(c.writer()),
            TlsSession::Client(c) => Box::new(c.writer()),
        }
    }

    /// Pulls whatever ciphertext the socket has on hand into the session
    /// and processes it into plaintext the next `reader().read` can serve.
    /// `Ok(0)` means the underlying socket hit EOF, mirroring `Read`'s own
    /// contract; `WouldBlock` means no ciphertext is available right now,
    /// not that the connection is in trouble.
    pub(crate) fn pump_incoming(&mut self, sock: &mut dyn Read) -> io::Result<usize> {
        let n = self.read_tls(sock)?;
        if n > 0 {
            self.process_new_packets()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        }
        Ok(n)
    }

    /// Flushes as much pending ciphertext as the socket will currently
    /// accept. A `WouldBlock` mid-flush is not an error — the remainder
    /// stays buffered in the session and goes out on a later write or the
    /// next WRITE-readiness pump.
    pub(crate) fn flush_outgoing(&mut self, sock: &mut dyn Write) -> io::Result<()> {
        loop {
            match self.write_tls(sock) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

/// What the handshake needs before it can make further progress.
pub enum HandshakeOutcome {
    NeedsRead,
    NeedsWrite,
    Complete,
}

/// Drives one step of the handshake: flush any pending outbound TLS
/// records, then attempt to read and process inbound ones. Mirrors
/// `do_ssl_handshake` in the distilled design (§4.6): the caller is
/// expected to call this again on the next matching readiness event until
/// it reports [`HandshakeOutcome::Complete`].
pub fn drive_handshake(transport: &mut TlsTransport, peer: &str) -> Fallible<HandshakeOutcome> {
    let TlsTransport { sock, session } = transport;

    if session.wants_write() {
        loop {
            match session.write_tls(sock) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    return Ok(HandshakeOutcome::NeedsWrite);
                }
                Err(e) => return Err(tls_io_error(e, peer)),
            }
        }
    }

    if session.wants_read() {
        match session.read_tls(sock) {
            Ok(0) => {
                return Err(StreamError::TlsHandshake {
                    detail: "peer closed the connection during the handshake".to_string(),
                    peer: StreamError::peer_suffix(Some(peer)),
                });
            }
            Ok(_) => {
                if let Err(e) = session.process_new_packets() {
                    return Err(StreamError::TlsHandshake {
                        detail: e.to_string(),
                        peer: StreamError::peer_suffix(Some(peer)),
                    });
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                return Ok(HandshakeOutcome::NeedsRead);
            }
            Err(e) => return Err(tls_io_error(e, peer)),
        }
    }

    if session.is_handshaking() {
        if session.wants_write() {
            Ok(HandshakeOutcome::NeedsWrite)
        } else {
            Ok(HandshakeOutcome::NeedsRead)
        }
    } else {
        Ok(HandshakeOutcome::Complete)
    }
}

fn tls_io_error(e: io::Error, peer: &str) -> StreamError {
    match e.kind() {
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof => {
            StreamError::TlsHandshake {
                detail: format!("connection aborted during handshake: {}", e),
                peer: StreamError::peer_suffix(Some(peer)),
            }
        }
        _ => StreamError::Io(e),
    }
}
