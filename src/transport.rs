//! The socket slot, modeled as an enum rather than a mutable trait object
//! so the TLS connect-completion path can swap the plain socket for a
//! TLS-wrapped one in place (§9, "in-place socket replacement").

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use mio::event::Source;
use mio::net::TcpStream;

use crate::tls::TlsSession;

/// The underlying transport a `Stream` drives: either a bare socket, or
/// one with a TLS session layered over the same socket.
pub enum Transport {
    Plain(TcpStream),
    Tls(TlsTransport),
}

/// A TLS session bound to the socket it was negotiated over. The session
/// is a filter, not an I/O object: application bytes still flow through
/// `sock`, mediated by `session`'s internal buffers.
pub struct TlsTransport {
    pub sock: TcpStream,
    pub session: TlsSession,
}

impl Transport {
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Transport::Plain(sock) => sock.peer_addr(),
            Transport::Tls(t) => t.sock.peer_addr(),
        }
    }

    /// The raw, registrable socket — the same one for both variants; TLS
    /// never owns its own file descriptor.
    pub fn as_source(&mut self) -> &mut dyn Source {
        match self {
            Transport::Plain(sock) => sock,
            Transport::Tls(t) => &mut t.sock,
        }
    }

    pub fn so_error(&self) -> io::Result<Option<io::Error>> {
        match self {
            Transport::Plain(sock) => sock.take_error(),
            Transport::Tls(t) => t.sock.take_error(),
        }
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(sock) => sock.read(buf),
            Transport::Tls(t) => {
                let TlsTransport { sock, session } = t;
                // Pump the socket before trying to read plaintext back out —
                // `reader().read` only ever serves bytes already decrypted
                // by a prior `process_new_packets`, it never touches `sock`
                // itself.
                match session.pump_incoming(sock) {
                    Ok(0) => return Ok(0),
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(e),
                }
                session.reader().read(buf).or_else(|e| {
                    if session.wants_read() {
                        Err(io::Error::new(io::ErrorKind::WouldBlock, e))
                    } else {
                        Err(e)
                    }
                })
            }
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(sock) => sock.write(buf),
            Transport::Tls(t) => {
                let TlsTransport { sock, session } = t;
                let n = session.writer().write(buf)?;
                // The write above only buffered plaintext into the session;
                // without this, the ciphertext never reaches the wire.
                session.flush_outgoing(sock)?;
                Ok(n)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Plain(sock) => sock.flush(),
            Transport::Tls(t) => {
                let TlsTransport { sock, session } = t;
                session.writer().flush()?;
                session.flush_outgoing(sock)
            }
        }
    }
}
