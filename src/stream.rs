//! The stream state machine: registration bookkeeping, the armed read
//! mode, the write queue, and the TLS overlay, all folded into one type
//! the way the reference implementation's `Connection` folds its
//! low-level socket handling into one struct rather than layering
//! decorators.
//!
//! A `Stream` is always reached through `Rc<RefCell<Stream>>`: the event
//! loop owns that `Rc` (keyed by its `Token`, mirroring
//! `TlsServerPrivate::connections_by_token`), and the stream itself holds
//! only a [`Weak`] clone of its own handle — enough to re-enter itself
//! from a deferred callback — plus a [`Weak`] back-reference to the loop
//! it is registered with. Neither side holds a strong cycle.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use bytes::Bytes;
use mio::Token;
use regex::bytes::Regex;
use rustls_pki_types::ServerName;

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::callback::{CloseCallback, ConnectCallback, ReadCallback, StreamCallback, WriteCallback};
use crate::config::{StreamConfig, WRITE_CHUNK_SIZE};
use crate::error::{Fallible, StreamError};
use crate::interest::Interest;
use crate::io_loop::{EventHandler, IoLoop};
use crate::read_mode::ReadMode;
use crate::tls::{drive_handshake, HandshakeOutcome, TlsSession};
use crate::transport::{Transport, TlsTransport};

/// A non-blocking, buffered byte stream over a single socket.
pub struct Stream {
    io_loop: Weak<dyn IoLoop>,
    self_handle: Weak<RefCell<Stream>>,
    token: Option<Token>,
    transport: Option<Transport>,
    config: StreamConfig,

    read_buffer: ReadBuffer,
    write_buffer: WriteBuffer,
    read_mode: ReadMode,

    read_callback: Option<ReadCallback>,
    stream_callback: Option<StreamCallback>,
    write_callback: Option<WriteCallback>,
    close_callback: Option<CloseCallback>,
    connect_callback: Option<ConnectCallback>,

    connecting: bool,
    registered_interest: Option<Interest>,
    pending_callbacks: u32,
    error: Option<StreamError>,

    // TLS overlay state; inert for a plain stream.
    ssl_accepting: bool,
    handshake_reading: bool,
    handshake_writing: bool,
    ssl_connect_callback: Option<ConnectCallback>,
    pending_tls_client: Option<(Arc<rustls::ClientConfig>, ServerName<'static>)>,
}

impl Stream {
    /// Wraps `transport` (already connected, accepted, or mid-connect) as
    /// a stream registered against `io_loop`. Returns the `Rc` the loop
    /// should key its handler table on.
    pub fn new(transport: Transport, io_loop: Weak<dyn IoLoop>, config: StreamConfig) -> Rc<RefCell<Stream>> {
        let stream = Stream {
            io_loop,
            self_handle: Weak::new(),
            token: None,
            transport: Some(transport),
            config,
            read_buffer: ReadBuffer::new(),
            write_buffer: WriteBuffer::new(),
            read_mode: ReadMode::Idle,
            read_callback: None,
            stream_callback: None,
            write_callback: None,
            close_callback: None,
            connect_callback: None,
            connecting: false,
            registered_interest: None,
            pending_callbacks: 0,
            error: None,
            ssl_accepting: false,
            handshake_reading: false,
            handshake_writing: false,
            ssl_connect_callback: None,
            pending_tls_client: None,
        };
        let rc = Rc::new(RefCell::new(stream));
        rc.borrow_mut().self_handle = Rc::downgrade(&rc);
        rc
    }

    // ---- state predicates (§6) ----------------------------------------

    pub fn closed(&self) -> bool {
        self.transport.is_none()
    }

    pub fn reading(&self) -> bool {
        !self.read_mode.is_idle() || self.handshake_reading
    }

    pub fn writing(&self) -> bool {
        !self.write_buffer.is_empty() || self.handshake_writing
    }

    /// The last observed failure cause, if any (§3, `error`).
    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    // ---- public operations (§6) ----------------------------------------

    /// Arms the completion watch for a non-blocking connect. The connect
    /// itself is initiated by `mio::net::TcpStream::connect` when the
    /// transport was built; this only watches for writability and checks
    /// `SO_ERROR`, per the reference implementation's split between
    /// socket creation and connect-completion handling.
    pub fn connect(&mut self, cb: Option<ConnectCallback>) -> Fallible<()> {
        if self.closed() {
            return Err(StreamError::AlreadyClosed);
        }
        self.connecting = true;
        self.connect_callback = cb;
        self.add_io_state(Interest::WRITE);
        Ok(())
    }

    /// Like [`Stream::connect`], but negotiates TLS as the client side
    /// once the underlying TCP connect completes (§4.6, "Connect
    /// integration").
    pub fn connect_tls(
        &mut self,
        tls_config: Arc<rustls::ClientConfig>,
        server_name: ServerName<'static>,
        cb: Option<ConnectCallback>,
    ) -> Fallible<()> {
        if self.closed() {
            return Err(StreamError::AlreadyClosed);
        }
        self.pending_tls_client = Some((tls_config, server_name));
        self.connecting = true;
        self.connect_callback = cb;
        self.add_io_state(Interest::WRITE);
        Ok(())
    }

    /// Begins a server-side TLS handshake over an already-accepted plain
    /// socket, replacing the transport in place (§4.6).
    pub fn accept_tls(&mut self, server_config: Arc<rustls::ServerConfig>) -> Fallible<()> {
        let sock = match self.transport.take() {
            Some(Transport::Plain(sock)) => sock,
            other => {
                self.transport = other;
                return Err(StreamError::InvalidArgument {
                    detail: "accept_tls requires a plain, not-yet-wrapped transport".to_string(),
                });
            }
        };
        let session = TlsSession::new_server(server_config)?;
        self.transport = Some(Transport::Tls(TlsTransport { sock, session }));
        self.ssl_accepting = true;
        self.do_ssl_handshake();
        if self.closed() {
            return Ok(());
        }
        let want = if self.handshake_writing { Interest::WRITE } else { Interest::READ };
        self.add_io_state(want);
        Ok(())
    }

    pub fn read_until_regex(&mut self, pattern: Regex, cb: ReadCallback) -> Fallible<()> {
        self.arm_read(ReadMode::UntilRegex(pattern), cb, None)
    }

    pub fn read_until(&mut self, delimiter: Bytes, cb: ReadCallback) -> Fallible<()> {
        if delimiter.is_empty() {
            return Err(StreamError::InvalidArgument {
                detail: "read_until delimiter must be non-empty".to_string(),
            });
        }
        self.arm_read(ReadMode::UntilDelimiter(delimiter), cb, None)
    }

    pub fn read_bytes(&mut self, n: u64, cb: ReadCallback, stream_cb: Option<StreamCallback>) -> Fallible<()> {
        if n == 0 {
            return Err(StreamError::InvalidArgument {
                detail: "read_bytes requires n > 0".to_string(),
            });
        }
        self.arm_read(ReadMode::ExactCount(n), cb, stream_cb)
    }

    /// Delivers all remaining bytes until EOF. If the stream is already
    /// closed, the buffered tail is delivered synchronously on the loop's
    /// next turn without registering interest (§4.2, §8 scenario 4).
    pub fn read_until_close(&mut self, cb: ReadCallback, stream_cb: Option<StreamCallback>) -> Fallible<()> {
        if self.closed() {
            let payload = self.read_buffer.take_all();
            let completion_payload = match stream_cb {
                Some(mut scb) => {
                    scb(payload);
                    Bytes::new()
                }
                None => payload,
            };
            match self.io_loop.upgrade() {
                Some(io) => io.add_callback(Box::new(move || cb(completion_payload))),
                None => cb(completion_payload),
            }
            return Ok(());
        }
        self.arm_read(ReadMode::UntilClose, cb, stream_cb)
    }

    pub fn write(&mut self, data: Bytes, cb: Option<WriteCallback>) -> Fallible<()> {
        if self.closed() {
            return Err(StreamError::AlreadyClosed);
        }
        self.write_buffer.push_split(data, WRITE_CHUNK_SIZE);
        self.write_callback = cb;
        if !self.connecting {
            self.handle_write();
            if !self.closed() && !self.write_buffer.is_empty() {
                self.add_io_state(Interest::WRITE);
            }
        }
        Ok(())
    }

    pub fn set_close_callback(&mut self, cb: CloseCallback) {
        self.close_callback = Some(cb);
        if self.closed() {
            self.maybe_run_close_callback();
        }
    }

    /// Idempotent teardown (§4.5).
    pub fn close(&mut self) {
        if self.transport.is_some() {
            if matches!(self.read_mode, ReadMode::UntilClose) {
                let payload = self.read_buffer.take_all();
                self.read_mode = ReadMode::Idle;
                let completion_payload = match self.stream_callback.take() {
                    Some(mut scb) => {
                        scb(payload);
                        Bytes::new()
                    }
                    None => payload,
                };
                if let Some(cb) = self.read_callback.take() {
                    cb(completion_payload);
                }
            }
            if let (Some(io), Some(token)) = (self.io_loop.upgrade(), self.token) {
                if let Some(transport) = self.transport.as_mut() {
                    let _ = io.remove_handler(token, transport.as_source());
                }
            }
            self.registered_interest = None;
            self.transport = None;
        }
        self.maybe_run_close_callback();
    }

    // ---- read engine (§4.2) --------------------------------------------

    fn arm_read(&mut self, mode: ReadMode, cb: ReadCallback, stream_cb: Option<StreamCallback>) -> Fallible<()> {
        if self.closed() {
            return Err(StreamError::AlreadyClosed);
        }
        if !self.read_mode.is_idle() {
            return Err(StreamError::DoubleRead);
        }
        self.read_mode = mode;
        self.read_callback = Some(cb);
        self.stream_callback = stream_cb;
        self.inline_drain_read();
        Ok(())
    }

    fn inline_drain_read(&mut self) {
        if self.try_dispatch_read() {
            return;
        }
        self.pending_callbacks += 1;
        loop {
            match self.read_to_buffer() {
                DrainOutcome::Read(_) => continue,
                DrainOutcome::WouldBlock | DrainOutcome::Closed => break,
            }
        }
        self.pending_callbacks -= 1;
        if self.closed() {
            self.maybe_run_close_callback();
            return;
        }
        if !self.try_dispatch_read() {
            self.add_io_state(Interest::READ);
        }
    }

    /// One `read_chunk_size` read. Closes the stream itself on EOF,
    /// overflow, or a hard socket error — there is no per-call error
    /// channel (§7, "Propagation").
    fn read_to_buffer(&mut self) -> DrainOutcome {
        let transport = match self.transport.as_mut() {
            Some(t) => t,
            None => return DrainOutcome::Closed,
        };
        let mut buf = vec![0u8; self.config.read_chunk_size];
        match transport.read(&mut buf) {
            Ok(0) => {
                debug!("remote end closed the connection");
                self.close();
                DrainOutcome::Closed
            }
            Ok(n) => {
                buf.truncate(n);
                self.read_buffer.push(Bytes::from(buf));
                if self.read_buffer.len() >= self.config.max_buffer_size {
                    let err = StreamError::BufferOverflow {
                        size: self.read_buffer.len(),
                        max: self.config.max_buffer_size,
                    };
                    error!("{}", err);
                    self.error = Some(err);
                    self.close();
                    return DrainOutcome::Closed;
                }
                DrainOutcome::Read(n)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => DrainOutcome::WouldBlock,
            Err(e) => {
                let err = StreamError::Io(e);
                error!("socket read error: {}", err);
                self.error = Some(err);
                self.close();
                DrainOutcome::Closed
            }
        }
    }

    /// Tries to satisfy the armed read mode from the buffer, opportunistically
    /// draining to the streaming callback first. Returns whether the
    /// completion callback fired.
    fn try_dispatch_read(&mut self) -> bool {
        if let Some(chunk) = self.opportunistic_stream_chunk() {
            // Deferred through the loop, same as the completion callback,
            // so a callback that re-enters the stream can't observe it
            // mid-dispatch (§4.4).
            self.run_callback(move |stream| {
                if let Some(cb) = stream.stream_callback.as_mut() {
                    cb(chunk);
                }
            });
        }

        match &self.read_mode {
            ReadMode::Idle | ReadMode::UntilClose => false,
            ReadMode::ExactCount(n) => {
                let n = *n as usize;
                if self.read_buffer.len() >= n {
                    let payload = self.read_buffer.take_prefix(n);
                    self.complete_read(payload);
                    true
                } else {
                    false
                }
            }
            ReadMode::UntilDelimiter(_) | ReadMode::UntilRegex(_) => self.try_pattern_dispatch(),
        }
    }

    /// Drains whatever bytes the exact-count read still needs (or
    /// everything buffered, for the other streaming modes) to the
    /// streaming callback, capping at the remaining count so the
    /// completion callback later receives exactly the leftover (possibly
    /// empty) payload (§4.2, §8 law for `read_bytes(n, …, stream)`).
    fn opportunistic_stream_chunk(&mut self) -> Option<Bytes> {
        if self.stream_callback.is_none() || self.read_buffer.is_empty() {
            return None;
        }
        let available = self.read_buffer.len();
        let cap = match &self.read_mode {
            ReadMode::ExactCount(n) => available.min(*n as usize),
            _ => available,
        };
        if cap == 0 {
            return None;
        }
        let chunk = self.read_buffer.take_prefix(cap);
        if let ReadMode::ExactCount(n) = &mut self.read_mode {
            *n -= chunk.len() as u64;
        }
        Some(chunk)
    }

    /// Shared delimiter/regex search over the coalesced first chunk,
    /// growing the search window with `double_prefix` when the pattern
    /// isn't found and more data is buffered (§4.2).
    fn try_pattern_dispatch(&mut self) -> bool {
        loop {
            let take = match &self.read_mode {
                ReadMode::UntilDelimiter(delim) => self
                    .read_buffer
                    .first_chunk()
                    .and_then(|chunk| find_subslice(chunk, delim))
                    .map(|loc| loc + self.delimiter_len()),
                ReadMode::UntilRegex(re) => self
                    .read_buffer
                    .first_chunk()
                    .and_then(|chunk| re.find(chunk).map(|m| m.end())),
                _ => unreachable!("only called while a pattern mode is armed"),
            };
            if let Some(take) = take {
                let payload = self.read_buffer.take_prefix(take);
                self.complete_read(payload);
                return true;
            }
            if self.read_buffer.num_chunks() > 1 {
                self.read_buffer.double_prefix();
                continue;
            }
            return false;
        }
    }

    fn delimiter_len(&self) -> usize {
        match &self.read_mode {
            ReadMode::UntilDelimiter(delim) => delim.len(),
            _ => 0,
        }
    }

    fn complete_read(&mut self, payload: Bytes) {
        self.read_mode = ReadMode::Idle;
        self.stream_callback = None;
        if let Some(cb) = self.read_callback.take() {
            self.run_callback(move |_stream| cb(payload));
        }
    }

    // ---- write engine (§4.3) -------------------------------------------

    fn handle_write(&mut self) {
        if self.ssl_accepting {
            self.do_ssl_handshake();
            return;
        }
        loop {
            if self.write_buffer.is_empty() {
                break;
            }
            self.write_buffer.cap_front(WRITE_CHUNK_SIZE);
            let chunk = match self.write_buffer.front() {
                Some(c) => c.clone(),
                None => break,
            };
            let transport = match self.transport.as_mut() {
                Some(t) => t,
                None => return,
            };
            match transport.write(&chunk) {
                Ok(0) => {
                    self.write_buffer.frozen = true;
                    break;
                }
                Ok(n) => {
                    self.write_buffer.consume_front(n);
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.write_buffer.frozen = true;
                    break;
                }
                Err(e) => {
                    let err = StreamError::Io(e);
                    error!("socket write error: {}", err);
                    self.error = Some(err);
                    self.close();
                    return;
                }
            }
        }
        if self.write_buffer.is_empty() {
            if let Some(cb) = self.write_callback.take() {
                self.run_callback(move |_stream| cb());
            }
        }
    }

    // ---- event dispatcher (§4.4) ----------------------------------------

    fn handle_read(&mut self) {
        if self.ssl_accepting {
            self.do_ssl_handshake();
            return;
        }
        loop {
            match self.read_to_buffer() {
                DrainOutcome::Read(_) => continue,
                DrainOutcome::WouldBlock | DrainOutcome::Closed => break,
            }
        }
        if self.closed() {
            return;
        }
        if !self.try_dispatch_read() {
            self.maybe_run_close_callback();
        }
    }

    fn handle_connect(&mut self) {
        let outcome = match self.transport.as_ref() {
            Some(t) => t.so_error(),
            None => return,
        };
        match outcome {
            Ok(None) => {
                self.connecting = false;
                if let Some((config, name)) = self.pending_tls_client.take() {
                    self.swap_in_tls_client(config, name);
                } else if let Some(cb) = self.connect_callback.take() {
                    self.run_callback(move |_stream| cb());
                }
            }
            Ok(Some(e)) | Err(e) => {
                error!("connect failed: {}", e);
                self.error = Some(StreamError::Io(e));
                self.close();
            }
        }
    }

    /// Replaces the plain transport with a TLS-wrapped one around the
    /// same socket, synchronously, then kicks off the handshake — the
    /// dispatcher calls `handle_write` right after this returns and must
    /// observe the TLS transport already in place (§4.6).
    fn swap_in_tls_client(&mut self, config: Arc<rustls::ClientConfig>, server_name: ServerName<'static>) {
        let sock = match self.transport.take() {
            Some(Transport::Plain(sock)) => sock,
            other => {
                self.transport = other;
                return;
            }
        };
        match TlsSession::new_client(config, server_name) {
            Ok(session) => {
                self.transport = Some(Transport::Tls(TlsTransport { sock, session }));
                self.ssl_accepting = true;
                self.ssl_connect_callback = self.connect_callback.take();
                self.do_ssl_handshake();
            }
            Err(e) => {
                error!("TLS client setup failed: {}", e);
                self.error = Some(e);
                self.close();
            }
        }
    }

    /// One handshake step (§4.6). Invoked in place of the normal read/write
    /// path while `ssl_accepting`.
    fn do_ssl_handshake(&mut self) {
        self.handshake_reading = false;
        self.handshake_writing = false;
        let peer = self.peer_desc();
        let outcome = match self.transport.as_mut() {
            Some(Transport::Tls(t)) => drive_handshake(t, &peer),
            _ => return,
        };
        match outcome {
            Ok(HandshakeOutcome::NeedsRead) => self.handshake_reading = true,
            Ok(HandshakeOutcome::NeedsWrite) => self.handshake_writing = true,
            Ok(HandshakeOutcome::Complete) => {
                self.ssl_accepting = false;
                if let Some(cb) = self.ssl_connect_callback.take() {
                    self.run_callback(move |_stream| cb());
                }
            }
            Err(e) => {
                error!("{}", e);
                self.error = Some(e);
                self.close();
            }
        }
    }

    fn peer_desc(&self) -> String {
        self.transport
            .as_ref()
            .and_then(|t| t.peer_addr().ok())
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown peer".to_string())
    }

    /// Registers (if not yet registered) or widens the registered
    /// interest mask. A no-op once the stream is closed (§4.4).
    fn add_io_state(&mut self, extra: Interest) {
        if self.closed() {
            return;
        }
        let io = match self.io_loop.upgrade() {
            Some(io) => io,
            None => return,
        };
        match self.registered_interest {
            None => {
                let interest = Interest::ERROR | extra;
                let token = io.next_token();
                let transport = self.transport.as_mut().expect("checked open above");
                match io.add_handler(token, transport.as_source(), interest, self.handler_rc()) {
                    Ok(()) => {
                        self.token = Some(token);
                        self.registered_interest = Some(interest);
                    }
                    Err(e) => {
                        error!("failed to register with event loop: {}", e);
                        self.error = Some(StreamError::Io(e));
                        self.close();
                    }
                }
            }
            Some(current) if !current.contains(extra) => {
                let new_interest = current | extra;
                if let Some(token) = self.token {
                    let transport = self.transport.as_mut().expect("checked open above");
                    if let Err(e) = io.update_handler(token, transport.as_source(), new_interest) {
                        error!("failed to widen registered interest: {}", e);
                        self.error = Some(StreamError::Io(e));
                        self.close();
                        return;
                    }
                }
                self.registered_interest = Some(new_interest);
            }
            _ => {}
        }
    }

    fn recompute_interest(&mut self) {
        if self.closed() {
            return;
        }
        let mut interest = Interest::ERROR;
        if self.reading() {
            interest |= Interest::READ;
        }
        if self.writing() {
            interest |= Interest::WRITE;
        }
        if interest == Interest::ERROR {
            // Keep the descriptor registered so a peer close is still
            // observed even with nothing explicitly armed (§9, decided).
            interest = Interest::idle();
        }
        if self.registered_interest != Some(interest) {
            if let (Some(io), Some(token)) = (self.io_loop.upgrade(), self.token) {
                let transport = self.transport.as_mut().expect("checked open above");
                if let Err(e) = io.update_handler(token, transport.as_source(), interest) {
                    error!("failed to update registered interest: {}", e);
                }
            }
            self.registered_interest = Some(interest);
        }
    }

    fn handler_rc(&self) -> Rc<RefCell<dyn EventHandler>> {
        let handle: Rc<RefCell<Stream>> = self
            .self_handle
            .upgrade()
            .expect("Stream::new always wraps the stream in an Rc before use");
        handle
    }

    /// Defers `close()` to the next loop turn rather than running it
    /// synchronously, so callbacks scheduled by `handle_read`/`handle_write`
    /// earlier in the same dispatch still observe the not-yet-closed state
    /// (§4.4, step 4).
    fn schedule_close(&mut self) {
        match self.io_loop.upgrade() {
            Some(io) => {
                let handle = self.self_handle.clone();
                io.add_callback(Box::new(move || {
                    if let Some(rc) = handle.upgrade() {
                        rc.borrow_mut().close();
                    }
                }));
            }
            None => self.close(),
        }
    }

    // ---- lifecycle / callback scheduling (§4.4, §4.5) -------------------

    /// Schedules `action` on the event loop, bumping `pending_callbacks`
    /// for the duration so a close observed mid-flight doesn't fire the
    /// close callback out from under in-flight work (§4.4). Uses no
    /// ambient-context wrapping: a caller-installed context, if any, was
    /// already captured by the boxed callback itself.
    fn run_callback<F>(&mut self, action: F)
    where
        F: FnOnce(&mut Stream) + 'static,
    {
        let io = match self.io_loop.upgrade() {
            Some(io) => io,
            None => {
                // No loop to defer to; run inline rather than drop the callback.
                action(self);
                self.maybe_add_error_listener();
                return;
            }
        };
        self.pending_callbacks += 1;
        let handle = self.self_handle.clone();
        io.add_callback(Box::new(move || {
            if let Some(rc) = handle.upgrade() {
                let mut stream = rc.borrow_mut();
                stream.pending_callbacks -= 1;
                action(&mut stream);
                stream.maybe_add_error_listener();
            }
        }));
    }

    fn maybe_add_error_listener(&mut self) {
        if self.registered_interest.is_none() && self.pending_callbacks == 0 {
            if self.closed() {
                self.maybe_run_close_callback();
            } else {
                self.add_io_state(Interest::READ);
            }
        }
    }

    fn maybe_run_close_callback(&mut self) {
        if self.closed() && self.pending_callbacks == 0 {
            if let Some(cb) = self.close_callback.take() {
                cb();
            }
        }
    }
}

impl EventHandler for Stream {
    fn handle_events(&mut self, _io: &dyn IoLoop, interest: Interest) {
        if self.closed() {
            debug!("readiness event for an already-closed stream; ignoring");
            return;
        }

        if interest.contains(Interest::READ) {
            self.handle_read();
            if self.closed() {
                return;
            }
        }

        if interest.contains(Interest::WRITE) {
            if self.connecting {
                self.handle_connect();
            }
            if self.closed() {
                return;
            }
            self.handle_write();
            if self.closed() {
                return;
            }
        }

        if interest.contains(Interest::ERROR) {
            if let Some(transport) = self.transport.as_ref() {
                if let Ok(Some(e)) = transport.so_error() {
                    error!("socket error: {}", e);
                    self.error = Some(StreamError::Io(e));
                }
            }
            self.schedule_close();
            return;
        }

        self.recompute_interest();
    }
}

enum DrainOutcome {
    WouldBlock,
    Closed,
    Read(usize),
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
