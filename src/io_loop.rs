//! The event-loop contract the stream consumes, and a concrete `mio`-backed
//! implementation of it.
//!
//! The distilled design treats the loop as an external collaborator and
//! only specifies four operations (`add_handler`, `update_handler`,
//! `remove_handler`, `add_callback`). [`IoLoop`] is that contract;
//! [`MioEventLoop`] is the runnable implementation this crate ships so the
//! stream is usable standalone and in tests, mirroring the reference
//! implementation's `TlsServerPrivate::connections_by_token` table keyed by
//! `mio::Token` plus its poll-then-dispatch main loop.
//!
//! Every `IoLoop` operation takes `&self`: registration and callback
//! scheduling are built on interior mutability (mirroring how
//! `mio::Registry` itself is designed to be registered from anywhere,
//! including from inside a callback the loop is currently running) so a
//! `Stream` can hold a [`std::rc::Weak`] back-reference to its loop — per
//! the data model's "`io_loop`: a back-reference to the event loop; never
//! owned" — without the cyclic-ownership/re-borrow hazards a `&mut`-based
//! contract would create once callbacks start scheduling more callbacks.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use mio::event::Source;
use mio::{Events, Interest as MioInterest, Poll, Registry, Token};

use crate::interest::Interest;

/// A registered readiness handler: typically a `Stream`, looked up by
/// `Token` and invoked with the readiness mask observed for its turn.
pub trait EventHandler {
    fn handle_events(&mut self, io: &dyn IoLoop, interest: Interest);
}

/// The four operations a stream consumes from its event loop. Kept as a
/// trait (rather than a concrete type) so tests can substitute a fake loop
/// that records calls instead of driving real sockets.
pub trait IoLoop {
    fn add_handler(
        &self,
        token: Token,
        source: &mut dyn Source,
        interest: Interest,
        handler: Rc<RefCell<dyn EventHandler>>,
    ) -> io::Result<()>;

    fn update_handler(&self, token: Token, source: &mut dyn Source, interest: Interest) -> io::Result<()>;

    fn remove_handler(&self, token: Token, source: &mut dyn Source) -> io::Result<()>;

    /// Schedules `cb` to run on a future loop turn. Never run synchronously.
    fn add_callback(&self, cb: Box<dyn FnOnce()>);

    /// Monotonically-increasing token allocation, mirroring the reference
    /// implementation's `next_id: AtomicUsize` (kept as a plain `Cell`
    /// here: the concurrency model is single-threaded cooperative, not
    /// shared across threads).
    fn next_token(&self) -> Token;
}

/// The `mio`-backed `IoLoop`. Owns the `Poll`, the event buffer, the
/// token -> handler table, and the FIFO callback queue, all behind
/// interior mutability so the trait above can be `&self`.
pub struct MioEventLoop {
    poll: RefCell<Poll>,
    events: RefCell<Events>,
    registry: Registry,
    handlers: RefCell<HashMap<Token, Rc<RefCell<dyn EventHandler>>>>,
    callbacks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    next_token: Cell<usize>,
}

impl MioEventLoop {
    pub fn new(event_capacity: usize) -> io::Result<Self> {
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        Ok(MioEventLoop {
            poll: RefCell::new(poll),
            events: RefCell::new(Events::with_capacity(event_capacity)),
            registry,
            handlers: RefCell::new(HashMap::new()),
            callbacks: RefCell::new(VecDeque::new()),
            next_token: Cell::new(0),
        })
    }

    fn to_mio_interest(interest: Interest) -> MioInterest {
        let mut mio_interest = None;
        if interest.contains(Interest::READ) || interest.contains(Interest::ERROR) {
            mio_interest = Some(MioInterest::READABLE);
        }
        if interest.contains(Interest::WRITE) {
            mio_interest = Some(match mio_interest {
                Some(existing) => existing.add(MioInterest::WRITABLE),
                None => MioInterest::WRITABLE,
            });
        }
        mio_interest.unwrap_or(MioInterest::READABLE)
    }

    /// Polls once, dispatches readiness to registered handlers in the
    /// order `mio` reports them, then drains the callback queue.
    ///
    /// Callbacks enqueued by a handler, or by a callback running during
    /// this same turn, are only drained on the *next* `run_once` call —
    /// this is what keeps `pending_callbacks` bookkeeping on `Stream`
    /// meaningful (§4.7).
    pub fn run_once(&self, timeout: Option<Duration>) -> io::Result<()> {
        {
            let mut poll = self.poll.borrow_mut();
            let mut events = self.events.borrow_mut();
            poll.poll(&mut events, timeout)?;
        }

        let ready: Vec<(Token, Interest)> = self
            .events
            .borrow()
            .iter()
            .map(|event| {
                let mut interest = Interest::NONE;
                if event.is_readable() {
                    interest |= Interest::READ;
                }
                if event.is_writable() {
                    interest |= Interest::WRITE;
                }
                if event.is_error() || event.is_read_closed() || event.is_write_closed() {
                    interest |= Interest::ERROR;
                }
                (event.token(), interest)
            })
            .collect();

        for (token, interest) in ready {
            let handler = {
                let handlers = self.handlers.borrow();
                match handlers.get(&token) {
                    Some(handler) => Rc::clone(handler),
                    None => continue,
                }
            };
            handler.borrow_mut().handle_events(self, interest);
        }

        self.drain_callbacks();
        Ok(())
    }

    fn drain_callbacks(&self) {
        let pending: Vec<_> = self.callbacks.borrow_mut().drain(..).collect();
        for cb in pending {
            cb();
        }
    }

    pub fn has_handlers(&self) -> bool {
        !self.handlers.borrow().is_empty()
    }

    pub fn pending_callback_count(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl IoLoop for MioEventLoop {
    fn add_handler(
        &self,
        token: Token,
        source: &mut dyn Source,
        interest: Interest,
        handler: Rc<RefCell<dyn EventHandler>>,
    ) -> io::Result<()> {
        self.registry
            .register(source, token, Self::to_mio_interest(interest))?;
        self.handlers.borrow_mut().insert(token, handler);
        Ok(())
    }

    fn update_handler(&self, token: Token, source: &mut dyn Source, interest: Interest) -> io::Result<()> {
        self.registry.reregister(source, token, Self::to_mio_interest(interest))
    }

    fn remove_handler(&self, token: Token, source: &mut dyn Source) -> io::Result<()> {
        self.handlers.borrow_mut().remove(&token);
        // A socket that errored out may already be gone from the OS's
        // perspective; a failed deregister here is not actionable.
        let _ = self.registry.deregister(source);
        Ok(())
    }

    fn add_callback(&self, cb: Box<dyn FnOnce()>) {
        self.callbacks.borrow_mut().push_back(cb);
    }

    fn next_token(&self) -> Token {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        Token(token)
    }
}
