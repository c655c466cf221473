//! Callback slots and the ambient-context captor.
//!
//! The reference implementation wraps every installed callback with
//! `stack_context.wrap`, an opaque transformation that captures ambient
//! context (exception handlers, thread-locals) so it can be restored when
//! the callback runs on a future event-loop turn. This crate externalizes
//! that behind [`StackContext`] so a caller embedding this crate inside a
//! larger framework can plug in their own context propagation without the
//! stream depending on it; [`NullContext`] is the identity transform used
//! when nothing needs to be captured.

use bytes::Bytes;

/// Fires once with the completed read payload.
pub type ReadCallback = Box<dyn FnOnce(Bytes)>;
/// Fires zero or more times with opportunistically-available chunks.
pub type StreamCallback = Box<dyn FnMut(Bytes)>;
/// Fires once when the write buffer fully drains.
pub type WriteCallback = Box<dyn FnOnce()>;
/// Fires once, exactly, when the stream becomes fully closed.
pub type CloseCallback = Box<dyn FnOnce()>;
/// Fires once on successful `connect()` completion.
pub type ConnectCallback = Box<dyn FnOnce()>;

/// An opaque transformation applied to a callback at the moment it is
/// installed, so it can be invoked later with whatever ambient context was
/// live at installation time.
pub trait StackContext {
    fn wrap(&self, cb: Box<dyn FnOnce()>) -> Box<dyn FnOnce()>;
}

/// The identity transform: installs callbacks with no ambient context.
/// Used by [`crate::stream::Stream::run_callback`] itself when scheduling
/// its own bookkeeping wrapper, so a context already captured by the
/// caller's callback is not re-captured (see §4.4).
pub struct NullContext;

impl StackContext for NullContext {
    fn wrap(&self, cb: Box<dyn FnOnce()>) -> Box<dyn FnOnce()> {
        cb
    }
}
