//! The readiness interest mask consumed from, and sent to, the event loop.

use bitflags::bitflags;

bitflags! {
    /// Bitwise union of READ/WRITE/ERROR readiness, exactly as registered
    /// with the event loop (invariant: when a stream is registered its
    /// mask always includes [`Interest::ERROR`]).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
    pub struct Interest: u8 {
        const NONE  = 0b000;
        const READ  = 0b001;
        const WRITE = 0b010;
        const ERROR = 0b100;
    }
}

impl Interest {
    /// The default registration used to keep a descriptor alive for
    /// hangup detection when nothing else is armed (§9, open question:
    /// preserved from the reference implementation).
    pub fn idle() -> Self {
        Interest::ERROR | Interest::READ
    }
}
