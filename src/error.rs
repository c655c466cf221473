//! The stream's error taxonomy.
//!
//! One `Fail` struct per kind named in the error handling design, in the
//! reference implementation's own idiom (`failure::Fail` derives plus a
//! `Fallible<T>` alias), rather than a grab-bag of strings.

use std::io;

use failure::Fail;

/// `Result` alias used throughout the crate, mirroring the reference
/// implementation's `Fallible<T>`.
pub type Fallible<T> = Result<T, StreamError>;

#[derive(Debug, Fail)]
pub enum StreamError {
    #[fail(display = "stream is already closed")]
    AlreadyClosed,

    #[fail(display = "a read is already armed; complete or cancel it before arming another")]
    DoubleRead,

    #[fail(
        display = "read buffer exceeded max_buffer_size ({} >= {} bytes)",
        size, max
    )]
    BufferOverflow { size: usize, max: usize },

    #[fail(display = "invalid delimiter/regex read argument: {}", detail)]
    InvalidArgument { detail: String },

    #[fail(display = "TLS handshake failed{}: {}", peer, detail)]
    TlsHandshake { detail: String, peer: String },

    #[fail(display = "I/O error: {}", _0)]
    Io(#[fail(cause)] io::Error),

    #[fail(display = "invalid regular expression: {}", _0)]
    Regex(#[fail(cause)] regex::Error),
}

impl StreamError {
    /// Formats the optional peer descriptor used by [`StreamError::TlsHandshake`]'s
    /// `Display` impl (`" with <peer>"` or empty).
    pub fn peer_suffix(peer: Option<&str>) -> String {
        match peer {
            Some(p) => format!(" with {}", p),
            None => String::new(),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<regex::Error> for StreamError {
    fn from(e: regex::Error) -> Self {
        StreamError::Regex(e)
    }
}
