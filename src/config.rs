//! Stream construction parameters.
//!
//! Mirrors the reference implementation's `configuration::Config` pattern
//! (a plain struct with a `Default` impl) scaled down to what this crate
//! actually needs; there is no CLI surface here since the stream is a
//! library primitive, not a standalone process.

/// Hard cap on the read buffer's total byte count.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 100 * 1024 * 1024;

/// Requested bytes per socket read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Write chunks larger than this are split on enqueue (a platform quirk:
/// some operating systems fail oversized `send` calls outright instead of
/// returning a short write).
pub const WRITE_CHUNK_SIZE: usize = 128 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub max_buffer_size: usize,
    pub read_chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl StreamConfig {
    pub fn new(max_buffer_size: usize, read_chunk_size: usize) -> Self {
        StreamConfig {
            max_buffer_size,
            read_chunk_size,
        }
    }
}
