//! The armed read mode, reshaped from four nullable fields in the
//! reference implementation into a single tagged variant so "at most one
//! mode armed" becomes a type invariant instead of a runtime one.

use bytes::Bytes;
use regex::bytes::Regex;

pub enum ReadMode {
    Idle,
    UntilDelimiter(Bytes),
    UntilRegex(Regex),
    ExactCount(u64),
    UntilClose,
}

impl ReadMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, ReadMode::Idle)
    }
}

impl Default for ReadMode {
    fn default() -> Self {
        ReadMode::Idle
    }
}
