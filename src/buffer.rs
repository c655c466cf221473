//! Sliced-prefix merging and doubling over a deque of byte chunks.
//!
//! These two functions are the sole mutation primitives over the buffered
//! chunk lists; every read/write splice in [`crate::stream`] goes through
//! them. Ported from the reference implementation's `_merge_prefix` /
//! `_double_prefix`, which operate the same way over a `collections.deque`
//! of byte strings.

use std::cmp;
use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

/// Ensures the first element of `deque` is exactly `size` bytes long (or
/// the deque's total length if that is shorter). Short-circuits when the
/// deque already holds a single chunk no longer than `size`.
pub fn merge_prefix(deque: &mut VecDeque<Bytes>, size: usize) {
    if deque.len() == 1 && deque[0].len() <= size {
        return;
    }

    let mut prefix: Vec<Bytes> = Vec::new();
    let mut remaining = size;
    while !deque.is_empty() && remaining > 0 {
        let mut chunk = deque.pop_front().expect("checked non-empty above");
        if chunk.len() > remaining {
            let tail = chunk.split_off(remaining);
            deque.push_front(tail);
        }
        remaining -= chunk.len();
        prefix.push(chunk);
    }

    let merged = match prefix.len() {
        0 => Bytes::new(),
        1 => prefix.pop().expect("len checked"),
        _ => {
            let mut buf = BytesMut::with_capacity(prefix.iter().map(Bytes::len).sum());
            for chunk in prefix {
                buf.extend_from_slice(&chunk);
            }
            buf.freeze()
        }
    };
    deque.push_front(merged);
}

/// Grows the search window for a delimiter/regex scan without
/// fragmenting a too-small second chunk: `new_len = max(2*len(c0), len(c0)
/// + len(c1))`, then `merge_prefix(deque, new_len)`.
pub fn double_prefix(deque: &mut VecDeque<Bytes>) {
    if deque.is_empty() {
        return;
    }
    let first_len = deque[0].len();
    let new_len = if deque.len() >= 2 {
        cmp::max(2 * first_len, first_len + deque[1].len())
    } else {
        cmp::max(2 * first_len, 1)
    };
    merge_prefix(deque, new_len);
}

/// The read buffer: an ordered sequence of byte chunks plus a running
/// size counter (invariant: `size == chunks.iter().map(Bytes::len).sum()`).
#[derive(Default)]
pub struct ReadBuffer {
    chunks: VecDeque<Bytes>,
    size: usize,
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn first_chunk(&self) -> Option<&Bytes> {
        self.chunks.front()
    }

    /// Appends freshly-read bytes and bumps the size counter.
    pub fn push(&mut self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        self.size += data.len();
        self.chunks.push_back(data);
    }

    pub fn double_prefix(&mut self) {
        double_prefix(&mut self.chunks);
    }

    /// Splices exactly `min(size, self.len())` bytes off the front and
    /// returns them, decrementing the size counter to match.
    pub fn take_prefix(&mut self, size: usize) -> Bytes {
        if self.chunks.is_empty() {
            return Bytes::new();
        }
        merge_prefix(&mut self.chunks, size);
        let chunk = self.chunks.pop_front().unwrap_or_default();
        self.size -= chunk.len();
        chunk
    }

    /// Concatenates and removes every buffered byte (used for until-close
    /// delivery, both mid-stream and at synchronous close-time delivery).
    pub fn take_all(&mut self) -> Bytes {
        let total = self.size;
        self.take_prefix(total)
    }
}

/// The write buffer: an ordered sequence of byte chunks, any of which may
/// exceed [`crate::config::WRITE_CHUNK_SIZE`] only transiently (enqueue
/// always splits) and a `frozen` flag honoring the TLS "resubmit the
/// identical chunk" invariant (§4.3).
#[derive(Default)]
pub struct WriteBuffer {
    chunks: VecDeque<Bytes>,
    pub frozen: bool,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Splits `data` into `crate::config::WRITE_CHUNK_SIZE`-sized pieces
    /// and appends them.
    pub fn push_split(&mut self, mut data: Bytes, chunk_size: usize) {
        if data.is_empty() {
            return;
        }
        while data.len() > chunk_size {
            let tail = data.split_off(chunk_size);
            self.chunks.push_back(data);
            data = tail;
        }
        self.chunks.push_back(data);
    }

    /// Shrinks the first chunk to at most `max_send` bytes, unless frozen
    /// (a send attempt is in flight against the current front chunk).
    pub fn cap_front(&mut self, max_send: usize) {
        if !self.frozen {
            merge_prefix(&mut self.chunks, max_send);
        }
    }

    pub fn front(&self) -> Option<&Bytes> {
        self.chunks.front()
    }

    /// Marks the first `written` bytes of the front chunk as sent and
    /// removes them, leaving any residue as the new front chunk.
    pub fn consume_front(&mut self, written: usize) {
        merge_prefix(&mut self.chunks, written);
        self.chunks.pop_front();
        self.frozen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deque(chunks: &[&str]) -> VecDeque<Bytes> {
        chunks
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    fn strs(deque: &VecDeque<Bytes>) -> Vec<String> {
        deque
            .iter()
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn merge_prefix_walks_through_the_spec_scenario() {
        let mut d = deque(&["abc", "de", "fghi", "j"]);

        merge_prefix(&mut d, 5);
        assert_eq!(strs(&d), vec!["abcde", "fghi", "j"]);

        merge_prefix(&mut d, 7);
        assert_eq!(strs(&d), vec!["abcdefg", "hi", "j"]);

        merge_prefix(&mut d, 3);
        assert_eq!(strs(&d), vec!["abc", "defg", "hi", "j"]);

        merge_prefix(&mut d, 100);
        assert_eq!(strs(&d), vec!["abcdefghij"]);
    }

    #[test]
    fn merge_prefix_on_empty_deque_pushes_an_empty_chunk() {
        let mut d: VecDeque<Bytes> = VecDeque::new();
        merge_prefix(&mut d, 5);
        assert_eq!(d.len(), 1);
        assert!(d[0].is_empty());
    }

    #[test]
    fn merge_prefix_short_circuits_single_short_chunk() {
        let mut d = deque(&["ab"]);
        merge_prefix(&mut d, 100);
        // short-circuited: not padded, not touched
        assert_eq!(strs(&d), vec!["ab"]);
    }

    #[test]
    fn double_prefix_prefers_twice_the_first_chunk() {
        let mut d = deque(&["ab", "cdefgh"]);
        double_prefix(&mut d);
        // new_len = max(2*2, 2+6) = 8
        assert_eq!(strs(&d), vec!["abcdefgh"]);
    }

    #[test]
    fn double_prefix_doubles_when_first_chunk_dominates() {
        let mut d = deque(&["abcdef", "gh"]);
        double_prefix(&mut d);
        // new_len = max(2*6, 6+2) = 12, but only 8 bytes total available
        assert_eq!(strs(&d), vec!["abcdefgh"]);
    }

    #[test]
    fn law_merge_prefix_then_take_equals_original_prefix() {
        let original = "the quick brown fox jumps";
        let mut d = deque(&["the qu", "ick br", "own fox jumps"]);
        merge_prefix(&mut d, 9);
        assert_eq!(&d[0][..], &original.as_bytes()[..9]);
        let rest: Vec<u8> = d.iter().skip(1).flat_map(|b| b.to_vec()).collect();
        assert_eq!(rest, original.as_bytes()[9..].to_vec());
    }
}
