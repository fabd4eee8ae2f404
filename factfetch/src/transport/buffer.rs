//! Accumulation buffer with tail-limited prompt search.
//!
//! Prompt markers only ever appear at the end of device output, so the
//! buffer searches just the last N bytes instead of rescanning the whole
//! accumulated output on every read.

use regex::bytes::Regex;

const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Accumulates session output and checks the tail for a prompt pattern.
#[derive(Debug)]
pub struct PromptBuffer {
    data: Vec<u8>,
    search_depth: usize,
}

impl PromptBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            data: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append newly read session data.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// True if `pattern` matches within the tail search window.
    pub fn tail_matches(&self, pattern: &Regex) -> bool {
        let start = self.data.len().saturating_sub(self.search_depth);
        pattern.is_match(&self.data[start..])
    }

    /// Take the accumulated contents, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for PromptBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}
