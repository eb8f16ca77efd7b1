//! Recursive character splitter.
//!
//! Cuts at the coarsest boundary that fits inside `chunk_size` characters:
//! paragraph, then line, then sentence, then word, then a bare character
//! position. Every chunk is a contiguous slice of the input and the next chunk
//! restarts at most `chunk_overlap` characters before the previous one ended.

use std::ops::Range;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

const BOUNDARIES: &[&[&str]] = &[
    &["\n\n"],
    &["\n"],
    &[". ", "! ", "? "],
    &[" "],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be greater than zero".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn chunk_overlap(&self) -> usize { self.chunk_overlap }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_spans(text).into_iter().map(|span| text[span].to_string()).collect()
    }

    /// Byte ranges of the chunks `split` would return.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        if text.is_empty() {
            return spans;
        }
        let mut start = 0;
        let mut covered = 0;
        loop {
            let window_end = advance(text, start, self.chunk_size);
            if window_end == text.len() {
                spans.push(start..text.len());
                break;
            }
            let end = break_point(text, start, covered, window_end);
            spans.push(start..end);
            covered = end;
            start = self.overlap_start(text, start, end);
        }
        spans
    }

    fn overlap_start(&self, text: &str, start: usize, end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }
        let candidate = retreat(text, end, self.chunk_overlap);
        if candidate <= start {
            return end;
        }
        let at_word_start = text[..candidate].chars().next_back().map_or(true, char::is_whitespace);
        if at_word_start {
            return candidate;
        }
        // Prefer not to restart mid-word when the overlap window has a gap.
        let window = &text[candidate..end];
        match window.char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((i, c)) if candidate + i + c.len_utf8() < end => candidate + i + c.len_utf8(),
            _ => candidate,
        }
    }
}

/// Last boundary inside `text[start..window_end]` that moves past `covered`,
/// trying coarse separators first. Falls back to the window edge.
fn break_point(text: &str, start: usize, covered: usize, window_end: usize) -> usize {
    let window = &text[start..window_end];
    for level in BOUNDARIES {
        let best = level
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|i| start + i + sep.len()))
            .max();
        if let Some(point) = best {
            if point > covered {
                return point;
            }
        }
    }
    window_end
}

/// Byte offset `n` characters after `from`, clamped to the end of `text`.
fn advance(text: &str, from: usize, n: usize) -> usize {
    text[from..].char_indices().nth(n).map_or(text.len(), |(i, _)| from + i)
}

/// Byte offset `n` characters before `to`, clamped to 0.
fn retreat(text: &str, to: usize, n: usize) -> usize {
    if n == 0 {
        return to;
    }
    text[..to].char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i)
}
