//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns,
//! rather than the entire output. For large outputs (a full running
//! config, a BGP table) this keeps prompt detection cheap.

use regex::{Match, Regex};

/// Buffer for accumulating output and searching its tail for prompts.
///
/// Incoming bytes pass through a `vte` parser so ANSI colour codes,
/// cursor movement and carriage returns never reach the buffer. The
/// parser is kept across calls, so an escape sequence split between two
/// reads is still removed.
pub struct PatternBuffer {
    /// The accumulated, printable output.
    buffer: String,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape-sequence parser state.
    parser: vte::Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: String::with_capacity(4096),
            search_depth,
            parser: vte::Parser::new(),
        }
    }

    /// Extend the buffer with raw channel data.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = Printable(&mut self.buffer);
        self.parser.advance(&mut sink, data);
    }

    /// Search only the tail of the buffer for the pattern.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Match<'_>> {
        pattern.find(self.tail())
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// The last line of the buffer, trimmed. This is where the prompt sits
    /// once a command has finished.
    pub fn last_line(&self) -> &str {
        let trimmed = self.buffer.trim_end();
        match trimmed.rfind('\n') {
            Some(pos) => trimmed[pos + 1..].trim(),
            None => trimmed.trim(),
        }
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    fn tail(&self) -> &str {
        let mut start = self.buffer.len().saturating_sub(self.search_depth);
        while !self.buffer.is_char_boundary(start) {
            start += 1;
        }
        &self.buffer[start..]
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// `vte` performer that keeps printable text, newlines and tabs.
struct Printable<'a>(&'a mut String);

impl vte::Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        self.0.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\t' => self.0.push(byte as char),
            // backspace
            0x08 => {
                self.0.pop();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.take(), "Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.take(), "Green text");
    }

    #[test]
    fn test_split_escape_sequence() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"before\x1b[3");
        buffer.extend(b"2mafter");
        assert_eq!(buffer.take(), "beforeafter");
    }

    #[test]
    fn test_carriage_returns_dropped() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"show clock\r\n10:00\r\nrouter#");
        assert_eq!(buffer.take(), "show clock\n10:00\nrouter#");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrouter#");

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        let mut buffer = PatternBuffer::new(3);
        buffer.extend("ééé#".as_bytes());
        let pattern = Regex::new(r"#$").unwrap();
        assert!(buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_last_line() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"configure\n[edit]\nuser@router# ");
        assert_eq!(buffer.last_line(), "user@router#");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), "test data");
        assert_eq!(buffer.last_line(), "");
        assert_eq!(buffer.take(), "");
    }
}
