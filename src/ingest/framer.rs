//! # Line Framer
//!
//! Reassembles CR-terminated telemetry lines from arbitrary byte chunks.
//!
//! Serial reads deliver whatever happens to be in the driver buffer, so a
//! frame can arrive split across reads or glued to its neighbours. The
//! framer keeps the unterminated tail between pushes; a disconnect
//! mid-line therefore never desynchronizes framing — the partial line is
//! either completed by the next read or discarded on reconnect.

use tracing::debug;

/// Maximum bytes buffered while waiting for a terminator
///
/// A healthy frame is under 120 bytes; anything past this is line noise
/// and the buffer is dropped to resynchronize.
const MAX_PENDING_BYTES: usize = 4096;

/// Accumulates raw bytes and yields complete telemetry lines
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes, returning every line completed by it
    ///
    /// Lines are terminated by CR; a trailing LF from CRLF devices is
    /// tolerated. Non-UTF-8 lines are dropped with a diagnostic.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\r') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let terminated = &raw[..raw.len() - 1];

            // Swallow the LF half of a CRLF terminator
            if self.pending.first() == Some(&b'\n') {
                self.pending.remove(0);
            }

            match std::str::from_utf8(terminated) {
                Ok(line) if !line.trim().is_empty() => lines.push(line.to_string()),
                Ok(_) => {} // blank keep-alive line
                Err(e) => debug!("dropping non-UTF-8 line: {}", e),
            }
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            debug!(
                "dropping {} unterminated bytes to resynchronize",
                self.pending.len()
            );
            self.pending.clear();
        }

        lines
    }

    /// Discard any buffered partial line (used across reconnects)
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"1,2,3\r");
        assert_eq!(lines, vec!["1,2,3"]);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"12.5,58,14:").is_empty());
        assert!(framer.push(b"06:14,23.0").is_empty());
        let lines = framer.push(b",-70\r");
        assert_eq!(lines, vec!["12.5,58,14:06:14,23.0,-70"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"a,1\rb,2\rc,3");
        assert_eq!(lines, vec!["a,1", "b,2"]);
        // The tail stays pending until terminated
        assert_eq!(framer.push(b"\r"), vec!["c,3"]);
    }

    #[test]
    fn test_crlf_terminators() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"a,1\r\nb,2\r\n");
        assert_eq!(lines, vec!["a,1", "b,2"]);
    }

    #[test]
    fn test_blank_lines_are_swallowed() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"\r\r  \r").is_empty());
    }

    #[test]
    fn test_clear_discards_partial_line() {
        let mut framer = LineFramer::new();
        framer.push(b"half a li");
        framer.clear();
        let lines = framer.push(b"a,1\r");
        assert_eq!(lines, vec!["a,1"]);
    }

    #[test]
    fn test_oversized_garbage_resynchronizes() {
        let mut framer = LineFramer::new();
        let garbage = vec![b'x'; MAX_PENDING_BYTES + 1];
        assert!(framer.push(&garbage).is_empty());
        // Buffer was dropped; a fresh line still frames correctly
        assert_eq!(framer.push(b"a,1\r"), vec!["a,1"]);
    }

    #[test]
    fn test_non_utf8_line_is_dropped() {
        let mut framer = LineFramer::new();
        let lines = framer.push(&[0xFF, 0xFE, b'\r', b'a', b',', b'1', b'\r']);
        assert_eq!(lines, vec!["a,1"]);
    }
}
