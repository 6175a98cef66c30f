//! Newline framing for the serial byte stream.

/// Frame delimiter.
pub const DELIMITER: u8 = b'\n';

/// Lines longer than this are flushed as a frame even without a delimiter,
/// so a device that never sends `\n` cannot grow the buffer without bound.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Splits a byte stream into `\n`-terminated lines.
///
/// Bytes after the last delimiter stay buffered until more input completes
/// the line.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    /// An empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete line, without its delimiter.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        if let Some(pos) = self.buffer.iter().position(|&b| b == DELIMITER) {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            return Some(line);
        }
        if self.buffer.len() >= MAX_LINE_LEN {
            return Some(self.buffer.drain(..MAX_LINE_LEN).collect());
        }
        None
    }

    /// Bytes waiting for their delimiter.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut framer = LineFramer::new();
        framer.push(b"hello\n");
        assert_eq!(framer.next_line(), Some(b"hello".to_vec()));
        assert_eq!(framer.next_line(), None);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_split_across_pushes() {
        let mut framer = LineFramer::new();
        framer.push(b"{\"a\":");
        assert_eq!(framer.next_line(), None);
        framer.push(b" 1}\r\nnext");
        assert_eq!(framer.next_line(), Some(b"{\"a\": 1}\r".to_vec()));
        assert_eq!(framer.pending(), 4);
    }

    #[test]
    fn test_multiple_lines_in_one_push() {
        let mut framer = LineFramer::new();
        framer.push(b"A\nB\n\nC\n");
        let lines: Vec<Vec<u8>> = std::iter::from_fn(|| framer.next_line()).collect();
        assert_eq!(lines, vec![b"A".to_vec(), b"B".to_vec(), Vec::new(), b"C".to_vec()]);
    }

    #[test]
    fn test_overlong_line_is_flushed() {
        let mut framer = LineFramer::new();
        framer.push(&vec![b'x'; MAX_LINE_LEN + 3]);
        assert_eq!(framer.next_line().map(|l| l.len()), Some(MAX_LINE_LEN));
        assert_eq!(framer.pending(), 3);
        assert_eq!(framer.next_line(), None);
    }
}
