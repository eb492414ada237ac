//! PDF Version Line
//!
//! The `%PDF-M.N` comment at byte 0. Its absence is reported as a
//! warning (`None`), never as a failure: the tokenizer treats the line
//! as an ordinary comment anyway.

use super::lexer::Lexer;
use super::ParseResult;
use std::fmt;
use std::io::{Read, Seek};

/// PDF version as announced by the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfVersion {
    pub major: u32,
    pub minor: u32,
}

impl PdfVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        PdfVersion { major, minor }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Read a `%PDF-M.N` line at the current position.
///
/// A first byte other than `%` is left unconsumed. A `%` line that is
/// not exactly a single-digit `%PDF-M.N` header is consumed (it is a
/// comment either way) and reported as `None`.
pub fn read_version<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<Option<PdfVersion>> {
    debug_assert!(lexer.buffer_empty());
    if lexer.peek_byte()? != Some(b'%') {
        return Ok(None);
    }
    let line = lexer.read_line()?;
    Ok(parse_version_line(&line))
}

fn parse_version_line(line: &[u8]) -> Option<PdfVersion> {
    if line.len() < 8 || &line[..5] != b"%PDF-" {
        return None;
    }
    let (major, dot, minor) = (line[5], line[6], line[7]);
    if !major.is_ascii_digit() || dot != b'.' || !minor.is_ascii_digit() {
        return None;
    }
    // Exactly one digit per component: a longer run means a version
    // this syntax does not announce.
    if line.get(8).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(PdfVersion::new(
        u32::from(major - b'0'),
        u32::from(minor - b'0'),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn version_of(input: &[u8]) -> Option<PdfVersion> {
        let mut lexer = Lexer::new(Cursor::new(input.to_vec())).unwrap();
        read_version(&mut lexer).unwrap()
    }

    #[test]
    fn test_plain_header() {
        assert_eq!(version_of(b"%PDF-1.7\n"), Some(PdfVersion::new(1, 7)));
        assert_eq!(version_of(b"%PDF-2.0\r\n"), Some(PdfVersion::new(2, 0)));
        assert_eq!(version_of(b"%PDF-1.4"), Some(PdfVersion::new(1, 4)));
    }

    #[test]
    fn test_trailing_content_tolerated() {
        assert_eq!(version_of(b"%PDF-1.4 producer\n"), Some(PdfVersion::new(1, 4)));
    }

    #[test]
    fn test_malformed_headers() {
        assert_eq!(version_of(b"%PDF-1\n"), None);
        assert_eq!(version_of(b"%PDF-1.10\n"), None);
        assert_eq!(version_of(b"%PDF1.4\n"), None);
        assert_eq!(version_of(b"% just a comment\n"), None);
        assert_eq!(version_of(b""), None);
    }

    #[test]
    fn test_non_comment_start_left_unconsumed() {
        let mut lexer = Lexer::new(Cursor::new(b"1 0 obj".to_vec())).unwrap();
        assert_eq!(read_version(&mut lexer).unwrap(), None);
        assert_eq!(lexer.next_token().unwrap(), b"1");
    }

    #[test]
    fn test_display() {
        assert_eq!(PdfVersion::new(1, 7).to_string(), "1.7");
    }
}
