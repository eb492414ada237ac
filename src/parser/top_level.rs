//! Top-Level Objects
//!
//! The constructs valid as standalone PDF file entries: named objects,
//! cross-reference tables, the trailer dictionary and the `startxref`
//! marker. [`DocumentScanner`] drives them in file order and runs the
//! `endobj` recovery protocol whenever a read comes back unusable, so a
//! damaged file degrades into diagnostics instead of a dead stop.

use super::header::{read_version, PdfVersion};
use super::lexer::{classify, find_subslice, CharClass, Lexer};
use super::objects::{Invalid, PdfNumber, PdfObject};
use super::reader::read_object;
use super::ParseResult;
use std::io::{Read, Seek};

/// A `num gen obj ... endobj` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedObject {
    pub num: u32,
    pub gen: u16,
    pub object: PdfObject,
    pub error: Option<String>,
}

impl NamedObject {
    pub fn failed(&self) -> bool {
        self.error.is_some() || self.object.failed()
    }
}

/// One `start count` subsection of a cross-reference table. The 20-byte
/// rows are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRefSection {
    pub start: u64,
    pub count: u64,
    pub data: Vec<u8>,
}

/// A cross-reference table: raw subsections, syntax only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XRefTable {
    pub sections: Vec<XRefSection>,
}

/// The trailer dictionary plus the offset of the `trailer` keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    pub dict: PdfObject,
    pub start: u64,
}

impl Trailer {
    pub fn failed(&self) -> bool {
        self.dict.failed()
    }
}

/// The `startxref` marker with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartXRef {
    pub offset: u64,
}

/// An object valid as a standalone file entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevelObject {
    /// Clean end of input.
    Eof,
    Object(NamedObject),
    XRef(XRefTable),
    Trailer(Trailer),
    StartXRef(StartXRef),
    Invalid(Invalid),
}

impl TopLevelObject {
    pub fn is_eof(&self) -> bool {
        matches!(self, TopLevelObject::Eof)
    }

    pub fn failed(&self) -> bool {
        match self {
            TopLevelObject::Eof | TopLevelObject::XRef(_) | TopLevelObject::StartXRef(_) => false,
            TopLevelObject::Object(named) => named.failed(),
            TopLevelObject::Trailer(trailer) => trailer.failed(),
            TopLevelObject::Invalid(_) => true,
        }
    }

    pub fn as_named_object(&self) -> Option<&NamedObject> {
        match self {
            TopLevelObject::Object(named) => Some(named),
            _ => None,
        }
    }
}

/// Read one top-level object. On garbage the offending token is left
/// unconsumed; the caller decides whether to run
/// [`skip_to_endobj`] and continue.
pub fn read_top_level_object<R: Read + Seek>(
    lexer: &mut Lexer<R>,
) -> ParseResult<TopLevelObject> {
    let token = lexer.peek_token()?;
    if token.is_eof() {
        return Ok(TopLevelObject::Eof);
    }
    if PdfNumber::parse(token.bytes()).is_some_and(|n| n.is_unsigned_integer()) {
        return parse_named_object(lexer);
    }
    match token.bytes() {
        b"xref" => parse_xref_table(lexer),
        b"trailer" => parse_trailer(lexer),
        b"startxref" => parse_startxref(lexer),
        _ => Ok(TopLevelObject::Invalid(Invalid::at(
            "Garbage or unexpected token",
            lexer.last_pos(),
        ))),
    }
}

fn parse_named_object<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<TopLevelObject> {
    let t1 = lexer.next_token()?;
    let num = PdfNumber::parse(t1.bytes())
        .and_then(|n| n.as_u64())
        .and_then(|n| u32::try_from(n).ok());
    let Some(num) = num else {
        return Ok(TopLevelObject::Invalid(Invalid::at(
            "Misshaped named object header (num)",
            lexer.last_pos(),
        )));
    };
    let t2 = lexer.next_token()?;
    let gen = PdfNumber::parse(t2.bytes())
        .and_then(|n| n.as_u64())
        .and_then(|n| u16::try_from(n).ok());
    let Some(gen) = gen else {
        return Ok(TopLevelObject::Invalid(Invalid::at(
            "Misshaped named object header (gen)",
            lexer.last_pos(),
        )));
    };
    if lexer.next_token()? != b"obj" {
        return Ok(TopLevelObject::Invalid(Invalid::at(
            "Misshaped named object header (obj)",
            lexer.last_pos(),
        )));
    }

    // A dictionary immediately followed by `stream` has already been
    // promoted to a stream by the object reader.
    let object = read_object(lexer)?;

    let mut error = None;
    let end = lexer.next_token()?;
    if end != b"endobj" {
        error = Some(if end.is_eof() {
            String::from("End of input where endobj expected")
        } else {
            format!("endobj not found at {}", lexer.last_pos())
        });
    }

    Ok(TopLevelObject::Object(NamedObject {
        num,
        gen,
        object,
        error,
    }))
}

fn parse_xref_table<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<TopLevelObject> {
    let keyword = lexer.next_token()?;
    debug_assert!(keyword == b"xref");
    debug_assert!(lexer.buffer_empty());
    lexer.skip_to_eol()?;

    let mut sections = Vec::new();
    loop {
        let token = lexer.peek_token()?;
        if token.is_eof() {
            return Ok(TopLevelObject::Invalid(Invalid::new(
                "End of input while reading xref table",
            )));
        }
        if token == b"trailer" {
            // Left for the caller; the trailer is its own entry.
            break;
        }
        lexer.next_token()?;
        let Some(start) = PdfNumber::parse(token.bytes()).and_then(|n| n.as_u64()) else {
            return Ok(TopLevelObject::Invalid(Invalid::at(
                "Broken xref subsection header (start)",
                lexer.last_pos(),
            )));
        };
        let t2 = lexer.next_token()?;
        let Some(count) = PdfNumber::parse(t2.bytes()).and_then(|n| n.as_u64()) else {
            return Ok(TopLevelObject::Invalid(Invalid::at(
                "Broken xref subsection header (count)",
                lexer.last_pos(),
            )));
        };
        lexer.skip_to_eol()?;
        // 20 bytes per row: offset, generation, type, EOL.
        let len = (count as usize).saturating_mul(20);
        let data = lexer.read_exact_vec(len)?;
        if data.len() < len {
            return Ok(TopLevelObject::Invalid(Invalid::new(
                "End of input while reading xref table",
            )));
        }
        sections.push(XRefSection { start, count, data });
    }

    Ok(TopLevelObject::XRef(XRefTable { sections }))
}

fn parse_trailer<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<TopLevelObject> {
    let keyword = lexer.next_token()?;
    debug_assert!(keyword == b"trailer");
    let start = lexer.last_pos();
    let dict = read_object(lexer)?;
    Ok(TopLevelObject::Trailer(Trailer { dict, start }))
}

fn parse_startxref<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<TopLevelObject> {
    let keyword = lexer.next_token()?;
    debug_assert!(keyword == b"startxref");
    let token = lexer.next_token()?;
    let Some(offset) = PdfNumber::parse(token.bytes()).and_then(|n| n.as_u64()) else {
        return Ok(TopLevelObject::Invalid(Invalid::at(
            "Broken startxref",
            lexer.last_pos(),
        )));
    };
    Ok(TopLevelObject::StartXRef(StartXRef { offset }))
}

/// Scan forward for `endobj` on a token boundary.
///
/// Returns `true` with the cursor just past the accepted `endobj`, or
/// `false` at end of input. The lexer's push-back must be empty.
pub fn skip_to_endobj<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<bool> {
    debug_assert!(lexer.buffer_empty());
    loop {
        let line = lexer.read_raw_line()?;
        if line.is_empty() {
            return Ok(false);
        }
        if let Some(off) = find_subslice(&line, b"endobj") {
            if off + b"endobj".len() == line.len() {
                return Ok(true);
            }
            let excess = (line.len() - off - b"endobj".len()) as i64;
            lexer.seek_by(-excess)?;
            match lexer.peek_byte()? {
                // A regular byte right after the match means it was part
                // of a longer word; keep scanning from here.
                Some(c) if classify(c) == CharClass::Regular => {}
                _ => return Ok(true),
            }
        }
    }
}

/// Reads a document as a sequence of top-level objects, recovering from
/// unreadable regions by skipping to the next `endobj`.
pub struct DocumentScanner<R: Read + Seek> {
    lexer: Lexer<R>,
}

impl<R: Read + Seek> DocumentScanner<R> {
    pub fn new(reader: R) -> ParseResult<Self> {
        Ok(DocumentScanner {
            lexer: Lexer::new(reader)?,
        })
    }

    /// Read the `%PDF-M.N` line. `None` (a warning, not an error) when
    /// the input does not start with one.
    pub fn read_version(&mut self) -> ParseResult<Option<PdfVersion>> {
        read_version(&mut self.lexer)
    }

    /// Read a single object (not a file entry) at the current position.
    pub fn read_object(&mut self) -> ParseResult<PdfObject> {
        read_object(&mut self.lexer)
    }

    /// Read the next top-level object. An unreadable region comes back
    /// as `Invalid` with the recovery outcome appended to the
    /// diagnostic, and the cursor placed after the next `endobj` (or at
    /// end of input) so the scan can continue.
    pub fn next_object(&mut self) -> ParseResult<TopLevelObject> {
        let object = read_top_level_object(&mut self.lexer)?;
        let TopLevelObject::Invalid(invalid) = object else {
            return Ok(object);
        };
        // Drop any buffered garbage token, then resync.
        self.lexer.reset();
        let recovered = skip_to_endobj(&mut self.lexer)?;
        let message = if recovered {
            format!(
                "{}, skipping past endobj at {}",
                invalid,
                self.lexer.position().saturating_sub(b"endobj".len() as u64)
            )
        } else {
            format!("{}, no recovery until end of input", invalid)
        };
        Ok(TopLevelObject::Invalid(Invalid::new(message)))
    }

    /// Offset of the next unconsumed byte.
    pub fn position(&self) -> u64 {
        self.lexer.position()
    }

    /// Rewind any buffered token and return the underlying reader.
    pub fn into_inner(self) -> ParseResult<R> {
        self.lexer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scanner(input: &[u8]) -> DocumentScanner<Cursor<Vec<u8>>> {
        DocumentScanner::new(Cursor::new(input.to_vec())).unwrap()
    }

    fn read_tlo(input: &[u8]) -> TopLevelObject {
        let mut lexer = Lexer::new(Cursor::new(input.to_vec())).unwrap();
        read_top_level_object(&mut lexer).unwrap()
    }

    #[test]
    fn test_named_object() {
        let tlo = read_tlo(b"5 0 obj\n<< /Length 5 >>\nstream\nABCDE\nendstream\nendobj\n");
        let TopLevelObject::Object(named) = tlo else { panic!() };
        assert_eq!((named.num, named.gen), (5, 0));
        assert!(named.error.is_none());
        let stream = named.object.as_stream().unwrap();
        assert_eq!(stream.data, b"ABCDE");
        assert!(stream.error.is_none());
    }

    #[test]
    fn test_named_object_rescued_stream() {
        let tlo = read_tlo(b"5 0 obj\n<< >>\nstream\nXYendstreamzz\nendstream\nendobj\n");
        let TopLevelObject::Object(named) = tlo else { panic!() };
        let stream = named.object.as_stream().unwrap();
        assert_eq!(stream.data, b"XYendstreamzz");
        assert!(named.error.is_none());
    }

    #[test]
    fn test_named_object_missing_endobj() {
        let tlo = read_tlo(b"1 0 obj\n42\n");
        let TopLevelObject::Object(named) = tlo else { panic!() };
        assert_eq!(named.object.as_number().unwrap().as_i64(), Some(42));
        assert_eq!(
            named.error.as_deref(),
            Some("End of input where endobj expected")
        );
    }

    #[test]
    fn test_named_object_wrong_terminator() {
        let tlo = read_tlo(b"1 0 obj 42 oops");
        let TopLevelObject::Object(named) = tlo else { panic!() };
        assert!(named
            .error
            .as_deref()
            .unwrap()
            .starts_with("endobj not found at"));
    }

    #[test]
    fn test_misshaped_headers() {
        let TopLevelObject::Invalid(inv) = read_tlo(b"7 x obj 1 endobj") else {
            panic!()
        };
        assert!(inv.message.contains("(gen)"));

        let TopLevelObject::Invalid(inv) = read_tlo(b"7 0 objx 1 endobj") else {
            panic!()
        };
        assert!(inv.message.contains("(obj)"));
    }

    #[test]
    fn test_xref_table() {
        let row = b"0000000000 65535 f \n";
        let mut input = b"xref\n0 2\n".to_vec();
        input.extend_from_slice(row);
        input.extend_from_slice(b"0000000017 00000 n \n");
        input.extend_from_slice(b"trailer\n<< /Size 2 >>");

        let mut lexer = Lexer::new(Cursor::new(input)).unwrap();
        let TopLevelObject::XRef(table) = read_top_level_object(&mut lexer).unwrap() else {
            panic!()
        };
        assert_eq!(table.sections.len(), 1);
        let section = &table.sections[0];
        assert_eq!((section.start, section.count), (0, 2));
        assert_eq!(section.data.len(), 40);
        assert!(section.data.starts_with(row));

        // The trailer keyword was left unconsumed.
        let TopLevelObject::Trailer(trailer) = read_top_level_object(&mut lexer).unwrap() else {
            panic!()
        };
        assert_eq!(
            trailer
                .dict
                .as_dict()
                .and_then(|d| d.get("Size"))
                .and_then(|o| o.as_number())
                .and_then(|n| n.as_i64()),
            Some(2)
        );
    }

    #[test]
    fn test_xref_table_truncated_rows() {
        let TopLevelObject::Invalid(inv) = read_tlo(b"xref\n0 3\n0000000000 65535 f \n") else {
            panic!()
        };
        assert_eq!(inv.message, "End of input while reading xref table");
    }

    #[test]
    fn test_xref_table_broken_subsection() {
        let TopLevelObject::Invalid(inv) = read_tlo(b"xref\n0 x\n") else {
            panic!()
        };
        assert!(inv.message.contains("(count)"));
    }

    #[test]
    fn test_trailer_records_start() {
        let tlo = read_tlo(b"  trailer\n<< /Root 1 0 R >>");
        let TopLevelObject::Trailer(trailer) = tlo else { panic!() };
        assert_eq!(trailer.start, 2);
        assert!(!trailer.failed());
    }

    #[test]
    fn test_startxref() {
        let tlo = read_tlo(b"startxref\n116\n%%EOF");
        assert_eq!(
            tlo,
            TopLevelObject::StartXRef(StartXRef { offset: 116 })
        );

        let TopLevelObject::Invalid(inv) = read_tlo(b"startxref\nnope") else {
            panic!()
        };
        assert!(inv.message.contains("Broken startxref"));
    }

    #[test]
    fn test_eof_marker() {
        assert!(read_tlo(b"  ").is_eof());
    }

    #[test]
    fn test_skip_to_endobj_boundary_rules() {
        // endobj followed by a regular byte is a false positive.
        let mut lexer =
            Lexer::new(Cursor::new(b"junk endobjX more\nendobj\nrest".to_vec())).unwrap();
        assert!(skip_to_endobj(&mut lexer).unwrap());
        assert_eq!(lexer.next_token().unwrap(), b"rest");
    }

    #[test]
    fn test_skip_to_endobj_eof() {
        let mut lexer = Lexer::new(Cursor::new(b"nothing here".to_vec())).unwrap();
        assert!(!skip_to_endobj(&mut lexer).unwrap());
    }

    #[test]
    fn test_scanner_recovery() {
        // Garbage, then recovery past endobj, then a clean end.
        let mut scanner = scanner(b"garbage 5 0 obj<<>>endobj");
        let TopLevelObject::Invalid(inv) = scanner.next_object().unwrap() else {
            panic!()
        };
        assert!(inv.message.starts_with("Garbage or unexpected token at 0"));
        assert!(inv.message.contains("skipping past endobj"));
        assert!(scanner.next_object().unwrap().is_eof());
    }

    #[test]
    fn test_scanner_recovery_without_endobj() {
        let mut scanner = scanner(b"}{ nothing salvageable");
        let TopLevelObject::Invalid(inv) = scanner.next_object().unwrap() else {
            panic!()
        };
        assert!(inv.message.contains("no recovery until end of input"));
        assert!(scanner.next_object().unwrap().is_eof());
    }

    #[test]
    fn test_scanner_sequence() {
        let mut scanner = scanner(
            b"1 0 obj\n<< /Type /Catalog >>\nendobj\n2 0 obj\n(hi)\nendobj\nstartxref\n9\n%%EOF",
        );
        let first = scanner.next_object().unwrap();
        assert_eq!(first.as_named_object().unwrap().num, 1);
        let second = scanner.next_object().unwrap();
        assert_eq!(second.as_named_object().unwrap().num, 2);
        assert!(matches!(
            scanner.next_object().unwrap(),
            TopLevelObject::StartXRef(_)
        ));
        // %%EOF is a comment; the scan ends cleanly.
        assert!(scanner.next_object().unwrap().is_eof());
    }
}
