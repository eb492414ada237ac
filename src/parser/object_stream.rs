//! PDF Object Streams
//!
//! Compressed object streams (`/Type /ObjStm`, PDF 1.5+): a stream
//! whose decoded payload holds a header of `obj-num offset` pairs
//! followed by the concatenated object bodies. The reader decodes the
//! payload through the filter chain once, then re-enters the tokenizer
//! and object reader over the decoded bytes.

use super::lexer::Lexer;
use super::objects::{Invalid, PdfNumber, PdfStream};
use super::reader::read_object;
use super::top_level::{NamedObject, TopLevelObject};
use super::{ParseError, ParseResult};
use std::io::Cursor;

/// Iterates the objects embedded in one object stream.
///
/// Objects are read sequentially in header order; the header offsets
/// are retained for callers that want random access but are not used
/// here. A parse failure latches the reader: the failed entry is
/// returned once, then every further read reports `Invalid`.
#[derive(Debug)]
pub struct ObjectStreamReader {
    lexer: Lexer<Cursor<Vec<u8>>>,
    /// `(object number, offset relative to /First)` per header pair.
    pairs: Vec<(u32, u64)>,
    first: u64,
    index: usize,
    failed: bool,
}

impl ObjectStreamReader {
    /// Decode the stream and read its header.
    pub fn new(stream: &PdfStream) -> ParseResult<Self> {
        let data = stream.decode()?;

        let count = stream
            .dict
            .get("N")
            .and_then(|o| o.as_number())
            .and_then(PdfNumber::as_u64);
        let first = stream
            .dict
            .get("First")
            .and_then(|o| o.as_number())
            .and_then(PdfNumber::as_u64);
        let (Some(count), Some(first)) = (count, first) else {
            return Err(ParseError::ObjectStream(String::from(
                "Object stream lacks required fields",
            )));
        };

        let mut lexer = Lexer::new(Cursor::new(data))?;
        let mut pairs = Vec::with_capacity(count.min(4096) as usize);
        for _ in 0..count {
            let broken =
                || ParseError::ObjectStream(String::from("Broken object stream header"));
            let num = lexer.next_token().and_then(|t| {
                PdfNumber::parse(t.bytes())
                    .and_then(|n| n.as_u64())
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(broken)
            })?;
            let offset = lexer.next_token().and_then(|t| {
                PdfNumber::parse(t.bytes())
                    .and_then(|n| n.as_u64())
                    .ok_or_else(broken)
            })?;
            pairs.push((num, offset));
        }

        Ok(ObjectStreamReader {
            lexer,
            pairs,
            first,
            index: 0,
            failed: false,
        })
    }

    /// Number of objects announced by `/N`.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The header pairs, in file order.
    pub fn pairs(&self) -> &[(u32, u64)] {
        &self.pairs
    }

    /// Read the next embedded object as a generation-zero named object.
    /// Returns the EOF marker after the last one.
    pub fn read_next(&mut self) -> ParseResult<TopLevelObject> {
        if self.failed {
            return Ok(TopLevelObject::Invalid(Invalid::new(
                "Read on a failed object stream",
            )));
        }
        if self.index == self.pairs.len() {
            self.failed = true;
            return Ok(TopLevelObject::Eof);
        }
        let object = read_object(&mut self.lexer)?;
        let num = self.pairs[self.index].0;
        if object.failed() {
            self.failed = true;
        } else {
            self.index += 1;
        }
        Ok(TopLevelObject::Object(NamedObject {
            num,
            gen: 0,
            object,
            error: None,
        }))
    }

    /// Restart iteration at the first object body.
    pub fn rewind(&mut self) -> ParseResult<()> {
        self.lexer.reset();
        self.lexer.seek_to(self.first)?;
        self.index = 0;
        self.failed = false;
        Ok(())
    }
}
