//! PDF Object Reader
//!
//! Recursive descent over tokens producing [`PdfObject`] values,
//! including the stream-body capture that straddles the token grammar
//! and raw bytes. The reader is lenient: malformed input produces the
//! most structured partial tree possible, with a diagnostic on the
//! affected node or an `Invalid` placeholder in place of the unreadable
//! child. Only I/O and seek failures surface as `Err`.

use super::lexer::{classify, find_subslice, chop_eol, CharClass, Lexer};
use super::objects::{
    Invalid, PdfArray, PdfDictionary, PdfName, PdfNumber, PdfObject, PdfStream, PdfString,
};
use super::ParseResult;
use std::io::{Read, Seek};

/// Read one object from the token stream.
///
/// At end of input or on a token that cannot start an object this
/// returns an `Invalid` node; in the latter case the offending token is
/// left unconsumed so a caller can re-synchronize on it.
pub fn read_object<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<PdfObject> {
    let token = lexer.peek_token()?;
    if token.is_eof() {
        return Ok(PdfObject::invalid("End of input"));
    }
    match token.bytes() {
        b"/" => parse_name(lexer),
        b"(" => parse_literal_string(lexer),
        b"<" => parse_hex_string(lexer),
        b"<<" => parse_dictionary(lexer),
        b"[" => parse_array(lexer),
        b"null" => {
            lexer.next_token()?;
            Ok(PdfObject::Null)
        }
        b"true" => {
            lexer.next_token()?;
            Ok(PdfObject::Boolean(true))
        }
        b"false" => {
            lexer.next_token()?;
            Ok(PdfObject::Boolean(false))
        }
        bytes => match PdfNumber::parse(bytes) {
            Some(number) => {
                lexer.next_token()?;
                parse_number_or_reference(lexer, number)
            }
            None => Ok(PdfObject::invalid_at(
                "Garbage or unexpected token",
                lexer.last_pos(),
            )),
        },
    }
}

fn parse_name<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<PdfObject> {
    let slash = lexer.next_token()?;
    debug_assert!(slash == b"/");
    let name = lexer.next_token()?;
    match name.bytes().first() {
        Some(&b) if classify(b) == CharClass::Regular => {
            Ok(PdfObject::Name(PdfName(name.into_bytes())))
        }
        _ => Ok(PdfObject::invalid_at(
            "/ not followed by a proper name",
            lexer.last_pos(),
        )),
    }
}

/// `n1` has been consumed. If it is followed by another non-negative
/// integer and the keyword `R`, the three tokens form an indirect
/// reference; otherwise the lookahead is pushed back and `n1` stands
/// alone. Bounded at two extra tokens.
fn parse_number_or_reference<R: Read + Seek>(
    lexer: &mut Lexer<R>,
    n1: PdfNumber,
) -> ParseResult<PdfObject> {
    let t2 = lexer.next_token()?;
    if let (Some(num), Some(gen)) = (n1.as_u64(), PdfNumber::parse(t2.bytes()).and_then(|n| n.as_u64())) {
        let t3 = lexer.next_token()?;
        if t3 == b"R" {
            if let (Ok(num), Ok(gen)) = (u32::try_from(num), u16::try_from(gen)) {
                return Ok(PdfObject::Reference(num, gen));
            }
        }
        lexer.push_token(t3);
    }
    lexer.push_token(t2);
    Ok(PdfObject::Number(n1))
}

fn parse_literal_string<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<PdfObject> {
    let open = lexer.next_token()?;
    debug_assert!(open == b"(");
    debug_assert!(lexer.buffer_empty());

    let mut data = Vec::new();
    let mut error = None;
    let mut depth = 0u32;

    'body: loop {
        let Some(c) = lexer.read_byte()? else {
            error = Some(String::from("End of input while reading string"));
            break;
        };
        match c {
            b')' => {
                if depth > 0 {
                    data.push(c);
                    depth -= 1;
                } else {
                    break;
                }
            }
            b'(' => {
                data.push(c);
                depth += 1;
            }
            b'\\' => {
                let Some(esc) = lexer.read_byte()? else {
                    error = Some(String::from("End of input while reading string"));
                    break;
                };
                match esc {
                    b'n' => data.push(b'\n'),
                    b'r' => data.push(b'\r'),
                    b't' => data.push(b'\t'),
                    b'b' => data.push(0x08),
                    b'f' => data.push(0x0C),
                    b'(' | b')' | b'\\' => data.push(esc),
                    // Escaped end-of-line is a line continuation.
                    b'\r' => {
                        if lexer.peek_byte()? == Some(b'\n') {
                            lexer.read_byte()?;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut value = u32::from(esc - b'0');
                        // Up to two more octal digits; a fourth digit is
                        // ordinary content, not part of the escape.
                        for _ in 0..2 {
                            match lexer.peek_byte()? {
                                None => {
                                    error =
                                        Some(String::from("End of input while reading string"));
                                    break 'body;
                                }
                                Some(d @ b'0'..=b'7') => {
                                    lexer.read_byte()?;
                                    value = value * 8 + u32::from(d - b'0');
                                }
                                Some(_) => break,
                            }
                        }
                        if value > 255 {
                            error = Some(format!(
                                "Invalid octal value at {}",
                                lexer.position().saturating_sub(4)
                            ));
                            break;
                        }
                        data.push(value as u8);
                    }
                    _ => {
                        error = Some(format!(
                            "Invalid character in string at {}",
                            lexer.position().saturating_sub(1)
                        ));
                        break;
                    }
                }
            }
            _ => data.push(c),
        }
    }

    Ok(PdfObject::String(PdfString {
        data,
        hex: false,
        error,
    }))
}

fn parse_hex_string<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<PdfObject> {
    let open = lexer.next_token()?;
    debug_assert!(open == b"<");
    debug_assert!(lexer.buffer_empty());

    let mut data = Vec::new();
    let mut error = None;
    let mut pending: u8 = 0;
    let mut odd = false;

    loop {
        let Some(c) = lexer.read_byte()? else {
            error = Some(String::from("End of input while reading string"));
            break;
        };
        match c {
            b'>' => {
                if odd {
                    // Odd trailing nibble: pad with a low zero.
                    data.push(pending << 4);
                }
                break;
            }
            b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                let nibble = match c {
                    b'0'..=b'9' => c - b'0',
                    b'a'..=b'f' => c - b'a' + 10,
                    _ => c - b'A' + 10,
                };
                if odd {
                    data.push((pending << 4) | nibble);
                    odd = false;
                } else {
                    pending = nibble;
                    odd = true;
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' => {}
            _ => {
                error = Some(format!(
                    "Invalid character in string at {}",
                    lexer.position().saturating_sub(1)
                ));
                break;
            }
        }
    }

    Ok(PdfObject::String(PdfString {
        data,
        hex: true,
        error,
    }))
}

fn parse_array<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<PdfObject> {
    let open = lexer.next_token()?;
    debug_assert!(open == b"[");

    let mut items = Vec::new();
    let mut error = None;

    while lexer.peek_token()? != b"]" {
        let item = read_object(lexer)?;
        let failed = item.failed();
        items.push(item);
        if failed {
            error = Some(format!("Error reading array element at {}", lexer.last_pos()));
            break;
        }
    }
    if lexer.peek_token()? == b"]" {
        lexer.next_token()?;
    }

    Ok(PdfObject::Array(PdfArray { items, error }))
}

fn parse_dictionary<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<PdfObject> {
    let open = lexer.next_token()?;
    debug_assert!(open == b"<<");

    let mut dict = PdfDictionary::new();

    while lexer.peek_token()? != b">>" {
        let key = read_object(lexer)?;
        if key.failed() {
            dict.error = Some(format!("Error reading key at {}", lexer.last_pos()));
            break;
        }
        let PdfObject::Name(name) = key else {
            dict.error = Some(format!("Key not a name at {}", lexer.last_pos()));
            break;
        };
        if dict.entries.contains_key(&name.0) {
            dict.error = Some(format!(
                "Duplicate key /{} at {}",
                name,
                lexer.last_pos()
            ));
            break;
        }
        if lexer.peek_token()? == b">>" {
            // Missing value: record a placeholder and let the loop close
            // the dictionary normally.
            dict.entries.insert(
                name.0,
                PdfObject::Invalid(Invalid::at("Value not present", lexer.last_pos())),
            );
            continue;
        }
        let value = read_object(lexer)?;
        let failed = value.failed();
        // The value is stored even when its parse failed; it carries
        // its own diagnostic.
        dict.entries.insert(name.0, value);
        if failed {
            dict.error = Some(format!("Error reading value at {}", lexer.last_pos()));
            break;
        }
    }
    if lexer.peek_token()? == b">>" {
        lexer.next_token()?;
    }

    if lexer.peek_token()? == b"stream" {
        read_stream_body(lexer, dict)
    } else {
        Ok(PdfObject::Dictionary(dict))
    }
}

/// Capture the raw bytes between `stream` and `endstream`.
///
/// When the dictionary carries a trustworthy `/Length` (a non-negative
/// integral number) exactly that many bytes are read and `endstream`
/// is expected to follow. Otherwise the body is recovered by scanning
/// lines for `endstream`, accepting a match only at a token boundary,
/// and chopping one trailing end-of-line from the captured bytes.
fn read_stream_body<R: Read + Seek>(
    lexer: &mut Lexer<R>,
    mut dict: PdfDictionary,
) -> ParseResult<PdfObject> {
    let keyword = lexer.next_token()?;
    debug_assert!(keyword == b"stream");
    debug_assert!(lexer.buffer_empty());

    // The stream keyword is followed by CRLF or LF.
    lexer.skip_past_lf()?;

    let mut error = None;
    let trusted_len = dict
        .get("Length")
        .and_then(|o| o.as_number())
        .and_then(|n| n.as_u64());

    let data = match trusted_len {
        Some(len) => {
            let len = len as usize;
            let data = lexer.read_exact_vec(len)?;
            if data.len() < len {
                error = Some(format!(
                    "End of input during reading stream data, read {} bytes",
                    data.len()
                ));
            } else if lexer.next_token()? != b"endstream" {
                error = Some(format!("endstream not found at {}", lexer.last_pos()));
            }
            data
        }
        None => {
            let mut data = Vec::new();
            loop {
                let line = lexer.read_raw_line()?;
                if line.is_empty() {
                    error = Some(String::from("End of input during reading stream data"));
                    break;
                }
                match find_subslice(&line, b"endstream") {
                    Some(off) => {
                        data.extend_from_slice(&line[..off]);
                        if off + b"endstream".len() == line.len() {
                            // Separator at end of input: accepted.
                            break;
                        }
                        // Rewind to one byte past the match and check
                        // that a token boundary follows.
                        let excess = (line.len() - off - b"endstream".len()) as i64;
                        lexer.seek_by(-excess)?;
                        lexer.reset();
                        match lexer.peek_byte()? {
                            Some(c) if classify(c) == CharClass::Regular => {
                                // False alarm: the match was part of a
                                // longer word. Keep its bytes and scan on.
                                data.extend_from_slice(b"endstream");
                            }
                            _ => break,
                        }
                    }
                    None => data.extend_from_slice(&line),
                }
            }
            chop_eol(&mut data);
            if !dict.contains_key("Length") {
                dict.insert(
                    "Length",
                    PdfObject::Number(PdfNumber::from_i64(data.len() as i64)),
                );
            }
            data
        }
    };

    Ok(PdfObject::Stream(PdfStream { dict, data, error }))
}
