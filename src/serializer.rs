//! Round-Trip Serializer
//!
//! Deterministic dumper for every object variant. The output is valid
//! PDF object syntax again: names and references print verbatim,
//! literal strings escape everything outside printable ASCII as `\NNN`,
//! hex strings print uppercase pairs, dictionaries print one key per
//! line in sorted order, and stream payloads are written raw between
//! `stream` and `endstream`. Diagnostics recorded during parsing are
//! emitted as `% !!! <text>` comment lines next to the affected node,
//! and an `Invalid` node prints as `null` plus its comment so the dump
//! still parses.

use crate::parser::objects::{Invalid, PdfDictionary, PdfNumber, PdfObject, PdfString};
use crate::parser::top_level::TopLevelObject;
use std::io::{self, Write};

fn write_indent<W: Write>(w: &mut W, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
        w.write_all(b"  ")?;
    }
    Ok(())
}

fn write_error<W: Write>(w: &mut W, depth: usize, error: &str) -> io::Result<()> {
    write_indent(w, depth)?;
    write!(w, "% !!! {error}")
}

fn write_number<W: Write>(w: &mut W, number: &PdfNumber) -> io::Result<()> {
    write!(w, "{number}")
}

fn write_string<W: Write>(w: &mut W, string: &PdfString) -> io::Result<()> {
    if string.hex {
        w.write_all(b"<")?;
        for byte in &string.data {
            write!(w, "{byte:02X}")?;
        }
        w.write_all(b">")?;
    } else {
        w.write_all(b"(")?;
        for &byte in &string.data {
            if (32..=127).contains(&byte) && !matches!(byte, b'(' | b')' | b'\\') {
                w.write_all(&[byte])?;
            } else {
                write!(w, "\\{byte:03o}")?;
            }
        }
        w.write_all(b")")?;
    }
    Ok(())
}

fn write_invalid<W: Write>(w: &mut W, depth: usize, invalid: &Invalid) -> io::Result<()> {
    write_indent(w, depth)?;
    w.write_all(b"null\n")?;
    write_error(w, depth, &invalid.to_string())
}

fn write_dictionary<W: Write>(w: &mut W, dict: &PdfDictionary, depth: usize) -> io::Result<()> {
    write_indent(w, depth)?;
    w.write_all(b"<<\n")?;
    for (key, value) in &dict.entries {
        write_indent(w, depth + 1)?;
        w.write_all(b"/")?;
        w.write_all(key)?;
        w.write_all(b"\n")?;
        write_object(w, value, depth + 2)?;
        w.write_all(b"\n")?;
    }
    if let Some(error) = &dict.error {
        write_error(w, depth + 1, error)?;
        w.write_all(b"\n")?;
    }
    write_indent(w, depth)?;
    w.write_all(b">>")
}

/// Dump one object at the given indentation depth.
pub fn write_object<W: Write>(w: &mut W, object: &PdfObject, depth: usize) -> io::Result<()> {
    match object {
        PdfObject::Null => {
            write_indent(w, depth)?;
            w.write_all(b"null")
        }
        PdfObject::Boolean(value) => {
            write_indent(w, depth)?;
            w.write_all(if *value { b"true" } else { b"false" })
        }
        PdfObject::Number(number) => {
            write_indent(w, depth)?;
            write_number(w, number)
        }
        PdfObject::String(string) => {
            write_indent(w, depth)?;
            write_string(w, string)?;
            if let Some(error) = &string.error {
                w.write_all(b"\n")?;
                write_error(w, depth, error)?;
            }
            Ok(())
        }
        PdfObject::Name(name) => {
            write_indent(w, depth)?;
            w.write_all(b"/")?;
            w.write_all(name.as_bytes())
        }
        PdfObject::Array(array) => {
            write_indent(w, depth)?;
            w.write_all(b"[\n")?;
            for item in &array.items {
                write_object(w, item, depth + 1)?;
                w.write_all(b"\n")?;
            }
            if let Some(error) = &array.error {
                write_error(w, depth + 1, error)?;
                w.write_all(b"\n")?;
            }
            write_indent(w, depth)?;
            w.write_all(b"]")
        }
        PdfObject::Dictionary(dict) => write_dictionary(w, dict, depth),
        PdfObject::Stream(stream) => {
            write_dictionary(w, &stream.dict, depth)?;
            w.write_all(b"\n")?;
            write_indent(w, depth)?;
            w.write_all(b"stream\n")?;
            w.write_all(&stream.data)?;
            w.write_all(b"\n")?;
            write_indent(w, depth)?;
            w.write_all(b"endstream")?;
            if let Some(error) = &stream.error {
                w.write_all(b"\n")?;
                write_error(w, depth, error)?;
            }
            Ok(())
        }
        PdfObject::Reference(num, gen) => {
            write_indent(w, depth)?;
            write!(w, "{num} {gen} R")
        }
        PdfObject::Invalid(invalid) => write_invalid(w, depth, invalid),
    }
}

/// Dump one top-level file entry.
pub fn write_top_level<W: Write>(w: &mut W, object: &TopLevelObject) -> io::Result<()> {
    match object {
        TopLevelObject::Eof => Ok(()),
        TopLevelObject::Object(named) => {
            write!(w, "{} {} obj\n", named.num, named.gen)?;
            write_object(w, &named.object, 1)?;
            w.write_all(b"\n")?;
            if let Some(error) = &named.error {
                write_error(w, 0, error)?;
                w.write_all(b"\n")?;
            }
            w.write_all(b"endobj\n")
        }
        TopLevelObject::XRef(table) => {
            w.write_all(b"xref\n")?;
            for section in &table.sections {
                write!(w, "{} {}\n", section.start, section.count)?;
                w.write_all(&section.data)?;
            }
            Ok(())
        }
        TopLevelObject::Trailer(trailer) => {
            w.write_all(b"trailer\n")?;
            write_object(w, &trailer.dict, 1)?;
            w.write_all(b"\n")
        }
        TopLevelObject::StartXRef(marker) => {
            write!(w, "startxref\n{}\n%%EOF\n", marker.offset)
        }
        TopLevelObject::Invalid(invalid) => {
            write_invalid(w, 0, invalid)?;
            w.write_all(b"\n")
        }
    }
}

/// [`write_object`] into a fresh buffer.
pub fn object_to_vec(object: &PdfObject) -> Vec<u8> {
    let mut out = Vec::new();
    write_object(&mut out, object, 0).expect("writing to a Vec cannot fail");
    out
}

/// [`write_top_level`] into a fresh buffer.
pub fn top_level_to_vec(object: &TopLevelObject) -> Vec<u8> {
    let mut out = Vec::new();
    write_top_level(&mut out, object).expect("writing to a Vec cannot fail");
    out
}
