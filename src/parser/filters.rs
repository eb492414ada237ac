//! PDF Stream Filters
//!
//! The codec chain behind [`PdfStream::decode`](super::objects::PdfStream::decode):
//! reads the `/Filter` entry (absent, a single name, or an array of
//! names) and applies the corresponding decoders in order. FlateDecode
//! is backed by `flate2` behind the `compression` feature; the ASCII
//! codecs are implemented here. Filters outside the recognized set are
//! reported as unhandled; the raw bytes remain available to callers.

use super::objects::{PdfDictionary, PdfObject};
use super::{ParseError, ParseResult};

#[cfg(feature = "compression")]
use std::io::Read;

/// Filters named by ISO 32000-1 Section 7.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    ASCIIHexDecode,
    ASCII85Decode,
    LZWDecode,
    FlateDecode,
    RunLengthDecode,
    CCITTFaxDecode,
    JBIG2Decode,
    DCTDecode,
    JPXDecode,
    Crypt,
}

impl Filter {
    /// Resolve a filter name.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"ASCIIHexDecode" => Some(Filter::ASCIIHexDecode),
            b"ASCII85Decode" => Some(Filter::ASCII85Decode),
            b"LZWDecode" => Some(Filter::LZWDecode),
            b"FlateDecode" => Some(Filter::FlateDecode),
            b"RunLengthDecode" => Some(Filter::RunLengthDecode),
            b"CCITTFaxDecode" => Some(Filter::CCITTFaxDecode),
            b"JBIG2Decode" => Some(Filter::JBIG2Decode),
            b"DCTDecode" => Some(Filter::DCTDecode),
            b"JPXDecode" => Some(Filter::JPXDecode),
            b"Crypt" => Some(Filter::Crypt),
            _ => None,
        }
    }
}

fn decode_error(filter: &str, message: impl Into<String>) -> ParseError {
    ParseError::StreamDecode {
        filter: filter.to_string(),
        message: message.into(),
    }
}

/// Decode stream bytes according to the dictionary's `/Filter` chain.
pub fn decode_stream(data: &[u8], dict: &PdfDictionary) -> ParseResult<Vec<u8>> {
    let names: Vec<&[u8]> = match dict.get("Filter") {
        None => return Ok(data.to_vec()),
        Some(PdfObject::Name(name)) => vec![name.as_bytes()],
        Some(PdfObject::Array(array)) => {
            let mut names = Vec::with_capacity(array.len());
            for entry in &array.items {
                match entry {
                    PdfObject::Name(name) => names.push(name.as_bytes()),
                    _ => {
                        return Err(decode_error(
                            "Filter",
                            "filter array entry is not a name",
                        ))
                    }
                }
            }
            names
        }
        Some(_) => return Err(decode_error("Filter", "/Filter is neither name nor array")),
    };

    let mut result = data.to_vec();
    for name in names {
        let display = String::from_utf8_lossy(name).into_owned();
        let filter = Filter::from_name(name)
            .ok_or_else(|| decode_error(&display, "unknown filter"))?;
        result = apply_filter(&result, filter, &display)?;
    }
    Ok(result)
}

fn apply_filter(data: &[u8], filter: Filter, name: &str) -> ParseResult<Vec<u8>> {
    match filter {
        Filter::FlateDecode => decode_flate(data),
        Filter::ASCIIHexDecode => decode_ascii_hex(data),
        Filter::ASCII85Decode => decode_ascii85(data),
        _ => Err(decode_error(name, "unhandled filter")),
    }
}

/// FlateDecode: zlib first, then raw deflate for streams whose zlib
/// wrapper is damaged or missing.
#[cfg(feature = "compression")]
fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut out = Vec::new();
    match flate2::read::ZlibDecoder::new(data).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(zlib_err) => {
            let mut out = Vec::new();
            match flate2::read::DeflateDecoder::new(data).read_to_end(&mut out) {
                Ok(_) => Ok(out),
                Err(_) => Err(decode_error("FlateDecode", zlib_err.to_string())),
            }
        }
    }
}

#[cfg(not(feature = "compression"))]
fn decode_flate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(decode_error(
        "FlateDecode",
        "compression support not compiled in",
    ))
}

fn decode_ascii_hex(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut pending: u8 = 0;
    let mut odd = false;
    for (i, &b) in data.iter().enumerate() {
        match b {
            b'>' => break,
            b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                let nibble = match b {
                    b'0'..=b'9' => b - b'0',
                    b'a'..=b'f' => b - b'a' + 10,
                    _ => b - b'A' + 10,
                };
                if odd {
                    out.push((pending << 4) | nibble);
                    odd = false;
                } else {
                    pending = nibble;
                    odd = true;
                }
            }
            0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20 => {}
            _ => {
                return Err(decode_error(
                    "ASCIIHexDecode",
                    format!("invalid byte 0x{b:02X} at offset {i}"),
                ))
            }
        }
    }
    if odd {
        out.push(pending << 4);
    }
    Ok(out)
}

fn decode_ascii85(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut tuple: u64 = 0;
    let mut count = 0usize;
    let mut iter = data.iter().enumerate();
    while let Some((i, &b)) = iter.next() {
        match b {
            0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20 => {}
            b'~' => break,
            b'z' if count == 0 => out.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                tuple = tuple * 85 + u64::from(b - b'!');
                count += 1;
                if count == 5 {
                    if tuple > u64::from(u32::MAX) {
                        return Err(decode_error(
                            "ASCII85Decode",
                            format!("group out of range at offset {i}"),
                        ));
                    }
                    out.extend_from_slice(&(tuple as u32).to_be_bytes());
                    tuple = 0;
                    count = 0;
                }
            }
            _ => {
                return Err(decode_error(
                    "ASCII85Decode",
                    format!("invalid byte 0x{b:02X} at offset {i}"),
                ))
            }
        }
    }
    if count == 1 {
        return Err(decode_error(
            "ASCII85Decode",
            "single character in final group",
        ));
    }
    if count > 1 {
        let missing = 5 - count;
        for _ in 0..missing {
            tuple = tuple * 85 + 84;
        }
        if tuple > u64::from(u32::MAX) {
            return Err(decode_error("ASCII85Decode", "final group out of range"));
        }
        let bytes = (tuple as u32).to_be_bytes();
        out.extend_from_slice(&bytes[..count - 1]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::objects::{PdfArray, PdfName};

    fn dict_with_filter(value: PdfObject) -> PdfDictionary {
        let mut dict = PdfDictionary::new();
        dict.insert("Filter", value);
        dict
    }

    #[test]
    fn test_no_filter_passthrough() {
        let dict = PdfDictionary::new();
        assert_eq!(decode_stream(b"raw bytes", &dict).unwrap(), b"raw bytes");
    }

    #[test]
    fn test_ascii_hex() {
        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"ASCIIHexDecode")));
        assert_eq!(
            decode_stream(b"48 65 6C 6C 6F>", &dict).unwrap(),
            b"Hello"
        );
        // Odd count pads with a low zero.
        assert_eq!(decode_stream(b"414>", &dict).unwrap(), b"A\x40");
    }

    #[test]
    fn test_ascii_hex_invalid_byte() {
        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"ASCIIHexDecode")));
        let err = decode_stream(b"4G>", &dict).unwrap_err();
        assert!(err.to_string().contains("ASCIIHexDecode"));
    }

    #[test]
    fn test_ascii85() {
        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"ASCII85Decode")));
        // "Hello" in ASCII85.
        assert_eq!(decode_stream(b"87cUR DZ~>", &dict).unwrap(), b"Hello");
        // 'z' shorthand for four zero bytes.
        assert_eq!(decode_stream(b"z~>", &dict).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_filter() {
        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"MadeUpDecode")));
        let err = decode_stream(b"", &dict).unwrap_err();
        assert!(err.to_string().contains("MadeUpDecode"));
    }

    #[test]
    fn test_unhandled_filter() {
        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"DCTDecode")));
        let err = decode_stream(b"\xFF\xD8", &dict).unwrap_err();
        assert!(err.to_string().contains("unhandled"));
    }

    #[test]
    fn test_filter_array_pipeline() {
        // Flate output wrapped in ASCIIHex: decoded right to left as the
        // array lists them first to last.
        let dict = dict_with_filter(PdfObject::Array(PdfArray {
            items: vec![
                PdfObject::Name(PdfName::new(*b"ASCIIHexDecode")),
                PdfObject::Name(PdfName::new(*b"ASCIIHexDecode")),
            ],
            error: None,
        }));
        // "AB" hex-encoded twice: "AB" <- "4142" <- "34313432"
        assert_eq!(decode_stream(b"34313432>", &dict).unwrap(), b"AB");
    }

    #[test]
    fn test_filter_array_rejects_non_name() {
        let dict = dict_with_filter(PdfObject::Array(PdfArray {
            items: vec![PdfObject::Null],
            error: None,
        }));
        assert!(decode_stream(b"", &dict).is_err());
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_roundtrip() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"compressed payload").unwrap();
        let compressed = encoder.finish().unwrap();

        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"FlateDecode")));
        assert_eq!(
            decode_stream(&compressed, &dict).unwrap(),
            b"compressed payload"
        );
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_raw_deflate_fallback() {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"no zlib wrapper").unwrap();
        let compressed = encoder.finish().unwrap();

        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"FlateDecode")));
        assert_eq!(
            decode_stream(&compressed, &dict).unwrap(),
            b"no zlib wrapper"
        );
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_garbage_reports_error() {
        let dict = dict_with_filter(PdfObject::Name(PdfName::new(*b"FlateDecode")));
        let err = decode_stream(b"not deflate at all", &dict).unwrap_err();
        assert!(err.to_string().contains("FlateDecode"));
    }
}
