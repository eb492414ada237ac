//! PDF Object Model
//!
//! The nine PDF object variants plus `Invalid`, the placeholder for
//! unreadable input. Malformation is first-class data here: string,
//! array, dictionary and stream nodes carry an optional diagnostic and
//! `failed()` reports it, so a damaged file still parses into a tree
//! that can be inspected and re-serialized.

use super::ParseResult;
use std::collections::BTreeMap;
use std::fmt;

/// A PDF number: sign-aware integer mantissa plus the count of digits
/// right of the decimal point. PDF numbers have no exponent forms, so
/// this representation round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfNumber {
    mantissa: i64,
    decimals: u32,
}

impl PdfNumber {
    pub fn from_i64(value: i64) -> Self {
        PdfNumber {
            mantissa: value,
            decimals: 0,
        }
    }

    /// Parse `[sign] digits [. digits]`. Returns `None` for anything
    /// else (empty input, exponents, stray bytes, a second dot).
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let (digits, decimals) = match bytes.iter().position(|&b| b == b'.') {
            Some(dot) => {
                let mut v = Vec::with_capacity(bytes.len() - 1);
                v.extend_from_slice(&bytes[..dot]);
                v.extend_from_slice(&bytes[dot + 1..]);
                (v, (bytes.len() - dot - 1) as u32)
            }
            None => (bytes.to_vec(), 0),
        };
        let text = std::str::from_utf8(&digits).ok()?;
        let mantissa = text.parse::<i64>().ok()?;
        Some(PdfNumber { mantissa, decimals })
    }

    /// The raw mantissa (all digits concatenated, sign applied).
    pub fn mantissa(&self) -> i64 {
        self.mantissa
    }

    /// Digits right of the decimal point; zero means integral.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn is_integer(&self) -> bool {
        self.decimals == 0
    }

    pub fn is_unsigned_integer(&self) -> bool {
        self.decimals == 0 && self.mantissa >= 0
    }

    /// Integer value, defined only for integral numbers.
    pub fn as_i64(&self) -> Option<i64> {
        self.is_integer().then_some(self.mantissa)
    }

    /// Non-negative integer value, defined only for unsigned integral
    /// numbers.
    pub fn as_u64(&self) -> Option<u64> {
        self.is_unsigned_integer().then_some(self.mantissa as u64)
    }
}

impl fmt::Display for PdfNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Zero-pad so at least decimals + 1 digits exist, then re-insert
        // the decimal point that many places from the right.
        let width = self.decimals as usize + usize::from(self.mantissa < 0) + 1;
        let mut s = format!("{:0width$}", self.mantissa, width = width);
        if self.decimals > 0 {
            s.insert(s.len() - self.decimals as usize, '.');
        }
        f.write_str(&s)
    }
}

/// A name: opaque bytes, not including the leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfName(pub Vec<u8>);

impl PdfName {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        PdfName(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PdfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A string: raw bytes plus the notation it was written in. `error` is
/// set when the literal was malformed or truncated; the bytes gathered
/// up to that point are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString {
    pub data: Vec<u8>,
    pub hex: bool,
    pub error: Option<String>,
}

impl PdfString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// An array. A parse failure in an element leaves the elements read so
/// far (including the failed one) and a diagnostic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray {
    pub items: Vec<PdfObject>,
    pub error: Option<String>,
}

impl PdfArray {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.items.get(index)
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// A dictionary. Keys are name bytes; the map keeps them unique and
/// sorted, which is also the serializer's key order. On a duplicate key
/// the first value wins and the dictionary is flagged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary {
    pub entries: BTreeMap<Vec<u8>, PdfObject>,
    pub error: Option<String>,
}

impl PdfDictionary {
    pub fn new() -> Self {
        PdfDictionary::default()
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.entries.get(key.as_bytes())
    }

    pub fn get_bytes(&self, key: &[u8]) -> Option<&PdfObject> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key.as_bytes())
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: PdfObject) {
        self.entries.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// A stream: its dictionary plus the raw body bytes between `stream`
/// and `endstream`. The body is never decoded here; `decode` runs the
/// filter chain on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub dict: PdfDictionary,
    pub data: Vec<u8>,
    pub error: Option<String>,
}

impl PdfStream {
    /// Raw (possibly compressed) body bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Body bytes after applying the `/Filter` chain.
    pub fn decode(&self) -> ParseResult<Vec<u8>> {
        super::filters::decode_stream(&self.data, &self.dict)
    }

    pub fn failed(&self) -> bool {
        self.error.is_some() || self.dict.failed()
    }
}

/// The parse-failed placeholder: a human-readable diagnostic with an
/// optional byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub message: String,
    pub offset: Option<u64>,
}

impl Invalid {
    pub fn new(message: impl Into<String>) -> Self {
        Invalid {
            message: message.into(),
            offset: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: u64) -> Self {
        Invalid {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(off) => write!(f, "{} at {}", self.message, off),
            None => f.write_str(&self.message),
        }
    }
}

/// A PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Number(PdfNumber),
    String(PdfString),
    Name(PdfName),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    Stream(PdfStream),
    /// An unresolved `num gen R` handle. Resolution belongs to an
    /// external cross-reference subsystem.
    Reference(u32, u16),
    Invalid(Invalid),
}

impl PdfObject {
    pub fn invalid(message: impl Into<String>) -> Self {
        PdfObject::Invalid(Invalid::new(message))
    }

    pub fn invalid_at(message: impl Into<String>, offset: u64) -> Self {
        PdfObject::Invalid(Invalid::at(message, offset))
    }

    /// Whether this node or (for streams) its dictionary carries a
    /// diagnostic. Children are not consulted: a parent that absorbed a
    /// failed child is flagged itself by the parsing rules.
    pub fn failed(&self) -> bool {
        match self {
            PdfObject::Null
            | PdfObject::Boolean(_)
            | PdfObject::Number(_)
            | PdfObject::Name(_)
            | PdfObject::Reference(_, _) => false,
            PdfObject::String(s) => s.failed(),
            PdfObject::Array(a) => a.failed(),
            PdfObject::Dictionary(d) => d.failed(),
            PdfObject::Stream(s) => s.failed(),
            PdfObject::Invalid(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&PdfNumber> {
        match self {
            PdfObject::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&PdfName> {
        match self {
            PdfObject::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            PdfObject::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfObject::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<(u32, u16)> {
        match self {
            PdfObject::Reference(num, gen) => Some((*num, *gen)),
            _ => None,
        }
    }
}
