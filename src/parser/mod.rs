//! Lenient PDF Object-Layer Parser
//!
//! Turns a byte stream, possibly truncated, corrupted or
//! non-conformant, into fully-typed objects suitable for inspection
//! and re-serialization. Syntactic damage never aborts a parse: it is
//! recorded on the affected node (an [`Invalid`](objects::Invalid)
//! placeholder or an `error` field) and parsing continues. Only I/O
//! failures, unseekable inputs and codec-level problems surface as
//! [`ParseError`].

pub mod filters;
pub mod header;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod reader;
pub mod top_level;

pub use self::filters::{decode_stream, Filter};
pub use self::header::{read_version, PdfVersion};
pub use self::lexer::{classify, CharClass, Lexer, Token};
pub use self::object_stream::ObjectStreamReader;
pub use self::objects::{
    Invalid, PdfArray, PdfDictionary, PdfName, PdfNumber, PdfObject, PdfStream, PdfString,
};
pub use self::reader::read_object;
pub use self::top_level::{
    read_top_level_object, skip_to_endobj, DocumentScanner, NamedObject, StartXRef, Trailer,
    TopLevelObject, XRefSection, XRefTable,
};

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal parser errors.
///
/// Malformed PDF syntax is *not* an error here; it becomes data on the
/// returned tree. These variants cover the conditions a lenient parse
/// cannot absorb.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input cannot seek where a rescue or recovery path needs it.
    #[error("seek not supported by input")]
    SeekUnsupported,

    /// A stream filter failed or is not available.
    #[error("{filter}: {message}")]
    StreamDecode { filter: String, message: String },

    /// An object stream header or dictionary is unusable.
    #[error("object stream: {0}")]
    ObjectStream(String),
}
