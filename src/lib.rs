//! # pdf-salvage
//!
//! A lenient, recoverable parser for the PDF file syntax: the object
//! layer of the Portable Document Format. It turns a byte stream,
//! possibly truncated or corrupted, into a sequence of fully-typed
//! objects suitable for inspection, re-serialization and further
//! processing.
//!
//! The parser never gives up on syntactic damage: every byte region
//! either becomes a typed node or is covered by an `Invalid` placeholder
//! carrying a diagnostic with the byte offset where detection occurred,
//! and the whole tree can always be dumped back out with the
//! diagnostics rendered as `% !!! ` comments.
//!
//! ## Reading a document
//!
//! ```rust
//! use pdf_salvage::parser::{DocumentScanner, TopLevelObject};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), pdf_salvage::parser::ParseError> {
//! let data = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";
//! let mut scanner = DocumentScanner::new(Cursor::new(data.to_vec()))?;
//!
//! assert_eq!(scanner.read_version()?.map(|v| v.to_string()), Some("1.7".into()));
//! loop {
//!     match scanner.next_object()? {
//!         TopLevelObject::Eof => break,
//!         TopLevelObject::Object(named) => {
//!             println!("{} {} obj", named.num, named.gen);
//!         }
//!         other => println!("{:?}", other),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Scope
//!
//! The crate parses and re-serializes syntax only. Cross-reference
//! validation, object resolution, page-tree semantics, content streams,
//! rendering and encryption belong to external collaborators; indirect
//! references are returned as unresolved `(num, gen)` handles.

pub mod parser;
pub mod serializer;

pub use parser::{
    DocumentScanner, ObjectStreamReader, ParseError, ParseResult, PdfArray, PdfDictionary,
    PdfName, PdfNumber, PdfObject, PdfStream, PdfString, PdfVersion, TopLevelObject,
};
