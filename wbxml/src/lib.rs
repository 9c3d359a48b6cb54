//! Encode and decode ActiveSync WBXML.
//!
//! # Overview
//!
//! ActiveSync exchanges XML documents in WAP Binary XML (WBXML 1.3), with tag names replaced
//! by single-byte tokens drawn from 26 fixed code pages. This crate converts in both
//! directions:
//! - [Encoder] turns an XML string (or a [Document]) into WBXML bytes
//! - [Decoder] turns untrusted WBXML bytes into a [Document] or an XML string
//!
//! Only the subset of WBXML that ActiveSync uses is supported: no attributes, no string
//! table, no entities, literals, extensions or processing instructions. Inline strings are
//! UTF-8 and opaque payloads carry raw bytes (MIME bodies, conversation identifiers).
//!
//! The [Registry] of code pages is built once and shared. Each [Encoder] or [Decoder] is a
//! session that resets its state at the start of every call and records the tag resolutions
//! it made in a [Trace].
//!
//! # Example
//!
//! ```
//! use activesync_wbxml::{Decoder, Encoder};
//!
//! let xml = r#"<Sync xmlns="AirSync"><Collections><Collection><SyncKey>0</SyncKey></Collection></Collections></Sync>"#;
//!
//! let mut encoder = Encoder::default();
//! let wbxml = encoder.encode_xml(xml).unwrap();
//! assert_eq!(&wbxml[..4], &[0x03, 0x01, 0x6A, 0x00]);
//!
//! let mut decoder = Decoder::default().with_prefixes(encoder.prefixes().clone());
//! let decoded = decoder.decode_xml(wbxml).unwrap();
//! assert!(decoded.ends_with(xml));
//! ```
//!
//! # Leniency
//!
//! Decoding a token missing from the active code page is not fatal: the element is named
//! `UNKNOWN_TAG_<hex>` and a warning is logged. Such a document cannot be encoded again,
//! since encoding requires every tag to be known.

pub mod code_page;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod document;
pub mod encoder;
pub mod error;
pub mod token;
pub mod trace;
pub mod varint;
pub mod vocabulary;

// Re-export main types
pub use code_page::{CodePage, Prefixes, Registry};
pub use config::Config;
pub use cursor::Cursor;
pub use decoder::Decoder;
pub use document::{Declaration, Document, Element, Node};
pub use encoder::Encoder;
pub use error::Error;
pub use trace::{Direction, Resolution, Trace};

use bytes::Bytes;

/// Decodes WBXML into a [Document] with the default configuration.
pub fn decode(buf: impl Into<Bytes>) -> Result<Document, Error> {
    Decoder::default().decode(buf)
}

/// Decodes WBXML into an XML string with the default configuration.
pub fn decode_xml(buf: impl Into<Bytes>) -> Result<String, Error> {
    Decoder::default().decode_xml(buf)
}

/// Decodes WBXML into an XML string, returning an empty string on any error.
pub fn decode_xml_or_empty(buf: impl Into<Bytes>) -> String {
    Decoder::default().decode_xml_or_empty(buf)
}

/// Encodes a [Document] with the default configuration.
pub fn encode(doc: &Document) -> Result<Bytes, Error> {
    Encoder::default().encode(doc)
}

/// Encodes an XML string with the default configuration.
pub fn encode_xml(xml: &str) -> Result<Bytes, Error> {
    Encoder::default().encode_xml(xml)
}
