//! Decode WBXML into an XML infoset.
//!
//! The decoder is strict about anything this profile never emits (attributes, string tables,
//! literals, extensions, entities, processing instructions) and lenient about tags missing
//! from the active code page, which become `UNKNOWN_TAG_<hex>` elements so the rest of the
//! document stays inspectable.

use crate::{
    code_page::{CodePage, Prefixes, Registry},
    cursor::Cursor,
    document::{Builder, Document, Element, Node},
    token::{self, END, HAS_ATTRIBUTES, HAS_CONTENT, OPAQUE, STR_I, SWITCH_PAGE, TAG_MASK},
    trace::{Direction, Trace},
    Config, Error,
};
use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Prefix of the name given to elements whose token is not in the active code page.
pub const UNKNOWN_TAG_PREFIX: &str = "UNKNOWN_TAG_";

/// A decoding session.
///
/// Session state (the active code page and the trace) is reset at the start of every call, so
/// one decoder may be reused across unrelated documents.
#[derive(Debug)]
pub struct Decoder {
    cfg: Config,
    registry: &'static Registry,
    prefixes: Prefixes,
    page: &'static CodePage,
    trace: Trace,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Decoder {
    pub fn new(cfg: Config) -> Self {
        let registry = Registry::get();
        Self {
            cfg,
            registry,
            prefixes: Prefixes::default(),
            page: registry.first(),
            trace: Trace::default(),
        }
    }

    /// Sets the prefix labels used when rendering XML (typically from [crate::Encoder::prefixes]).
    pub fn with_prefixes(mut self, prefixes: Prefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Returns the tag resolutions made by the last call.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Returns the code page active at the end of the last call.
    pub fn current_page(&self) -> u8 {
        self.page.index()
    }

    /// Decodes a WBXML buffer into a [Document].
    pub fn decode(&mut self, buf: impl Into<Bytes>) -> Result<Document, Error> {
        self.page = self.registry.first();
        self.trace.clear();

        let mut cursor = Cursor::new(buf);
        Self::read_header(&mut cursor)?;

        let mut builder = Builder::default();
        while cursor.has_remaining() {
            match cursor.read_u8()? {
                SWITCH_PAGE => {
                    let index = cursor.read_u8()?;
                    self.page = self
                        .registry
                        .page(index)
                        .ok_or(Error::InvalidCodePage(index))?;
                    trace!(page = index, "switched code page");
                }
                END => builder.close()?,
                OPAQUE => {
                    let len = cursor.read_mb_u32()? as usize;
                    self.cfg.check_opaque_len(len)?;
                    let data = cursor.read_bytes(len)?;
                    builder.push(Node::Opaque(data))?;
                }
                STR_I => {
                    let text = cursor.read_cstr()?;
                    builder.push(Node::Text(text))?;
                }
                byte if token::is_unsupported(byte) => {
                    return Err(Error::UnsupportedToken(byte));
                }
                byte if byte & HAS_ATTRIBUTES != 0 => {
                    return Err(Error::Attributes(byte));
                }
                byte => {
                    let element = self.resolve(byte & TAG_MASK);
                    self.cfg.check_depth(builder.depth() + 1)?;
                    if byte & HAS_CONTENT != 0 {
                        builder.open(element)?;
                    } else {
                        builder.leaf(element)?;
                    }
                }
            }
        }

        if builder.depth() > 0 {
            debug!(open = builder.depth(), "closing unterminated elements");
        }
        let doc = builder.finish()?;
        debug!(
            resolutions = self.trace.len(),
            page = self.page.index(),
            "decoded document"
        );
        Ok(doc)
    }

    /// Decodes a WBXML buffer into an XML string.
    ///
    /// A buffer holding only a header decodes to an empty string.
    pub fn decode_xml(&mut self, buf: impl Into<Bytes>) -> Result<String, Error> {
        let doc = self.decode(buf)?;
        doc.to_xml_with(&self.prefixes)
    }

    /// Decodes a WBXML buffer into an XML string, returning an empty string on any error.
    ///
    /// Use [Decoder::decode_xml] to tell a failed decode apart from an empty document.
    pub fn decode_xml_or_empty(&mut self, buf: impl Into<Bytes>) -> String {
        match self.decode_xml(buf) {
            Ok(xml) => xml,
            Err(err) => {
                warn!(?err, "failed to decode document");
                String::new()
            }
        }
    }

    fn read_header(cursor: &mut Cursor) -> Result<(), Error> {
        let version = cursor.read_u8()?;
        let public_id = cursor.read_mb_u32()?;
        let charset = cursor.read_mb_u32()?;
        if charset != token::CHARSET_UTF8 {
            return Err(Error::InvalidCharset(charset));
        }
        let string_table = cursor.read_mb_u32()?;
        if string_table != 0 {
            return Err(Error::StringTable(string_table));
        }
        trace!(version, public_id, "read header");
        Ok(())
    }

    fn resolve(&mut self, token: u8) -> Element {
        let namespace = self.page.namespace();
        let name = match self.page.tag(token) {
            Some(tag) => tag.to_string(),
            None => {
                warn!(namespace, token, "unknown tag");
                format!("{UNKNOWN_TAG_PREFIX}{token:02X}")
            }
        };
        if self.cfg.trace {
            self.trace.record(Direction::Decode, namespace, &name, token);
        }
        Element::new(namespace, name)
    }
}
