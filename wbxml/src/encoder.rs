//! Encode an XML infoset as WBXML.

use crate::{
    code_page::{CodePage, Prefixes, Registry},
    document::{Declaration, Document, Element, Node},
    token::{CHARSET_UTF8, END, HAS_CONTENT, OPAQUE, PUBLIC_ID, STR_I, SWITCH_PAGE, VERSION},
    trace::{Direction, Trace},
    varint, Config, Error,
};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

/// An encoding session.
///
/// Every failure is fatal: an element outside the 26 known namespaces, or missing from its
/// namespace's vocabulary, would produce a message the peer cannot parse.
#[derive(Debug)]
pub struct Encoder {
    cfg: Config,
    registry: &'static Registry,
    current: &'static CodePage,
    default: &'static CodePage,
    prefixes: Prefixes,
    trace: Trace,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Encoder {
    pub fn new(cfg: Config) -> Self {
        let registry = Registry::get();
        Self {
            cfg,
            registry,
            current: registry.first(),
            default: registry.first(),
            prefixes: Prefixes::default(),
            trace: Trace::default(),
        }
    }

    /// Returns the prefix labels declared by the last encoded document.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    /// Returns the tag resolutions made by the last call.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Returns the page used for elements without a namespace.
    pub fn default_page(&self) -> u8 {
        self.default.index()
    }

    /// Encodes a document.
    pub fn encode(&mut self, doc: &Document) -> Result<Bytes, Error> {
        self.current = self.registry.first();
        self.default = self.registry.first();
        self.prefixes.clear();
        self.trace.clear();

        let mut buf = BytesMut::new();
        buf.put_u8(VERSION);
        varint::write(PUBLIC_ID, &mut buf);
        varint::write(CHARSET_UTF8, &mut buf);
        varint::write(0, &mut buf); // string table length
        if let Some(root) = &doc.root {
            self.write_element(root, &mut buf, 1)?;
        }
        debug!(
            len = buf.len(),
            resolutions = self.trace.len(),
            "encoded document"
        );
        Ok(buf.freeze())
    }

    /// Parses an XML string and encodes it.
    pub fn encode_xml(&mut self, xml: &str) -> Result<Bytes, Error> {
        let doc = Document::from_xml_cfg(xml, &self.cfg)?;
        self.encode(&doc)
    }

    fn declare(&mut self, declaration: &Declaration) {
        let Some(page) = self.registry.page_for_namespace(&declaration.namespace) else {
            debug!(
                namespace = declaration.namespace,
                "ignoring declaration of unknown namespace"
            );
            return;
        };
        match &declaration.prefix {
            None => self.default = page,
            Some(prefix) => self.prefixes.set(page.index(), prefix.clone()),
        }
    }

    fn page_of(&self, element: &Element) -> Result<&'static CodePage, Error> {
        if element.namespace.is_empty() {
            return Ok(self.default);
        }
        self.registry
            .page_for_namespace(&element.namespace)
            .ok_or_else(|| Error::UnknownNamespace(element.namespace.clone()))
    }

    fn write_element(
        &mut self,
        element: &Element,
        buf: &mut BytesMut,
        depth: usize,
    ) -> Result<(), Error> {
        self.cfg.check_depth(depth)?;
        for declaration in &element.declarations {
            self.declare(declaration);
        }

        let page = self.page_of(element)?;
        if page.index() != self.current.index() {
            buf.put_u8(SWITCH_PAGE);
            buf.put_u8(page.index());
            trace!(page = page.index(), "switched code page");
            self.current = page;
        }

        let token = page.token(&element.name).ok_or_else(|| {
            Error::UnknownTag(page.namespace().to_string(), element.name.clone())
        })?;
        if self.cfg.trace {
            self.trace
                .record(Direction::Encode, page.namespace(), &element.name, token);
        }

        if !element.has_children() {
            buf.put_u8(token);
            return Ok(());
        }
        buf.put_u8(token | HAS_CONTENT);
        for child in &element.children {
            match child {
                Node::Element(child) => self.write_element(child, buf, depth + 1)?,
                Node::Text(text) => write_text(text, buf)?,
                Node::Opaque(data) => self.write_opaque(data, buf)?,
            }
        }
        buf.put_u8(END);
        Ok(())
    }

    fn write_opaque(&self, data: &[u8], buf: &mut BytesMut) -> Result<(), Error> {
        self.cfg.check_opaque_len(data.len())?;
        let len = u32::try_from(data.len())
            .map_err(|_| Error::LengthExceeded(data.len(), u32::MAX as usize))?;
        buf.reserve(1 + varint::size(len) + data.len());
        buf.put_u8(OPAQUE);
        varint::write(len, buf);
        buf.put_slice(data);
        Ok(())
    }
}

fn write_text(text: &str, buf: &mut BytesMut) -> Result<(), Error> {
    if text.contains('\0') {
        return Err(Error::InvalidData(
            "inline string".to_string(),
            "contains NUL".to_string(),
        ));
    }
    buf.put_u8(STR_I);
    buf.put_slice(text.as_bytes());
    buf.put_u8(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 4] = [0x03, 0x01, 0x6A, 0x00];

    fn body(encoded: &[u8]) -> &[u8] {
        assert_eq!(&encoded[..4], &HEADER);
        &encoded[4..]
    }

    #[test]
    fn test_encode_empty_document() {
        let encoded = Encoder::default().encode(&Document::default()).unwrap();
        assert_eq!(&encoded[..], &HEADER);
    }

    #[test]
    fn test_encode_sync_with_text() {
        let doc = Document::new(Element::new("AirSync", "Sync").with_text("0"));
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(body(&encoded), &[0x45, 0x03, 0x30, 0x00, 0x01]);
    }

    #[test]
    fn test_encode_leaf_has_no_content_flag() {
        let doc = Document::new(
            Element::new("AirSync", "Sync").with(Element::new("AirSync", "SyncKey")),
        );
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(body(&encoded), &[0x45, 0x0B, 0x01]);
    }

    #[test]
    fn test_encode_switches_page_once_for_siblings() {
        let doc = Document::new(
            Element::new("AirSync", "ApplicationData")
                .with(Element::new("Email", "Subject").with_text("a"))
                .with(Element::new("Email", "Read").with_text("1")),
        );
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(
            body(&encoded),
            &[
                0x5D, // ApplicationData
                0x00, 0x02, // SWITCH_PAGE Email
                0x54, 0x03, b'a', 0x00, 0x01, // Subject
                0x55, 0x03, b'1', 0x00, 0x01, // Read
                0x01,
            ]
        );
        let switches = body(&encoded)
            .windows(2)
            .filter(|w| *w == [SWITCH_PAGE, 0x02])
            .count();
        assert_eq!(switches, 1);
    }

    #[test]
    fn test_encode_switches_back() {
        let doc = Document::new(
            Element::new("AirSync", "Sync")
                .with(Element::new("AirSyncBase", "Body"))
                .with(Element::new("AirSync", "SyncKey")),
        );
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(
            body(&encoded),
            &[0x45, 0x00, 0x11, 0x0A, 0x00, 0x00, 0x0B, 0x01]
        );
    }

    #[test]
    fn test_encode_unknown_tag() {
        let doc = Document::new(Element::new("AirSync", "Subject"));
        assert!(matches!(
            Encoder::default().encode(&doc),
            Err(Error::UnknownTag(namespace, tag)) if namespace == "AirSync" && tag == "Subject"
        ));
    }

    #[test]
    fn test_encode_unknown_namespace() {
        let doc = Document::new(Element::new("urn:example", "Sync"));
        assert!(matches!(
            Encoder::default().encode(&doc),
            Err(Error::UnknownNamespace(namespace)) if namespace == "urn:example"
        ));
    }

    #[test]
    fn test_encode_tag_case_insensitive() {
        let doc = Document::new(Element::new("airsync", "sync"));
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(body(&encoded), &[0x05]);
    }

    #[test]
    fn test_encode_opaque() {
        let doc = Document::new(
            Element::new("Email2", "ConversationIndex").with_opaque(vec![0xCA, 0xFE]),
        );
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(
            body(&encoded),
            &[0x00, 0x16, 0x4A, 0xC3, 0x02, 0xCA, 0xFE, 0x01]
        );
    }

    #[test]
    fn test_encode_opaque_long_length() {
        let doc =
            Document::new(Element::new("ComposeMail", "Mime").with_opaque(vec![b'x'; 300]));
        let encoded = Encoder::default().encode(&doc).unwrap();
        assert_eq!(&body(&encoded)[..6], &[0x00, 0x15, 0x50, 0xC3, 0x82, 0x2C]);
        assert_eq!(body(&encoded).len(), 6 + 300 + 1);
    }

    #[test]
    fn test_encode_text_with_nul() {
        let doc = Document::new(Element::new("Email", "Subject").with_text("a\0b"));
        assert!(matches!(
            Encoder::default().encode(&doc),
            Err(Error::InvalidData(..))
        ));
    }

    #[test]
    fn test_encode_default_namespace_from_declaration() {
        let doc = Document::new(
            Element::new("", "Ping")
                .with_declaration(None, "Ping")
                .with(Element::new("", "HeartbeatInterval").with_text("60")),
        );
        let mut encoder = Encoder::default();
        let encoded = encoder.encode(&doc).unwrap();
        assert_eq!(
            body(&encoded),
            &[0x00, 0x0D, 0x45, 0x48, 0x03, b'6', b'0', 0x00, 0x01, 0x01]
        );
        assert_eq!(encoder.default_page(), 13);
    }

    #[test]
    fn test_encode_records_prefixes() {
        let xml = r#"<Sync xmlns="AirSync" xmlns:asb="AirSyncBase"><asb:Body/></Sync>"#;
        let mut encoder = Encoder::default();
        encoder.encode_xml(xml).unwrap();
        let airsyncbase = Registry::get().page(17).unwrap();
        assert_eq!(encoder.prefixes().label(airsyncbase), "asb");

        // Overrides do not leak into the next document.
        encoder.encode_xml(r#"<Sync xmlns="AirSync"/>"#).unwrap();
        assert!(encoder.prefixes().is_empty());
    }

    #[test]
    fn test_encode_ignores_unknown_declarations() {
        let xml = r#"<Sync xmlns="AirSync" xmlns:x="urn:other"/>"#;
        let encoded = Encoder::default().encode_xml(xml).unwrap();
        assert_eq!(body(&encoded), &[0x05]);
    }

    #[test]
    fn test_encode_trace() {
        let doc = Document::new(
            Element::new("AirSync", "Sync").with(Element::new("AirSyncBase", "Body")),
        );
        let mut encoder = Encoder::default();
        encoder.encode(&doc).unwrap();
        let entries: Vec<_> = encoder
            .trace()
            .iter()
            .map(|r| (r.direction, r.namespace, r.token))
            .collect();
        assert_eq!(
            entries,
            [
                (Direction::Encode, "AirSync", 0x05),
                (Direction::Encode, "AirSyncBase", 0x0A)
            ]
        );
    }

    #[test]
    fn test_encode_depth_limit() {
        let doc = Document::new(
            Element::new("AirSync", "Sync").with(
                Element::new("AirSync", "Collections")
                    .with(Element::new("AirSync", "Collection")),
            ),
        );
        let mut encoder = Encoder::new(Config {
            max_depth: 2,
            ..Config::default()
        });
        assert!(matches!(encoder.encode(&doc), Err(Error::DepthExceeded(3))));
    }
}
