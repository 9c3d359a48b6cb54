//! XML infoset: elements, text and opaque payloads.
//!
//! A [Document] is the format-independent content exchanged with the codec. It can be parsed
//! from and rendered to XML text. Namespace declarations are kept on the element that carries
//! them because the encoder uses them to pick code pages and prefix labels. No other
//! attributes are represented.

use crate::{
    code_page::{Prefixes, Registry},
    Config, Error,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::{Bytes, BytesMut};
use quick_xml::{
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    name::{Namespace, PrefixDeclaration, ResolveResult},
    reader::NsReader,
    writer::Writer,
};
use std::collections::HashSet;

/// Elements whose opaque payload is binary and appears as base64 text in XML.
pub const BINARY_ELEMENTS: [&str; 2] = ["ConversationId", "ConversationIndex"];

/// Returns true if opaque content of `name` is binary.
pub fn is_binary(name: &str) -> bool {
    BINARY_ELEMENTS.contains(&name)
}

/// A node of the infoset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Raw bytes, rendered as CDATA.
    Opaque(Bytes),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// A namespace declaration (`xmlns` or `xmlns:prefix`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// `None` for a default namespace declaration.
    pub prefix: Option<String>,
    pub namespace: String,
}

/// An element with its namespace, local name and ordered children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub namespace: String,
    pub name: String,
    pub declarations: Vec<Declaration>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            declarations: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a child node.
    pub fn with(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends a text child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with(Node::Text(text.into()))
    }

    /// Appends an opaque child.
    pub fn with_opaque(self, data: impl Into<Bytes>) -> Self {
        self.with(Node::Opaque(data.into()))
    }

    /// Adds a namespace declaration.
    pub fn with_declaration(mut self, prefix: Option<&str>, namespace: impl Into<String>) -> Self {
        self.declarations.push(Declaration {
            prefix: prefix.map(str::to_string),
            namespace: namespace.into(),
        });
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Iterates over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Returns the first child element named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    /// Returns the concatenated text children, if any.
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for child in &self.children {
            if let Node::Text(value) = child {
                text.get_or_insert_with(String::new).push_str(value);
            }
        }
        text
    }
}

/// An XML document with at most one root element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub root: Option<Element>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root: Some(root) }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Parses an XML string with the default [Config].
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        Self::from_xml_cfg(xml, &Config::default())
    }

    /// Parses an XML string.
    ///
    /// Whitespace-only text is treated as formatting and dropped. CDATA sections become
    /// [Node::Opaque]; under [BINARY_ELEMENTS] their content must be base64.
    pub fn from_xml_cfg(xml: &str, cfg: &Config) -> Result<Self, Error> {
        let mut reader = NsReader::from_str(xml);
        let mut builder = Builder::default();
        loop {
            match reader.read_resolved_event().map_err(xml_error)? {
                (resolved, Event::Start(start)) => {
                    let element = parse_element(&resolved, &start)?;
                    cfg.check_depth(builder.depth() + 1)?;
                    builder.open(element)?;
                }
                (resolved, Event::Empty(start)) => {
                    let element = parse_element(&resolved, &start)?;
                    cfg.check_depth(builder.depth() + 1)?;
                    builder.leaf(element)?;
                }
                (_, Event::End(_)) => builder.close()?,
                (_, Event::Text(text)) => {
                    let text = text.unescape().map_err(xml_error)?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    builder.append_text(&text)?;
                }
                (_, Event::CData(cdata)) => {
                    let raw = cdata.into_inner();
                    let parent = builder.current().ok_or(Error::ContentOutsideRoot)?;
                    let data = if is_binary(&parent.name) {
                        let encoded = std::str::from_utf8(&raw).map_err(|_| Error::InvalidUtf8)?;
                        BASE64
                            .decode(encoded.trim())
                            .map_err(|_| Error::InvalidBase64(parent.name.clone()))?
                    } else {
                        let text = std::str::from_utf8(&raw).map_err(|_| Error::InvalidUtf8)?;
                        opaque_bytes(text)
                    };
                    cfg.check_opaque_len(data.len())?;
                    builder.append_opaque(&data)?;
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }
        if builder.depth() > 0 {
            return Err(Error::Xml("unclosed element at end of input".to_string()));
        }
        builder.finish()
    }

    /// Renders the document using the default prefix labels.
    pub fn to_xml(&self) -> Result<String, Error> {
        self.to_xml_with(&Prefixes::default())
    }

    /// Renders the document as XML with an `<?xml version="1.0" encoding="utf-8"?>` declaration.
    ///
    /// The root namespace is declared as the default namespace and every other namespace in
    /// use is declared on the root with its prefix label. An empty document renders as an
    /// empty string.
    pub fn to_xml_with(&self, prefixes: &Prefixes) -> Result<String, Error> {
        let Some(root) = &self.root else {
            return Ok(String::new());
        };
        let bindings = Bindings::new(root, prefixes);
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(xml_error)?;
        write_element(&mut writer, root, &bindings, true)?;
        String::from_utf8(writer.into_inner()).map_err(|_| Error::InvalidUtf8)
    }
}

/// Incrementally builds a [Document] from open/close events.
#[derive(Debug, Default)]
pub(crate) struct Builder {
    stack: Vec<Element>,
    root: Option<Element>,
}

impl Builder {
    /// Returns the number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the innermost open element.
    pub fn current(&self) -> Option<&Element> {
        self.stack.last()
    }

    /// Opens an element; subsequent nodes become its children until [Builder::close].
    pub fn open(&mut self, element: Element) -> Result<(), Error> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::ContentOutsideRoot);
        }
        self.stack.push(element);
        Ok(())
    }

    /// Adds an element without content.
    pub fn leaf(&mut self, element: Element) -> Result<(), Error> {
        self.attach(element)
    }

    /// Closes the innermost open element.
    pub fn close(&mut self) -> Result<(), Error> {
        let element = self.stack.pop().ok_or(Error::UnexpectedEnd)?;
        self.attach(element)
    }

    /// Appends a node to the innermost open element.
    pub fn push(&mut self, node: Node) -> Result<(), Error> {
        let parent = self.stack.last_mut().ok_or(Error::ContentOutsideRoot)?;
        parent.children.push(node);
        Ok(())
    }

    /// Appends text, merging with a preceding text node.
    pub fn append_text(&mut self, text: &str) -> Result<(), Error> {
        let parent = self.stack.last_mut().ok_or(Error::ContentOutsideRoot)?;
        match parent.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(text),
            _ => parent.children.push(Node::Text(text.to_string())),
        }
        Ok(())
    }

    /// Appends opaque bytes, merging with a preceding opaque node.
    ///
    /// Rendering splits a payload containing `]]>` across CDATA sections; merging restores it.
    pub fn append_opaque(&mut self, data: &[u8]) -> Result<(), Error> {
        let parent = self.stack.last_mut().ok_or(Error::ContentOutsideRoot)?;
        match parent.children.last_mut() {
            Some(Node::Opaque(existing)) => {
                let mut merged = BytesMut::from(&existing[..]);
                merged.extend_from_slice(data);
                *existing = merged.freeze();
            }
            _ => parent
                .children
                .push(Node::Opaque(Bytes::copy_from_slice(data))),
        }
        Ok(())
    }

    /// Closes any elements left open and returns the document.
    pub fn finish(mut self) -> Result<Document, Error> {
        while !self.stack.is_empty() {
            self.close()?;
        }
        Ok(Document { root: self.root })
    }

    fn attach(&mut self, element: Element) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None if self.root.is_none() => self.root = Some(element),
            None => return Err(Error::ContentOutsideRoot),
        }
        Ok(())
    }
}

fn xml_error(err: impl std::fmt::Display) -> Error {
    Error::Xml(err.to_string())
}

fn utf8(raw: &[u8]) -> Result<String, Error> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| Error::InvalidUtf8)
}

fn parse_element(resolved: &ResolveResult, start: &BytesStart) -> Result<Element, Error> {
    let namespace = match resolved {
        ResolveResult::Bound(Namespace(namespace)) => utf8(namespace)?,
        ResolveResult::Unbound => String::new(),
        ResolveResult::Unknown(prefix) => {
            return Err(Error::Xml(format!(
                "undeclared prefix: {}",
                String::from_utf8_lossy(prefix)
            )))
        }
    };
    let mut element = Element::new(namespace, utf8(start.local_name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let prefix = match attribute.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => None,
            Some(PrefixDeclaration::Named(prefix)) => Some(utf8(prefix)?),
            None => continue,
        };
        let namespace = attribute.unescape_value().map_err(xml_error)?;
        element.declarations.push(Declaration {
            prefix,
            namespace: namespace.into_owned(),
        });
    }
    Ok(element)
}

/// Prefix assignments for one rendered document.
struct Bindings {
    default: String,
    prefixed: Vec<(String, String)>, // namespace, prefix
}

impl Bindings {
    fn new(root: &Element, prefixes: &Prefixes) -> Self {
        let registry = Registry::get();
        let mut namespaces = Vec::new();
        collect_namespaces(root, &mut namespaces);

        let mut taken = HashSet::new();
        let mut prefixed = Vec::new();
        for namespace in namespaces {
            if namespace == root.namespace || namespace.is_empty() {
                continue;
            }
            let page = registry
                .page_index_for_namespace(&namespace)
                .and_then(|index| registry.page(index));
            let base = match page {
                Some(page) => prefixes.label(page).to_string(),
                None => format!("ns{}", prefixed.len()),
            };
            let mut label = base.clone();
            let mut suffix = prefixed.len();
            while taken.contains(&label) {
                label = format!("{base}{suffix}");
                suffix += 1;
            }
            taken.insert(label.clone());
            prefixed.push((namespace, label));
        }
        Self {
            default: root.namespace.clone(),
            prefixed,
        }
    }

    fn prefix(&self, namespace: &str) -> Option<&str> {
        self.prefixed
            .iter()
            .find(|(bound, _)| bound == namespace)
            .map(|(_, prefix)| prefix.as_str())
    }

    fn qualified(&self, element: &Element) -> String {
        if element.namespace == self.default {
            return element.name.clone();
        }
        match self.prefix(&element.namespace) {
            Some(prefix) => format!("{prefix}:{}", element.name),
            None => element.name.clone(),
        }
    }
}

fn collect_namespaces(element: &Element, namespaces: &mut Vec<String>) {
    if !namespaces.contains(&element.namespace) {
        namespaces.push(element.namespace.clone());
    }
    for child in element.elements() {
        collect_namespaces(child, namespaces);
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    bindings: &Bindings,
    root: bool,
) -> Result<(), Error> {
    let name = bindings.qualified(element);
    let mut start = BytesStart::new(name.as_str());
    if root {
        if !bindings.default.is_empty() {
            start.push_attribute(("xmlns", bindings.default.as_str()));
        }
        for (namespace, prefix) in &bindings.prefixed {
            start.push_attribute((format!("xmlns:{prefix}").as_str(), namespace.as_str()));
        }
    } else if element.namespace.is_empty() && !bindings.default.is_empty() {
        start.push_attribute(("xmlns", ""));
    }

    if !element.has_children() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child, bindings, false)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_error)?,
            Node::Opaque(data) => write_opaque(writer, &element.name, data)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(xml_error)
}

/// Maps CDATA text back to opaque bytes, one byte per character.
///
/// Text holding characters above U+00FF cannot come from [write_opaque] and is taken as UTF-8.
fn opaque_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c).ok())
        .collect::<Option<Vec<u8>>>()
        .unwrap_or_else(|| text.as_bytes().to_vec())
}

fn write_opaque(writer: &mut Writer<Vec<u8>>, parent: &str, data: &[u8]) -> Result<(), Error> {
    let content = if is_binary(parent) {
        BASE64.encode(data)
    } else {
        data.iter().map(|&b| char::from(b)).collect()
    };

    // A CDATA section cannot contain its own terminator, so split around it.
    let mut rest = content.as_str();
    while let Some(index) = rest.find("]]>") {
        let (head, tail) = rest.split_at(index + 2);
        writer
            .write_event(Event::CData(BytesCData::new(head)))
            .map_err(xml_error)?;
        rest = tail;
    }
    writer
        .write_event(Event::CData(BytesCData::new(rest)))
        .map_err(xml_error)
}
