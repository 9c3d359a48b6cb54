#![no_main]

use activesync_wbxml::{decode, encode, Document, Element, Node, Registry};
use arbitrary::{Arbitrary, Result, Unstructured};
use libfuzzer_sys::fuzz_target;

const MAX_DEPTH: usize = 8;

/// An element whose tag is drawn from the known vocabulary.
#[derive(Debug)]
struct Tree(Element);

fn arbitrary_element(u: &mut Unstructured<'_>, depth: usize) -> Result<Element> {
    let registry = Registry::get();
    let page = registry
        .page(u.int_in_range(0..=(registry.len() - 1) as u8)?)
        .ok_or(arbitrary::Error::IncorrectFormat)?;
    let tags: Vec<_> = page.tags().collect();
    let (_, tag) = u.choose(&tags)?;
    let mut element = Element::new(page.namespace(), *tag);

    let children = if depth >= MAX_DEPTH {
        0
    } else {
        u.int_in_range(0..=4)?
    };
    for _ in 0..children {
        let child = match u.int_in_range(0..=2)? {
            0 => Node::Element(arbitrary_element(u, depth + 1)?),
            // Inline strings are NUL-terminated.
            1 => Node::Text(String::arbitrary(u)?.replace('\0', "")),
            _ => Node::Opaque(Vec::<u8>::arbitrary(u)?.into()),
        };
        element.children.push(child);
    }
    Ok(element)
}

impl<'a> Arbitrary<'a> for Tree {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Tree(arbitrary_element(u, 1)?))
    }
}

fuzz_target!(|tree: Tree| {
    let doc = Document::new(tree.0);
    let encoded = encode(&doc).expect("vocabulary trees must encode");
    let decoded = decode(encoded).expect("encoded trees must decode");
    assert_eq!(decoded, doc);
});
