//! Code page registry.
//!
//! A code page binds a namespace to up to 64 page-local tag tokens. The registry is built once
//! from [crate::vocabulary::PAGES] and shared read-only by every encoder and decoder session.
//! Per-session prefix labels live in [Prefixes], layered over each page's default.

use crate::{
    token::TAG_MASK,
    vocabulary::{Vocabulary, PAGES},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::OnceLock,
};

const TOKENS_PER_PAGE: usize = TAG_MASK as usize + 1;

/// A single vocabulary with precomputed lookups in both directions.
#[derive(Debug)]
pub struct CodePage {
    index: u8,
    namespace: &'static str,
    prefix: String,
    by_token: [Option<&'static str>; TOKENS_PER_PAGE],
    by_name: HashMap<String, u8>,
}

impl CodePage {
    fn new(index: u8, (namespace, tags): Vocabulary) -> Self {
        let mut by_token = [None; TOKENS_PER_PAGE];
        let mut by_name = HashMap::with_capacity(tags.len());
        for &(token, tag) in tags {
            by_token[(token & TAG_MASK) as usize] = Some(tag);
            by_name.insert(tag.to_ascii_lowercase(), token);
        }
        Self {
            index,
            namespace,
            prefix: namespace.to_ascii_lowercase(),
            by_token,
            by_name,
        }
    }

    /// Returns the page index used by `SWITCH_PAGE`.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Returns the canonical namespace of the page.
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Returns the default prefix label of the page.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the tag bound to `token`, if any.
    ///
    /// Only the low six bits are significant, so a raw tag byte may be passed directly.
    pub fn tag(&self, token: u8) -> Option<&'static str> {
        self.by_token[(token & TAG_MASK) as usize]
    }

    /// Returns the token bound to `tag`, ignoring ASCII case.
    pub fn token(&self, tag: &str) -> Option<u8> {
        self.by_name.get(&tag.to_ascii_lowercase()).copied()
    }

    /// Iterates over `(token, tag)` pairs in token order.
    pub fn tags(&self) -> impl Iterator<Item = (u8, &'static str)> + '_ {
        self.by_token
            .iter()
            .enumerate()
            .filter_map(|(token, tag)| tag.map(|tag| (token as u8, tag)))
    }
}

/// The fixed set of ActiveSync code pages.
#[derive(Debug)]
pub struct Registry {
    pages: Vec<CodePage>,
    by_namespace: HashMap<String, u8>,
}

impl Registry {
    /// Returns the process-wide registry, building it on first use.
    pub fn get() -> &'static Self {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let pages: Vec<CodePage> = PAGES
            .iter()
            .enumerate()
            .map(|(index, vocabulary)| CodePage::new(index as u8, *vocabulary))
            .collect();
        let by_namespace = pages
            .iter()
            .map(|page| (page.namespace.to_ascii_lowercase(), page.index))
            .collect();
        Self {
            pages,
            by_namespace,
        }
    }

    /// Returns the number of code pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if the registry holds no pages (never the case for the built-in set).
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the page at `index`.
    pub fn page(&self, index: u8) -> Option<&CodePage> {
        self.pages.get(index as usize)
    }

    /// Returns page 0, active at the start of every document.
    pub fn first(&self) -> &CodePage {
        // The registry is built from the fixed, non-empty vocabulary.
        self.pages.first().expect("registry has no code pages")
    }

    /// Finds the page bound to `namespace`, ignoring ASCII case.
    pub fn page_for_namespace(&self, namespace: &str) -> Option<&CodePage> {
        self.page(self.page_index_for_namespace(namespace)?)
    }

    /// Iterates over all pages in index order.
    pub fn iter(&self) -> impl Iterator<Item = &CodePage> {
        self.pages.iter()
    }

    /// Resolves a tag name to its token in the given page, ignoring ASCII case.
    pub fn token_for_tag(&self, page: u8, tag: &str) -> Option<u8> {
        self.page(page)?.token(tag)
    }

    /// Resolves a token to its tag name in the given page.
    pub fn tag_for_token(&self, page: u8, token: u8) -> Option<&'static str> {
        self.page(page)?.tag(token)
    }

    /// Finds the page bound to `namespace`, ignoring ASCII case.
    pub fn page_index_for_namespace(&self, namespace: &str) -> Option<u8> {
        self.by_namespace
            .get(&namespace.to_ascii_lowercase())
            .copied()
    }
}

/// Prefix labels overriding the page defaults for one document.
///
/// The encoder records `xmlns:prefix` declarations here so a later decode can render the
/// response with the same prefixes the caller used.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefixes {
    overrides: BTreeMap<u8, String>,
}

impl Prefixes {
    /// Creates an empty set (every page uses its default prefix).
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the prefix of `page`.
    pub fn set(&mut self, page: u8, prefix: impl Into<String>) {
        self.overrides.insert(page, prefix.into());
    }

    /// Returns the prefix to use for `page`.
    pub fn label<'a>(&'a self, page: &'a CodePage) -> &'a str {
        self.overrides
            .get(&page.index())
            .map(String::as_str)
            .unwrap_or(page.prefix())
    }

    /// Returns true if no page has been overridden.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Removes all overrides.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::PAGE_COUNT;

    #[test]
    fn test_registry_has_all_pages() {
        let registry = Registry::get();
        assert_eq!(registry.len(), PAGE_COUNT);
        for (index, page) in registry.iter().enumerate() {
            assert_eq!(page.index() as usize, index);
        }
        assert!(registry.page(PAGE_COUNT as u8).is_none());
    }

    #[test]
    fn test_token_for_tag_ignores_case() {
        let registry = Registry::get();
        assert_eq!(registry.token_for_tag(0, "Sync"), Some(0x05));
        assert_eq!(registry.token_for_tag(0, "sync"), Some(0x05));
        assert_eq!(registry.token_for_tag(0, "SYNCKEY"), Some(0x0B));
        assert_eq!(registry.token_for_tag(0, "Subject"), None);
        assert_eq!(registry.token_for_tag(99, "Sync"), None);
    }

    #[test]
    fn test_tag_for_token_preserves_case() {
        let registry = Registry::get();
        assert_eq!(registry.tag_for_token(0, 0x05), Some("Sync"));
        assert_eq!(registry.tag_for_token(0, 0x45), Some("Sync"));
        assert_eq!(registry.tag_for_token(22, 0x0A), Some("ConversationIndex"));
        assert_eq!(registry.tag_for_token(0, 0x3F), None);
    }

    #[test]
    fn test_same_token_differs_across_pages() {
        let registry = Registry::get();
        assert_eq!(registry.tag_for_token(0, 0x05), Some("Sync"));
        assert_eq!(registry.tag_for_token(1, 0x05), Some("Anniversary"));
        assert_eq!(registry.tag_for_token(13, 0x05), Some("Ping"));
    }

    #[test]
    fn test_page_index_for_namespace() {
        let registry = Registry::get();
        assert_eq!(registry.page_index_for_namespace("AirSync"), Some(0));
        assert_eq!(registry.page_index_for_namespace("airsyncbase"), Some(17));
        assert_eq!(registry.page_index_for_namespace("Find"), Some(25));
        assert_eq!(registry.page_index_for_namespace("urn:unknown"), None);
    }

    #[test]
    fn test_tags_round_trip() {
        let registry = Registry::get();
        for page in registry.iter() {
            for (token, tag) in page.tags() {
                assert_eq!(page.token(tag), Some(token));
            }
        }
    }

    #[test]
    fn test_first_is_airsync() {
        let first = Registry::get().first();
        assert_eq!(first.index(), 0);
        assert_eq!(first.namespace(), "AirSync");
    }

    #[test]
    fn test_prefix_overrides() {
        let registry = Registry::get();
        let email = registry.page(2).unwrap();
        let mut prefixes = Prefixes::new();
        assert_eq!(prefixes.label(email), "email");

        prefixes.set(2, "e");
        assert_eq!(prefixes.label(email), "e");
        assert_eq!(email.prefix(), "email");

        prefixes.clear();
        assert!(prefixes.is_empty());
        assert_eq!(prefixes.label(email), "email");
    }
}
