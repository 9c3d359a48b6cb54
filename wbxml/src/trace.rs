//! Ordered record of tag resolutions made during a single encode or decode.

use std::fmt;
use tracing::trace;

/// Direction of a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Token to tag name.
    Decode,
    /// Tag name to token.
    Encode,
}

/// A single tag resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub direction: Direction,
    pub namespace: &'static str,
    pub tag: String,
    /// Page-local token (without the content flag).
    pub token: u8,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            Direction::Decode => "<-",
            Direction::Encode => "->",
        };
        write!(
            f,
            "{}:{} {} {:#04x}",
            self.namespace, self.tag, arrow, self.token
        )
    }
}

/// Resolutions in the order they were made.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    entries: Vec<Resolution>,
}

impl Trace {
    /// Records a resolution and mirrors it as a `trace` event.
    pub(crate) fn record(
        &mut self,
        direction: Direction,
        namespace: &'static str,
        tag: &str,
        token: u8,
    ) {
        trace!(?direction, namespace, tag, token, "resolved tag");
        self.entries.push(Resolution {
            direction,
            namespace,
            tag: tag.to_string(),
            token,
        });
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns all resolutions.
    pub fn entries(&self) -> &[Resolution] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resolution> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order() {
        let mut trace = Trace::default();
        trace.record(Direction::Encode, "AirSync", "Sync", 0x05);
        trace.record(Direction::Encode, "AirSync", "Collections", 0x1C);
        let tags: Vec<_> = trace.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, ["Sync", "Collections"]);

        trace.clear();
        assert!(trace.is_empty());
    }

    #[test]
    fn test_display() {
        let mut trace = Trace::default();
        trace.record(Direction::Decode, "Email2", "ConversationIndex", 0x0A);
        assert_eq!(
            trace.entries()[0].to_string(),
            "Email2:ConversationIndex <- 0x0a"
        );
    }
}
