//! Limits applied to a codec session.
//!
//! Decoded input is untrusted: nesting depth and opaque payload sizes are bounded before any
//! allocation happens.

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default maximum size of a single opaque payload (32 MiB).
pub const DEFAULT_MAX_OPAQUE_LEN: usize = 32 * 1024 * 1024;

/// Configuration for an [crate::Encoder] or [crate::Decoder].
///
/// # Examples
///
/// ```
/// use activesync_wbxml::Config;
///
/// let cfg = Config {
///     max_depth: 32,
///     ..Config::default()
/// };
/// assert!(cfg.trace);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth.
    pub max_depth: usize,

    /// Maximum length of a single opaque payload.
    pub max_opaque_len: usize,

    /// Whether tag resolutions are recorded in the session [crate::Trace].
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_opaque_len: DEFAULT_MAX_OPAQUE_LEN,
            trace: true,
        }
    }
}

impl Config {
    /// Returns a configuration without limits.
    pub fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
            max_opaque_len: usize::MAX,
            ..Self::default()
        }
    }

    /// Returns an error if `depth` exceeds the configured maximum.
    pub(crate) fn check_depth(&self, depth: usize) -> Result<(), crate::Error> {
        if depth > self.max_depth {
            return Err(crate::Error::DepthExceeded(depth));
        }
        Ok(())
    }

    /// Returns an error if an opaque payload of `len` bytes exceeds the configured maximum.
    pub(crate) fn check_opaque_len(&self, len: usize) -> Result<(), crate::Error> {
        if len > self.max_opaque_len {
            return Err(crate::Error::LengthExceeded(len, self.max_opaque_len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_check_depth() {
        let cfg = Config {
            max_depth: 2,
            ..Config::default()
        };
        assert!(cfg.check_depth(2).is_ok());
        assert!(matches!(cfg.check_depth(3), Err(Error::DepthExceeded(3))));
    }

    #[test]
    fn test_check_opaque_len() {
        let cfg = Config {
            max_opaque_len: 4,
            ..Config::default()
        };
        assert!(cfg.check_opaque_len(4).is_ok());
        assert!(matches!(
            cfg.check_opaque_len(5),
            Err(Error::LengthExceeded(5, 4))
        ));
    }

    #[test]
    fn test_unbounded() {
        let cfg = Config::unbounded();
        assert!(cfg.check_depth(usize::MAX).is_ok());
        assert!(cfg.check_opaque_len(usize::MAX).is_ok());
    }
}
