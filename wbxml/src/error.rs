//! Error types for WBXML operations

use thiserror::Error;

/// Error type for WBXML operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("invalid multibyte integer")]
    InvalidVarint,
    #[error("unsupported charset: {0:#x}")]
    InvalidCharset(u32),
    #[error("string table not supported: {0} bytes")]
    StringTable(u32),
    #[error("unsupported global token: {0:#04x}")]
    UnsupportedToken(u8),
    #[error("attributes not supported: tag {0:#04x}")]
    Attributes(u8),
    #[error("invalid code page: {0}")]
    InvalidCodePage(u8),
    #[error("end token outside of any element")]
    UnexpectedEnd,
    #[error("content outside of root element")]
    ContentOutsideRoot,
    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),
    #[error("unknown tag in {0}: {1}")]
    UnknownTag(String, String), // namespace, tag
    #[error("invalid utf-8 string")]
    InvalidUtf8,
    #[error("invalid base64 in {0}")]
    InvalidBase64(String), // element
    #[error("invalid data in {0}: {1}")]
    InvalidData(String, String), // context, message
    #[error("length exceeded: {0} > {1}")]
    LengthExceeded(usize, usize), // found, max
    #[error("depth exceeded: {0}")]
    DepthExceeded(usize),
    #[error("malformed xml: {0}")]
    Xml(String),
}
