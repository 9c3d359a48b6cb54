//! WBXML global tokens and tag-byte flags.
//!
//! Global tokens carry the same meaning in every code page. Only [SWITCH_PAGE], [END],
//! [STR_I] and [OPAQUE] are used by ActiveSync; the rest are recognized so they can be
//! rejected.

/// Changes the active code page. Followed by a single page index byte.
pub const SWITCH_PAGE: u8 = 0x00;
/// Closes the innermost open element.
pub const END: u8 = 0x01;
/// Character entity. Followed by a multibyte integer.
pub const ENTITY: u8 = 0x02;
/// Inline null-terminated string.
pub const STR_I: u8 = 0x03;
/// Unknown tag or attribute name (string table reference).
pub const LITERAL: u8 = 0x04;
pub const EXT_I_0: u8 = 0x40;
pub const EXT_I_1: u8 = 0x41;
pub const EXT_I_2: u8 = 0x42;
/// Processing instruction.
pub const PI: u8 = 0x43;
pub const LITERAL_C: u8 = 0x44;
pub const EXT_T_0: u8 = 0x80;
pub const EXT_T_1: u8 = 0x81;
pub const EXT_T_2: u8 = 0x82;
/// String table reference.
pub const STR_T: u8 = 0x83;
pub const LITERAL_A: u8 = 0x84;
pub const EXT_0: u8 = 0xC0;
pub const EXT_1: u8 = 0xC1;
pub const EXT_2: u8 = 0xC2;
/// Length-prefixed raw bytes.
pub const OPAQUE: u8 = 0xC3;
pub const LITERAL_AC: u8 = 0xC4;

/// Set on a tag byte when the element carries attributes.
pub const HAS_ATTRIBUTES: u8 = 0x80;
/// Set on a tag byte when the element has content terminated by [END].
pub const HAS_CONTENT: u8 = 0x40;
/// Bits of a tag byte holding the page-local token.
pub const TAG_MASK: u8 = 0x3F;

/// WBXML version 1.3.
pub const VERSION: u8 = 0x03;
/// Public identifier "unknown or missing".
pub const PUBLIC_ID: u32 = 0x01;
/// IANA MIBenum for UTF-8.
pub const CHARSET_UTF8: u32 = 0x6A;

/// Returns true if `byte` is a global token this profile refuses to decode.
pub fn is_unsupported(byte: u8) -> bool {
    matches!(
        byte,
        ENTITY
            | LITERAL
            | EXT_I_0
            | EXT_I_1
            | EXT_I_2
            | PI
            | LITERAL_C
            | EXT_T_0
            | EXT_T_1
            | EXT_T_2
            | STR_T
            | LITERAL_A
            | EXT_0
            | EXT_1
            | EXT_2
            | LITERAL_AC
    )
}
