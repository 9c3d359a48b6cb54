//! Decode and encode ActiveSync WBXML files.

use activesync_wbxml::{Decoder, Encoder, Trace};
use bytes::Bytes;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

/// Subcommand that decodes WBXML to XML.
pub const DECODE_CMD: &str = "decode";

/// Subcommand that encodes XML to WBXML.
pub const ENCODE_CMD: &str = "encode";

/// Errors that can occur when inspecting a file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] activesync_wbxml::Error),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("input is not valid UTF-8")]
    InvalidUtf8,
}

/// Decodes WBXML bytes (raw, or hex text if `hex` is set) into XML.
pub fn decode(input: &[u8], hex: bool) -> Result<(String, Trace), Error> {
    let buf = if hex {
        let text = std::str::from_utf8(input).map_err(|_| Error::InvalidUtf8)?;
        let digits: String = text.split_whitespace().collect();
        Bytes::from(hex::decode(digits)?)
    } else {
        Bytes::copy_from_slice(input)
    };
    let mut decoder = Decoder::default();
    let xml = decoder.decode_xml(buf)?;
    Ok((xml, decoder.trace().clone()))
}

/// Encodes an XML document into WBXML.
pub fn encode(input: &[u8]) -> Result<(Bytes, Trace), Error> {
    let xml = std::str::from_utf8(input).map_err(|_| Error::InvalidUtf8)?;
    let mut encoder = Encoder::default();
    let encoded = encoder.encode_xml(xml)?;
    Ok((encoded, encoder.trace().clone()))
}

fn write_trace(trace: &Trace, out: &mut impl Write) -> Result<(), Error> {
    for resolution in trace.iter() {
        writeln!(out, "{resolution}")?;
    }
    Ok(())
}

/// Runs the `decode` subcommand, writing XML (and optionally the trace) to `out`.
pub fn run_decode(path: &Path, hex: bool, trace: bool, out: &mut impl Write) -> Result<(), Error> {
    let input = fs::read(path)?;
    debug!(path = %path.display(), len = input.len(), "read input");
    let (xml, resolutions) = decode(&input, hex)?;
    writeln!(out, "{xml}")?;
    if trace {
        write_trace(&resolutions, out)?;
    }
    Ok(())
}

/// Runs the `encode` subcommand.
///
/// The encoding is written to `output` when given, otherwise printed to `out` as hex.
pub fn run_encode(
    path: &Path,
    output: Option<&PathBuf>,
    trace: bool,
    out: &mut impl Write,
) -> Result<(), Error> {
    let input = fs::read(path)?;
    debug!(path = %path.display(), len = input.len(), "read input");
    let (encoded, resolutions) = encode(&input)?;
    match output {
        Some(output) => {
            fs::write(output, &encoded)?;
            info!(path = %output.display(), len = encoded.len(), "wrote encoding");
        }
        None => writeln!(out, "{}", hex::encode(&encoded))?,
    }
    if trace {
        write_trace(&resolutions, out)?;
    }
    Ok(())
}
