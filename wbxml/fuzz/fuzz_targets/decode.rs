#![no_main]

use activesync_wbxml::{Config, Decoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::new(Config {
        max_depth: 64,
        max_opaque_len: 1024 * 1024,
        trace: true,
    });

    // Any outcome is acceptable as long as decoding returns.
    let _ = decoder.decode_xml(data.to_vec());
    let _ = decoder.decode_xml_or_empty(data.to_vec());
});
