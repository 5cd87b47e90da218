#![no_main]
use libfuzzer_sys::fuzz_target;
use wmtscaps::{layers_from_str, ExtractConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = layers_from_str(s, &ExtractConfig::default());
    }
});
