#![no_main]
use libfuzzer_sys::fuzz_target;
use wmtscaps::{convert_bytes, ConvertOptions};

fuzz_target!(|data: &[u8]| {
    let options = ConvertOptions::new().force_array("Layer");
    let _ = convert_bytes(data, &options);
});
