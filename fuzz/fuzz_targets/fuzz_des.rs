#![no_main]

use blobwire::Codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any successful decode must re-encode and decode to the same value.
    let codec = Codec::new();
    if let Ok(value) = codec.des(data) {
        if let Ok(encoded) = codec.ser(&value) {
            assert_eq!(codec.des(&encoded).ok(), Some(value));
        }
    }
    let _ = codec.des_all(data);
});
