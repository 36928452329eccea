#![no_main]

use libfuzzer_sys::fuzz_target;
use skstack_rs::skstack::event::{decode_event, DecodeOptions};
use skstack_rs::skstack::sequence::SequenceOutcome;
use skstack_rs::{ErxudpDataFormat, EventCode};

fuzz_target!(|data: &[u8]| {
    let options = [
        DecodeOptions::default(),
        DecodeOptions {
            erxudp_data_format: ErxudpDataFormat::HexAscii,
            expect_pairing_id: true,
        },
    ];

    for code in EventCode::ALL {
        for options in &options {
            if let Ok(SequenceOutcome::Complete { consumed, .. }) = decode_event(code, data, options) {
                assert!(consumed <= data.len());
            }
        }
    }
});
