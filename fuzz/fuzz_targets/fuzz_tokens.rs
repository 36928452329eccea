#![no_main]

use libfuzzer_sys::fuzz_target;
use skstack_rs::skstack::{frame, token};
use skstack_rs::ProtocolSyntax;

fuzz_target!(|data: &[u8]| {
    let _ = token::uint8(data);
    let _ = token::uint16(data);
    let _ = token::uint32(data);
    let _ = token::uint64(data);
    let _ = token::decimal_number(data);
    let _ = token::ipaddr(data);
    let _ = token::addr64(data);
    let _ = token::channel(data);
    let _ = token::token(data);
    let _ = token::char_array(data);

    for syntax in [ProtocolSyntax::DEFAULT, ProtocolSyntax::SHORT_LINE] {
        if let Some(line) = frame::classify(data, &syntax, Some(b"SKINFO\r\n")) {
            assert!(line.len <= data.len());
        }
    }
});
