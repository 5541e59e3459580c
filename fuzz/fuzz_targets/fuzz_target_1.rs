#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate l76;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = l76::checksum::validate(data) {
        let _ = l76::parser::parse(payload);
    }
});
