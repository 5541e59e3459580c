use chrono;
use std::{io, num, str};

use driver::DriverState;

quick_error! {
    /// Errors while framing a raw line, all recoverable by skipping the line.
    #[derive(Debug)]
    pub enum FrameError {
        MissingStart {
            description("Missing start delimiter")
            display("no `$` start delimiter before the checksum delimiter")
        }
        MissingChecksum {
            description("Missing checksum delimiter")
            display("no `*` checksum delimiter in line")
        }
        TruncatedChecksum {
            description("Truncated checksum")
            display("fewer than two characters after the checksum delimiter")
        }
        Utf8(err: str::Utf8Error) {
            from()
            description("Invalid checksum digits")
            display("checksum digits are not valid ASCII: {}", err)
        }
        Hex(err: num::ParseIntError) {
            from()
            description("Invalid checksum digits")
            display("checksum digits are not hexadecimal: {}", err)
        }
        ChecksumMismatch(expected: u8, actual: u8) {
            description("Invalid checksum")
            display("expected checksum \"{:02X}\", found \"{:02X}\"", expected, actual)
        }
    }
}

quick_error! {
    /// Errors while decoding the fields of a checksum-valid sentence.
    #[derive(Debug)]
    pub enum SentenceError {
        Utf8(err: str::Utf8Error) {
            from()
            description("Sentence is not valid UTF-8")
            display("sentence is not valid UTF-8: {}", err)
        }
        TooFewFields(code: &'static str, expected: usize, actual: usize) {
            description("Too few fields")
            display("{} sentence has {} fields, expected at least {}", code, actual, expected)
        }
        Float(err: num::ParseFloatError) {
            from()
            description("Float parsing error")
            display("{}", err)
        }
        Int(err: num::ParseIntError) {
            from()
            description("Integer parsing error")
            display("{}", err)
        }
        Time(err: chrono::format::ParseError) {
            from()
            description("Time parsing error")
            display("failed to parse time of day: {}", err)
        }
        InvalidDate {
            description("Invalid date")
            display("date field is not a valid ddmmyy date")
        }
        InvalidHemisphere(dir: String) {
            description("Invalid hemisphere")
            display("expected N, S, E or W hemisphere, found \"{}\"", dir)
        }
        InvalidCoordinate(val: f64, max: f64) {
            description("Invalid coordinate")
            display("coordinate {} outside the range {} to {}", val, -max, max)
        }
        InvalidValue(msg: &'static str) {
            description("Invalid value")
            display("invalid value: {}", msg)
        }
    }
}

quick_error! {
    /// Errors surfaced to the driver's caller. The receiver loop itself
    /// never fails; per-line conditions are logged and skipped.
    #[derive(Debug)]
    pub enum DriverError {
        Io(err: io::Error) {
            from()
            description("I/O error")
            display("command port error: {}", err)
        }
        InvalidTransition(op: &'static str, state: DriverState) {
            description("Invalid lifecycle transition")
            display("cannot {} while the driver is {:?}", op, state)
        }
        RateOutOfRange(rate: u32) {
            description("Fix rate out of range")
            display("fix interval {} ms outside the supported 100-10000 ms", rate)
        }
        ReceiverPanicked {
            description("Receiver thread panicked")
            display("the receiver thread panicked; the driver cannot be restarted")
        }
    }
}
