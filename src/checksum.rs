//! Line framing and checksum validation for NMEA 0183.
//!
//! A well-formed line looks like `$<payload>*CC\r\n` where `CC` is the
//! two-hex-digit XOR of every payload byte. Serial reads can hand us lines
//! with leading garbage or the tail of a previous partial sentence, so the
//! validator anchors on the *last* `$` before the first `*`.

use std::str;

use err::FrameError;

/// Running XOR over `payload`, as transmitted between `$` and `*`.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |crc, &b| crc ^ b)
}

/// Validates one raw line and returns the payload between the delimiters,
/// checksum and delimiters excluded.
pub fn validate(line: &[u8]) -> Result<&[u8], FrameError> {
    let star = line
        .iter()
        .position(|&b| b == b'*')
        .ok_or(FrameError::MissingChecksum)?;
    let start = line[..star]
        .iter()
        .rposition(|&b| b == b'$')
        .ok_or(FrameError::MissingStart)?;
    let digits = line
        .get(star + 1..star + 3)
        .ok_or(FrameError::TruncatedChecksum)?;
    let expected = u8::from_str_radix(str::from_utf8(digits)?, 16)?;

    let payload = &line[start + 1..star];
    let actual = checksum(payload);
    if expected != actual {
        return Err(FrameError::ChecksumMismatch(expected, actual));
    }
    Ok(payload)
}
