//! Field decoding for the three sentence types the chip is asked to emit.
//!
//! The payload handed in by [`checksum::validate`](../checksum/fn.validate.html)
//! is split on commas and dispatched on the three-character command code that
//! follows the two-character talker id. Anything else decodes to
//! [`Sentence::Skipped`](enum.Sentence.html), as do sentences whose own
//! indicator says "no fix": those are not errors, they simply contribute
//! nothing to the current cycle.

use chrono::{NaiveDate, NaiveTime};
use std::str::{self, FromStr};

use err::SentenceError;
use fix::UtcTime;

const LAT_SPLIT: usize = 2;
const ABS_MAX_LAT: f64 = 90.0;
const LONG_SPLIT: usize = 3;
const ABS_MAX_LONG: f64 = 180.0;

const KNOTS_TO_KMH: f64 = 1.852;

/// Minimum comma-separated field counts, command code included.
const RMC_FIELDS: usize = 10;
const GGA_FIELDS: usize = 10;
const GSA_FIELDS: usize = 18;

/// One decoded sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    /// Recommended minimum data: fix validity, time, date, position, ground
    /// speed and course.
    Rmc(RmcData),
    /// Fix quality: satellite count, HDOP and antenna altitude.
    Gga(GgaData),
    /// Satellite geometry: position/horizontal/vertical dilution of precision.
    Gsa(GsaData),
    /// Unrecognized command code, or a recognized sentence whose indicator
    /// reports no usable fix.
    Skipped,
}

/// Ground track from a valid RMC sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    /// Decimal degrees, negative in the southern hemisphere.
    pub latitude: f64,
    /// Decimal degrees, negative in the western hemisphere.
    pub longitude: f64,
    /// Ground speed in km/h.
    pub speed: f64,
    /// Course over ground in degrees from true north.
    pub course: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmcData {
    /// Time and date, present whenever those fields are well-formed even if
    /// the receiver reports no fix.
    pub utc: Option<UtcTime>,
    /// Position and velocity, present only when the status flag is `A`.
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GgaData {
    /// Number of satellites used for the fix.
    pub satellites: u32,
    /// Horizontal dilution of precision.
    pub hdop: Option<f64>,
    /// Antenna altitude above mean sea level in meters.
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GsaData {
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
}

/// Decodes one checksum-valid payload.
pub fn parse(payload: &[u8]) -> Result<Sentence, SentenceError> {
    let payload = str::from_utf8(payload)?;
    let fields: Vec<&str> = payload.split(',').collect();
    let code = fields[0];
    if code.len() != 5 || !code.is_char_boundary(2) {
        return Ok(Sentence::Skipped);
    }
    match &code[2..] {
        "RMC" => parse_rmc(&fields),
        "GGA" => parse_gga(&fields),
        "GSA" => parse_gsa(&fields),
        _ => Ok(Sentence::Skipped),
    }
}

fn parse_rmc(fields: &[&str]) -> Result<Sentence, SentenceError> {
    if fields.len() < RMC_FIELDS {
        return Err(SentenceError::TooFewFields("RMC", RMC_FIELDS, fields.len()));
    }
    let utc = parse_datetime(fields[1], fields[9]);
    if fields[2] != "A" {
        // No fix. Time still propagates when its fields are well-formed.
        return Ok(Sentence::Rmc(RmcData {
            utc: utc.ok(),
            track: None,
        }));
    }
    let utc = utc?;
    let latitude = parse_coord(fields[3], fields[4], LAT_SPLIT, ABS_MAX_LAT)?;
    let longitude = parse_coord(fields[5], fields[6], LONG_SPLIT, ABS_MAX_LONG)?;
    let speed = f64::from_str(fields[7])? * KNOTS_TO_KMH;
    let course = f64::from_str(fields[8])?;
    Ok(Sentence::Rmc(RmcData {
        utc: Some(utc),
        track: Some(Track {
            latitude,
            longitude,
            speed,
            course,
        }),
    }))
}

fn parse_gga(fields: &[&str]) -> Result<Sentence, SentenceError> {
    if fields.len() < GGA_FIELDS {
        return Err(SentenceError::TooFewFields("GGA", GGA_FIELDS, fields.len()));
    }
    if fields[6] == "0" {
        // Fix not available.
        return Ok(Sentence::Skipped);
    }
    let satellites = u32::from_str(fields[7])?;
    let hdop = match fields[8] {
        "" => None,
        f => Some(f64::from_str(f)?),
    };
    let altitude = f64::from_str(fields[9])?;
    Ok(Sentence::Gga(GgaData {
        satellites,
        hdop,
        altitude,
    }))
}

fn parse_gsa(fields: &[&str]) -> Result<Sentence, SentenceError> {
    if fields.len() < GSA_FIELDS {
        return Err(SentenceError::TooFewFields("GSA", GSA_FIELDS, fields.len()));
    }
    if fields[2] != "3" {
        // Only a full 3-D solution carries usable dilution values.
        return Ok(Sentence::Skipped);
    }
    Ok(Sentence::Gsa(GsaData {
        pdop: f64::from_str(fields[15])?,
        hdop: f64::from_str(fields[16])?,
        vdop: f64::from_str(fields[17])?,
    }))
}

/// Parse a `DDMM.MMMM`/`DDDMM.MMMM` field as decimal degrees.
/// `deg_split` is the number of digits that make up the degrees and
/// `abs_max` the maximum magnitude in degrees, e.g. 180 for longitude.
fn parse_coord(
    raw: &str,
    hemisphere: &str,
    deg_split: usize,
    abs_max: f64,
) -> Result<f64, SentenceError> {
    let sign = match hemisphere {
        "N" | "E" => 1.0,
        "S" | "W" => -1.0,
        other => return Err(SentenceError::InvalidHemisphere(other.to_string())),
    };
    // These checks are needed to ensure split_at can't panic.
    if deg_split > raw.len() {
        return Err(SentenceError::InvalidValue(
            "coordinate too short for a degree prefix",
        ));
    }
    if !raw.is_char_boundary(deg_split) {
        return Err(SentenceError::InvalidValue("coordinate is not plain ASCII"));
    }
    let (deg, min) = raw.split_at(deg_split);
    let degrees = f64::from(i16::from_str(deg)?);
    let value = degrees + f64::from_str(min)? / 60.0;
    if value.abs() > abs_max {
        return Err(SentenceError::InvalidCoordinate(value, abs_max));
    }
    Ok(sign * value)
}

/// Parse the `hhmmss.sss` time-of-day and `ddmmyy` date fields.
fn parse_datetime(time: &str, date: &str) -> Result<UtcTime, SentenceError> {
    let time = NaiveTime::parse_from_str(time, "%H%M%S%.f")?;
    if date.len() != 6 || !date.is_char_boundary(2) || !date.is_char_boundary(4) {
        return Err(SentenceError::InvalidDate);
    }
    let day = u32::from_str(&date[..2])?;
    let month = u32::from_str(&date[2..4])?;
    let year = resolve_year(i32::from_str(&date[4..])?);
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(SentenceError::InvalidDate)?;
    Ok(UtcTime::new(date, time))
}

/// The chip reports a two-digit year. GPS went live in 1980, so 80-99 map
/// to 19xx and everything below to 20xx.
fn resolve_year(yy: i32) -> i32 {
    if yy >= 80 && yy < 100 {
        1900 + yy
    } else {
        2000 + yy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RMC: &'static [u8] =
        b"GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W";
    const GGA: &'static [u8] = b"GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
    const GSA: &'static [u8] = b"GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn decodes_rmc() {
        let rmc = match parse(RMC).unwrap() {
            Sentence::Rmc(rmc) => rmc,
            s => panic!("expected RMC, got {:?}", s),
        };
        let track = rmc.track.unwrap();
        assert!(close(track.latitude, 48.1173));
        assert!(close(track.longitude, 11.5167));
        assert!(close(track.speed, 41.4848));
        assert!(close(track.course, 84.4));
        assert_eq!(
            rmc.utc.unwrap(),
            UtcTime {
                year: 1994,
                month: 3,
                day: 23,
                hour: 12,
                minute: 35,
                second: 19,
                microsecond: 0,
            }
        );
    }

    #[test]
    fn rmc_without_fix_still_carries_time() {
        let payload = b"GPRMC,081836.25,V,,,,,,,130625,,";
        let rmc = match parse(payload).unwrap() {
            Sentence::Rmc(rmc) => rmc,
            s => panic!("expected RMC, got {:?}", s),
        };
        assert_eq!(rmc.track, None);
        let utc = rmc.utc.unwrap();
        assert_eq!(
            (utc.year, utc.month, utc.day),
            (2025, 6, 13)
        );
        assert_eq!(
            (utc.hour, utc.minute, utc.second, utc.microsecond),
            (8, 18, 36, 250_000)
        );
    }

    #[test]
    fn southern_and_western_hemispheres_negate() {
        let payload = b"GPRMC,123519,A,4807.038,S,01131.000,W,022.4,084.4,230394,003.1,W";
        match parse(payload).unwrap() {
            Sentence::Rmc(RmcData { track: Some(t), .. }) => {
                assert!(close(t.latitude, -48.1173));
                assert!(close(t.longitude, -11.5167));
            }
            s => panic!("expected valid RMC, got {:?}", s),
        }
    }

    #[test]
    fn decodes_gga() {
        assert_eq!(
            parse(GGA).unwrap(),
            Sentence::Gga(GgaData {
                satellites: 8,
                hdop: Some(0.9),
                altitude: 545.4,
            })
        );
    }

    #[test]
    fn gga_without_fix_is_skipped() {
        let payload = b"GPGGA,123519,,,,,0,00,,,M,,M,,";
        assert_eq!(parse(payload).unwrap(), Sentence::Skipped);
    }

    #[test]
    fn decodes_gsa() {
        assert_eq!(
            parse(GSA).unwrap(),
            Sentence::Gsa(GsaData {
                pdop: 2.5,
                hdop: 1.3,
                vdop: 2.1,
            })
        );
    }

    #[test]
    fn gsa_without_3d_fix_is_skipped() {
        let payload = b"GPGSA,A,1,,,,,,,,,,,,,,,";
        assert_eq!(parse(payload).unwrap(), Sentence::Skipped);
    }

    #[test]
    fn unknown_codes_are_skipped() {
        assert_eq!(
            parse(b"GPGSV,3,1,11,03,03,111,00,04,15,270,00*00").unwrap(),
            Sentence::Skipped
        );
        assert_eq!(parse(b"").unwrap(), Sentence::Skipped);
    }

    #[test]
    fn too_few_fields_is_an_error() {
        assert_matches!(
            parse(b"GPRMC,123519,A"),
            Err(SentenceError::TooFewFields("RMC", _, 3))
        );
        assert_matches!(
            parse(b"GPGSA,A,3,2.5,1.3,2.1"),
            Err(SentenceError::TooFewFields("GSA", _, 6))
        );
    }

    #[test]
    fn rejects_bad_coordinate_fields() {
        let bad_hemisphere = b"GPRMC,123519,A,4807.038,X,01131.000,E,022.4,084.4,230394,,";
        assert_matches!(
            parse(bad_hemisphere),
            Err(SentenceError::InvalidHemisphere(_))
        );
        let out_of_range = b"GPRMC,123519,A,9907.038,N,01131.000,E,022.4,084.4,230394,,";
        assert_matches!(
            parse(out_of_range),
            Err(SentenceError::InvalidCoordinate(_, _))
        );
    }

    #[test]
    fn two_digit_years_resolve_around_the_gps_epoch() {
        assert_eq!(resolve_year(94), 1994);
        assert_eq!(resolve_year(80), 1980);
        assert_eq!(resolve_year(25), 2025);
        assert_eq!(resolve_year(0), 2000);
    }
}
