//! Assembly of decoded sentences into complete fixes.
//!
//! A fix needs data from two sentences: RMC for position/velocity/time and
//! GGA for quality/altitude, with GSA contributing optional dilution values.
//! [`FixAssembler`](struct.FixAssembler.html) buffers partial data across one
//! decoding cycle and produces an immutable [`Fix`](struct.Fix.html) exactly
//! when the mandatory pair has been seen, so a published fix can never mix
//! fields from two cycles.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use parser::{GgaData, GsaData, Sentence, Track};

/// A point in UTC time as reported by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
}

impl UtcTime {
    pub fn new(date: NaiveDate, time: NaiveTime) -> UtcTime {
        UtcTime {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            microsecond: time.nanosecond() / 1_000,
        }
    }
}

/// A complete position fix. Constructed once per completed cycle and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    /// Decimal degrees, -90 to 90, negative in the southern hemisphere.
    pub latitude: f64,
    /// Decimal degrees, -180 to 180, negative in the western hemisphere.
    pub longitude: f64,
    /// Meters above mean sea level.
    pub altitude: f64,
    /// Ground speed in km/h.
    pub speed: f64,
    /// Course over ground in degrees from true north.
    pub course: f64,
    /// Number of satellites used for the fix.
    pub satellites: u32,
    /// Horizontal dilution of precision, when reported this cycle.
    pub hdop: Option<f64>,
    /// Vertical dilution of precision; `None` unless a GSA sentence was seen
    /// this cycle.
    pub vdop: Option<f64>,
    /// Positional dilution of precision; `None` unless a GSA sentence was
    /// seen this cycle.
    pub pdop: Option<f64>,
    pub utc: UtcTime,
}

/// What one decoded sentence contributed: a timestamp to publish
/// immediately, a completed fix, or neither.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Update {
    pub utc: Option<UtcTime>,
    pub fix: Option<Fix>,
}

/// State machine accumulating partial sentence data for the current cycle.
#[derive(Debug, Default)]
pub struct FixAssembler {
    utc: Option<UtcTime>,
    track: Option<Track>,
    quality: Option<GgaData>,
    geometry: Option<GsaData>,
}

impl FixAssembler {
    pub fn new() -> FixAssembler {
        FixAssembler::default()
    }

    /// Feed one decoded sentence and report what became available.
    ///
    /// Timestamps are reported as soon as a time-carrying sentence arrives,
    /// independently of fix readiness. A fix is reported once both a
    /// valid-fix RMC and a GGA have arrived since the last one, after which
    /// all buffered state is cleared.
    pub fn feed(&mut self, sentence: Sentence) -> Update {
        let mut update = Update::default();
        match sentence {
            Sentence::Rmc(rmc) => {
                if rmc.utc.is_some() {
                    self.utc = rmc.utc;
                    update.utc = rmc.utc;
                }
                if rmc.track.is_some() {
                    self.track = rmc.track;
                }
            }
            Sentence::Gga(gga) => self.quality = Some(gga),
            Sentence::Gsa(gsa) => self.geometry = Some(gsa),
            Sentence::Skipped => {}
        }
        update.fix = self.try_assemble();
        update
    }

    fn try_assemble(&mut self) -> Option<Fix> {
        let fix = match (self.track, self.quality, self.utc) {
            (Some(track), Some(quality), Some(utc)) => Fix {
                latitude: track.latitude,
                longitude: track.longitude,
                altitude: quality.altitude,
                speed: track.speed,
                course: track.course,
                satellites: quality.satellites,
                // A GSA from the same cycle supersedes the GGA estimate.
                hdop: self.geometry.map(|g| g.hdop).or(quality.hdop),
                vdop: self.geometry.map(|g| g.vdop),
                pdop: self.geometry.map(|g| g.pdop),
                utc,
            },
            _ => return None,
        };
        *self = FixAssembler::default();
        Some(fix)
    }
}
