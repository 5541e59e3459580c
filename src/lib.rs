//! Driver for the Quectel L76 GNSS receiver.
//!
//! The chip streams NMEA 0183 sentences over a serial link. A background
//! thread validates each line, decodes the RMC/GGA/GSA sentences and
//! assembles them into complete position fixes which can be read from any
//! thread through the [`L76`](driver/struct.L76.html) handle:
//!
//! ```no_run
//! extern crate l76;
//!
//! use std::io::{self, BufReader};
//! use l76::L76;
//!
//! fn main() {
//!     let source = BufReader::new(io::stdin());
//!     let mut gnss = L76::new(source, io::sink()).unwrap();
//!     gnss.start().unwrap();
//!     if let Some(fix) = gnss.fix() {
//!         println!("{:.4} {:.4}", fix.latitude, fix.longitude);
//!     }
//! }
//! ```

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate arrayvec;
extern crate chrono;
#[macro_use]
extern crate log;
#[macro_use]
extern crate quick_error;

pub mod checksum;
pub mod driver;
pub mod err;
pub mod fix;
pub mod parser;
pub mod receiver;

pub use driver::{DriverState, L76};
pub use err::{DriverError, FrameError, SentenceError};
pub use fix::{Fix, FixAssembler, UtcTime};
pub use parser::Sentence;
pub use receiver::{FixSlot, LineSource, RawLine};
