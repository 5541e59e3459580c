//! Demo: feed NMEA text on stdin, get fixes on stdout.
//!
//! ```text
//! cat trace.nmea | RUST_LOG=l76=debug cargo run
//! ```

extern crate env_logger;
extern crate l76;

use std::io::{self, BufReader};
use std::thread;
use std::time::Duration;

use l76::L76;

fn main() {
    env_logger::init();

    let source = BufReader::new(io::stdin());
    let mut gnss = match L76::new(source, io::sink()) {
        Ok(gnss) => gnss,
        Err(e) => {
            eprintln!("l76: {}", e);
            return;
        }
    };
    if let Err(e) = gnss.start() {
        eprintln!("l76: {}", e);
        return;
    }

    loop {
        if let Some(fix) = gnss.fix() {
            println!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC  \
                 lat {:9.4}  lon {:9.4}  alt {:7.1} m  \
                 speed {:5.1} km/h  course {:5.1}  sats {:2}",
                fix.utc.year,
                fix.utc.month,
                fix.utc.day,
                fix.utc.hour,
                fix.utc.minute,
                fix.utc.second,
                fix.latitude,
                fix.longitude,
                fix.altitude,
                fix.speed,
                fix.course,
                fix.satellites,
            );
        }
        thread::sleep(Duration::from_millis(200));
    }
}
