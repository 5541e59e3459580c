//! The driver handle: lifecycle control and chip session commands.
//!
//! The L76 is controlled with PMTK command sentences written to the serial
//! port; received NMEA lines are handled by the thread spawned in `start`.
//! The lifecycle is an explicit state machine, every transition validated
//! against the current state:
//!
//! ```text
//! Stopped --start--> Running --pause--> Paused
//!    ^                  |  ^--resume------'
//!    '------stop--------'---stop----------'
//! ```

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use checksum;
use err::DriverError;
use fix::{Fix, UtcTime};
use receiver::{self, Ctrl, FixSlot, LineSource};

/// Standby mode, the chip's lowest power consumption state.
pub const CMD_STANDBY: &'static str = "$PMTK161,0*28\r\n";
/// Hot start: wake using all previously stored navigation data.
pub const CMD_HOT_START: &'static str = "$PMTK101*32\r\n";

const MIN_FIX_INTERVAL_MS: u32 = 100;
const MAX_FIX_INTERVAL_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
    Paused,
}

/// Driver for the Quectel L76.
///
/// `S` delivers received lines, `W` is the command side of the serial link.
/// Construction puts the chip in standby; `start` wakes it and spawns the
/// receiver thread.
pub struct L76<S, W> {
    port: W,
    state: DriverState,
    slot: Arc<FixSlot>,
    ctrl: Arc<Ctrl>,
    source: Option<S>,
    receiver: Option<JoinHandle<S>>,
}

impl<S, W> L76<S, W>
where
    S: LineSource + Send + 'static,
    W: Write,
{
    pub fn new(source: S, mut port: W) -> Result<L76<S, W>, DriverError> {
        port.write_all(CMD_STANDBY.as_bytes())?;
        port.flush()?;
        Ok(L76 {
            port,
            state: DriverState::Stopped,
            slot: Arc::new(FixSlot::new()),
            ctrl: Arc::new(Ctrl::new()),
            source: Some(source),
            receiver: None,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Wake the chip and spawn the receiver thread.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.state != DriverState::Stopped {
            return Err(DriverError::InvalidTransition("start", self.state));
        }
        self.send(CMD_HOT_START)?;
        // The source is only absent if a previous receiver thread was lost.
        let source = match self.source.take() {
            Some(source) => source,
            None => return Err(DriverError::ReceiverPanicked),
        };
        self.ctrl.running.store(true, Ordering::SeqCst);
        self.ctrl.talking.store(true, Ordering::SeqCst);

        let slot = self.slot.clone();
        let ctrl = self.ctrl.clone();
        let handle = thread::Builder::new()
            .name("l76-receiver".to_string())
            .spawn(move || receiver::run(source, slot, ctrl))?;
        self.receiver = Some(handle);
        self.state = DriverState::Running;
        debug!("receiver started");
        Ok(())
    }

    /// Put the chip in standby and end the receiver thread.
    ///
    /// Stopping is cooperative: the loop checks its flag between reads, so
    /// this may wait for one in-flight blocking read to return.
    pub fn stop(&mut self) -> Result<(), DriverError> {
        if self.state == DriverState::Stopped {
            return Err(DriverError::InvalidTransition("stop", self.state));
        }
        self.send(CMD_STANDBY)?;
        self.ctrl.running.store(false, Ordering::SeqCst);
        self.state = DriverState::Stopped;
        match self.receiver.take() {
            Some(handle) => match handle.join() {
                Ok(source) => {
                    self.source = Some(source);
                    debug!("receiver stopped");
                    Ok(())
                }
                Err(_) => Err(DriverError::ReceiverPanicked),
            },
            None => Ok(()),
        }
    }

    /// Put the chip in standby; the receiver thread idles until `resume`.
    pub fn pause(&mut self) -> Result<(), DriverError> {
        if self.state != DriverState::Running {
            return Err(DriverError::InvalidTransition("pause", self.state));
        }
        self.send(CMD_STANDBY)?;
        self.ctrl.talking.store(false, Ordering::SeqCst);
        self.state = DriverState::Paused;
        Ok(())
    }

    /// Wake the chip from the standby entered by `pause`.
    pub fn resume(&mut self) -> Result<(), DriverError> {
        if self.state != DriverState::Paused {
            return Err(DriverError::InvalidTransition("resume", self.state));
        }
        self.send(CMD_HOT_START)?;
        self.ctrl.talking.store(true, Ordering::SeqCst);
        self.state = DriverState::Running;
        Ok(())
    }

    /// Set the interval between fixes, 100 to 10000 milliseconds.
    pub fn set_fix_rate(&mut self, interval_ms: u32) -> Result<(), DriverError> {
        if self.state != DriverState::Running {
            return Err(DriverError::InvalidTransition("set_fix_rate", self.state));
        }
        let cmd = fix_rate_command(interval_ms)?;
        self.send(&cmd)
    }

    /// Take the pending fix, if any. Non-blocking; a second call without new
    /// input returns `None`.
    pub fn fix(&self) -> Option<Fix> {
        self.slot.fix()
    }

    pub fn has_fix(&self) -> bool {
        self.slot.has_fix()
    }

    /// Take the pending UTC timestamp, if any. May predate any position fix;
    /// callers that need a fixed position should consult `has_fix` first.
    pub fn utc(&self) -> Option<UtcTime> {
        self.slot.utc()
    }

    pub fn has_utc(&self) -> bool {
        self.slot.has_utc()
    }

    fn send(&mut self, cmd: &str) -> Result<(), DriverError> {
        self.port.write_all(cmd.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}

/// Frame a PMTK220 fix-interval command for `interval_ms` milliseconds.
pub fn fix_rate_command(interval_ms: u32) -> Result<String, DriverError> {
    if interval_ms < MIN_FIX_INTERVAL_MS || interval_ms > MAX_FIX_INTERVAL_MS {
        return Err(DriverError::RateOutOfRange(interval_ms));
    }
    let body = format!("PMTK220,{}", interval_ms);
    Ok(format!("${}*{:02X}\r\n", body, checksum::checksum(body.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::time::Duration;

    const SCENARIO: &'static [u8] =
        b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n\
          $GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

    fn driver_with(input: &[u8]) -> L76<Cursor<Vec<u8>>, Vec<u8>> {
        L76::new(Cursor::new(input.to_vec()), Vec::new()).unwrap()
    }

    #[test]
    fn command_strings_carry_their_own_checksums() {
        assert_eq!(
            format!("$PMTK161,0*{:02X}\r\n", checksum::checksum(b"PMTK161,0")),
            CMD_STANDBY
        );
        assert_eq!(
            format!("$PMTK101*{:02X}\r\n", checksum::checksum(b"PMTK101")),
            CMD_HOT_START
        );
    }

    #[test]
    fn fix_rate_command_is_framed_and_range_checked() {
        assert_eq!(fix_rate_command(1000).unwrap(), "$PMTK220,1000*1F\r\n");
        assert_matches!(fix_rate_command(99), Err(DriverError::RateOutOfRange(99)));
        assert_matches!(
            fix_rate_command(10_001),
            Err(DriverError::RateOutOfRange(10_001))
        );
        assert!(fix_rate_command(100).is_ok());
        assert!(fix_rate_command(10_000).is_ok());
    }

    #[test]
    fn lifecycle_transitions_are_validated() {
        let mut gnss = driver_with(b"");
        assert_eq!(gnss.state(), DriverState::Stopped);
        assert_matches!(
            gnss.stop(),
            Err(DriverError::InvalidTransition("stop", DriverState::Stopped))
        );
        assert_matches!(
            gnss.pause(),
            Err(DriverError::InvalidTransition("pause", DriverState::Stopped))
        );
        assert_matches!(
            gnss.resume(),
            Err(DriverError::InvalidTransition("resume", DriverState::Stopped))
        );
        assert_matches!(
            gnss.set_fix_rate(1000),
            Err(DriverError::InvalidTransition("set_fix_rate", DriverState::Stopped))
        );

        gnss.start().unwrap();
        assert_eq!(gnss.state(), DriverState::Running);
        assert_matches!(
            gnss.start(),
            Err(DriverError::InvalidTransition("start", DriverState::Running))
        );
        gnss.set_fix_rate(1000).unwrap();

        gnss.pause().unwrap();
        assert_eq!(gnss.state(), DriverState::Paused);
        assert_matches!(
            gnss.pause(),
            Err(DriverError::InvalidTransition("pause", DriverState::Paused))
        );
        gnss.resume().unwrap();
        assert_eq!(gnss.state(), DriverState::Running);

        gnss.stop().unwrap();
        assert_eq!(gnss.state(), DriverState::Stopped);
    }

    #[test]
    fn driver_can_be_restarted_after_stop() {
        let mut gnss = driver_with(b"");
        gnss.start().unwrap();
        gnss.stop().unwrap();
        gnss.start().unwrap();
        gnss.stop().unwrap();
    }

    #[test]
    fn receiver_thread_delivers_the_scenario_fix() {
        let mut gnss = driver_with(SCENARIO);
        gnss.start().unwrap();

        let mut tries = 0;
        while !gnss.has_fix() && tries < 100 {
            thread::sleep(Duration::from_millis(20));
            tries += 1;
        }
        let fix = gnss.fix().expect("no fix within two seconds");
        assert_eq!(fix.satellites, 8);
        assert_eq!(fix.altitude, 545.4);
        assert!(gnss.utc().is_some());

        gnss.stop().unwrap();
        assert_eq!(gnss.fix(), None);
    }

    #[test]
    fn out_of_range_rate_is_rejected_while_running() {
        let mut gnss = driver_with(b"");
        gnss.start().unwrap();
        assert_matches!(gnss.set_fix_rate(50), Err(DriverError::RateOutOfRange(50)));
        gnss.stop().unwrap();
    }

    #[test]
    fn construction_sends_standby() {
        let source: Cursor<Vec<u8>> = Cursor::new(Vec::new());
        let mut port = Vec::new();
        {
            let gnss = L76::new(source, &mut port).unwrap();
            assert_eq!(gnss.state(), DriverState::Stopped);
        }
        assert_eq!(port, CMD_STANDBY.as_bytes());
    }

    #[test]
    fn port_failures_surface_as_driver_errors() {
        struct BrokenPort;
        impl io::Write for BrokenPort {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let source: Cursor<Vec<u8>> = Cursor::new(Vec::new());
        assert_matches!(
            L76::new(source, BrokenPort).err(),
            Some(DriverError::Io(_))
        );
    }
}
