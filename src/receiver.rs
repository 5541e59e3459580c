//! The background receive loop and the slot it publishes into.
//!
//! One writer (the loop spawned by the driver) runs the
//! validate → parse → assemble pipeline over lines pulled from a
//! [`LineSource`](trait.LineSource.html) and publishes results into a
//! [`FixSlot`](struct.FixSlot.html), a single-slot mailbox any number of
//! reader threads drain through the accessors. The slot's mutex is the only
//! lock in the crate and is never held across I/O or parsing.

use arrayvec::ArrayVec;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use checksum;
use fix::{Fix, FixAssembler, Update, UtcTime};
use parser;

/// Capacity of the reusable line buffer. Longer lines are truncated, which
/// at worst costs the one sentence that overflowed.
pub const LINE_LENGTH: usize = 256;

/// One raw line as delivered by a line source; may contain leading garbage
/// or no valid sentence at all.
pub type RawLine = ArrayVec<[u8; LINE_LENGTH]>;

/// How long the loop idles when paused or when the source has no data.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// A blocking source of newline-delimited lines.
pub trait LineSource {
    /// Block until one line is available and copy it into `line` (cleared
    /// first, newline excluded, truncated at capacity). Returns the number
    /// of bytes stored; zero means no data was available.
    fn read_line(&mut self, line: &mut RawLine) -> io::Result<usize>;
}

impl<R: io::BufRead> LineSource for R {
    fn read_line(&mut self, line: &mut RawLine) -> io::Result<usize> {
        line.clear();
        loop {
            let (done, used) = {
                let chunk = self.fill_buf()?;
                if chunk.is_empty() {
                    // EOF
                    return Ok(line.len());
                }
                match chunk.iter().position(|&b| b == b'\n') {
                    Some(i) => {
                        for &b in &chunk[..i] {
                            let _ = line.try_push(b);
                        }
                        (true, i + 1)
                    }
                    None => {
                        for &b in chunk {
                            let _ = line.try_push(b);
                        }
                        (false, chunk.len())
                    }
                }
            };
            self.consume(used);
            if done {
                return Ok(line.len());
            }
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    fix: Option<Fix>,
    utc: Option<UtcTime>,
}

/// Mailbox holding at most one unconsumed fix and one unconsumed timestamp,
/// each independently consumable. Reading takes the value, so at most one
/// caller observes any given fix.
#[derive(Debug, Default)]
pub struct FixSlot {
    pending: Mutex<Pending>,
}

impl FixSlot {
    pub fn new() -> FixSlot {
        FixSlot::default()
    }

    fn lock(&self) -> MutexGuard<Pending> {
        // The writer can't panic while holding the lock (it only moves
        // plain values), but a poisoned slot would still be consistent.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the pending fix, leaving the slot empty.
    pub fn fix(&self) -> Option<Fix> {
        self.lock().fix.take()
    }

    /// Whether a fix is pending, without consuming it.
    pub fn has_fix(&self) -> bool {
        self.lock().fix.is_some()
    }

    /// Take the pending timestamp, leaving the slot empty. The timestamp may
    /// stem from a sentence without a position fix; check `has_fix` before
    /// treating it as part of one.
    pub fn utc(&self) -> Option<UtcTime> {
        self.lock().utc.take()
    }

    /// Whether a timestamp is pending, without consuming it.
    pub fn has_utc(&self) -> bool {
        self.lock().utc.is_some()
    }

    /// Store whatever the update carries. Both values land under one lock
    /// acquisition, so a cycle's timestamp is never visible later than its
    /// fix.
    fn publish(&self, update: Update) {
        if update.utc.is_none() && update.fix.is_none() {
            return;
        }
        let mut pending = self.lock();
        if update.utc.is_some() {
            pending.utc = update.utc;
        }
        if update.fix.is_some() {
            pending.fix = update.fix;
        }
    }
}

/// Flags shared between the driver handle and the receiver thread.
#[derive(Debug)]
pub(crate) struct Ctrl {
    /// Cleared by `stop`; the loop exits at the top of the next iteration.
    pub running: AtomicBool,
    /// Cleared by `pause`; the loop idles without reading until resumed.
    pub talking: AtomicBool,
}

impl Ctrl {
    pub fn new() -> Ctrl {
        Ctrl {
            running: AtomicBool::new(true),
            talking: AtomicBool::new(true),
        }
    }
}

/// The receive loop. Reads one line per iteration and keeps going across
/// every per-line failure; only clearing `running` ends it. Returns the
/// source so the driver can be restarted.
pub(crate) fn run<S: LineSource>(mut source: S, slot: Arc<FixSlot>, ctrl: Arc<Ctrl>) -> S {
    let mut line = RawLine::new();
    let mut assembler = FixAssembler::new();
    while ctrl.running.load(Ordering::SeqCst) {
        if !ctrl.talking.load(Ordering::SeqCst) {
            thread::sleep(IDLE_POLL);
            continue;
        }
        match source.read_line(&mut line) {
            Ok(0) => thread::sleep(IDLE_POLL),
            Ok(_) => handle_line(&line, &mut assembler, &slot),
            Err(e) => {
                warn!("line read failed: {}", e);
                thread::sleep(IDLE_POLL);
            }
        }
    }
    source
}

fn handle_line(line: &[u8], assembler: &mut FixAssembler, slot: &FixSlot) {
    let payload = match checksum::validate(line) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("dropping line: {}", e);
            return;
        }
    };
    match parser::parse(payload) {
        Ok(sentence) => slot.publish(assembler.feed(sentence)),
        Err(e) => debug!("dropping sentence: {}", e),
    }
}
