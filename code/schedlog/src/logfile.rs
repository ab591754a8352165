/// Simple parser for the simulator's trace format.
///
/// Every record is one line of whitespace-separated fields:
///
///   <timestamp> <device-kind> <device-id> <task-id> <event-kind> [<payload>]
///
/// NOTE:
///
/// - A corrupted record is dropped silently, and counted.  Several simulator threads append to the
///   logs concurrently and the merged trace may be produced while they run, so partly-written lines
///   are expected and are not an error.
///
/// - The payload is taken from the sixth field if and only if that field is a number.  Anything
///   after the five required fields that is not a number is ignored, it does not invalidate the
///   record.
///
/// - A timestamp must fit in an i64, so that differences between any two timestamps are exact.
///   Larger values make the record corrupt.
///
/// - The input need not be sorted in any way.  Records are returned in file order.
use crate::{Event, EventKind};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use traceutils::{parse_digits, parse_signed};
use ustr::Ustr;

/// Parse one trace line, returning None if it does not have the expected shape.

pub fn parse_line(line: &str) -> Option<Event> {
    let mut fields = line.split_whitespace();
    let timestamp = parse_digits(fields.next()?).filter(|&t| t <= i64::MAX as u64)?;
    let device = Ustr::from(fields.next()?);
    let device_id = u32::try_from(parse_digits(fields.next()?)?).ok()?;
    let task_id = i32::try_from(parse_signed(fields.next()?)?).ok()?;
    let kind = EventKind::from(fields.next()?);
    let payload = fields.next().and_then(parse_digits);
    Some(Event {
        timestamp,
        device,
        device_id,
        task_id,
        kind,
        payload,
    })
}

/// A lazy stream of events over any line source.  Malformed lines (including lines that are not
/// UTF8) are skipped and counted; blank lines are skipped without being counted.  I/O errors are
/// passed on to the consumer.

pub struct EventReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    lines: usize,
    discarded: usize,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> EventReader<R> {
        EventReader {
            reader,
            buf: vec![],
            lines: 0,
            discarded: 0,
        }
    }

    /// Number of lines read so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Number of nonblank lines so far that did not yield an event.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = io::Result<Event>;

    fn next(&mut self) -> Option<io::Result<Event>> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.lines += 1;
            let Ok(line) = std::str::from_utf8(&self.buf) else {
                self.discarded += 1;
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(event) => return Some(Ok(event)),
                None => self.discarded += 1,
            }
        }
    }
}

/// Parse a trace file and append its events to `entries` in the order encountered.  Return an error
/// in the case of I/O errors, but silently drop records with parse errors.  Returns the number of
/// discarded records.
///
/// The file is open only for the duration of the call.

pub fn parse_logfile(file_name: &str, entries: &mut Vec<Event>) -> Result<usize> {
    let file = File::open(file_name).with_context(|| format!("Could not open trace {file_name}"))?;
    let mut reader = EventReader::new(BufReader::new(file));
    for event in reader.by_ref() {
        entries.push(event.with_context(|| format!("Could not read trace {file_name}"))?);
    }
    log::debug!(
        "{file_name}: {} lines, {} discarded",
        reader.lines(),
        reader.discarded()
    );
    Ok(reader.discarded())
}

#[test]
fn test_parse_line() {
    let e = parse_line("15 CPU 0 1 ENTER_CPU").unwrap();
    assert!(e.timestamp == 15);
    assert!(e.device.as_str() == "CPU");
    assert!(e.device_id == 0);
    assert!(e.task_id == 1);
    assert!(e.kind == EventKind::EnterCpu);
    assert!(e.payload.is_none());

    let e = parse_line("  40\tCPU 1 7 FINISH_CPU 25\n").unwrap();
    assert!(e.timestamp == 40);
    assert!(e.device_id == 1);
    assert!(e.task_id == 7);
    assert!(e.kind == EventKind::FinishCpu);
    assert!(e.payload == Some(25));

    // Device records carry task -1.
    let e = parse_line("0 CPU 0 -1 INIT").unwrap();
    assert!(e.task_id == -1);
    assert!(e.kind == EventKind::Init);

    // A non-numeric sixth field is not a payload but does not spoil the record.
    let e = parse_line("7 IO 4 2 LEAVE_IO done").unwrap();
    assert!(e.kind == EventKind::LeaveIo);
    assert!(e.payload.is_none());

    // Unknown kinds are kept.
    let e = parse_line("9 CPU 0 3 MIGRATE 1").unwrap();
    assert!(e.kind.name() == "MIGRATE");
    assert!(e.payload == Some(1));
}

#[test]
fn test_parse_line_malformed() {
    assert!(parse_line("").is_none());
    assert!(parse_line("24").is_none());
    assert!(parse_line("24 CPU 0 1").is_none());
    assert!(parse_line("garbage line here").is_none());
    assert!(parse_line("abc CPU 0 1 ENTER_CPU").is_none());
    assert!(parse_line("-5 CPU 0 1 ENTER_CPU").is_none());
    assert!(parse_line("5 CPU x 1 ENTER_CPU").is_none());
    assert!(parse_line("5 CPU -1 1 ENTER_CPU").is_none());
    assert!(parse_line("5 CPU 0 1.5 ENTER_CPU").is_none());
    assert!(parse_line("5 CPU 0 99999999999 ENTER_CPU").is_none());
    assert!(parse_line("9223372036854775808 CPU 0 1 ENTER_CPU").is_none());
    assert!(parse_line("18446744073709551615 CPU 0 1 ENTER_CPU").is_none());
    let e = parse_line("9223372036854775807 CPU 0 1 ENTER_CPU").unwrap();
    assert!(e.timestamp == i64::MAX as u64);
}

#[test]
fn test_event_reader() {
    let input: &[u8] = b"0 CPU 0 -1 INIT\n\n24\n15 CPU 0 1 ENTER_CPU\n\xff\xfe bad\n10 CPU 0 1 ENTER_SCHED";
    let mut reader = EventReader::new(input);
    let events = reader.by_ref().collect::<io::Result<Vec<Event>>>().unwrap();
    assert!(events.len() == 3);
    // File order, not time order.
    assert!(events[1].timestamp == 15);
    assert!(events[2].timestamp == 10);
    assert!(reader.lines() == 6);
    assert!(reader.discarded() == 2);
}

#[test]
fn test_parse_logfile() {
    let mut entries = vec![];
    let discarded = parse_logfile("../tests/schedlog/merged.log", &mut entries).unwrap();
    assert!(discarded == 3);
    assert!(entries.len() == 18);
    assert!(entries[0].kind == EventKind::Init);
    assert!(entries[17].timestamp == 210);

    let mut entries = vec![];
    assert!(parse_logfile("../tests/schedlog/empty.log", &mut entries).unwrap() == 0);
    assert!(entries.is_empty());

    assert!(parse_logfile("../tests/schedlog/no-such-file.log", &mut entries).is_err());
}
