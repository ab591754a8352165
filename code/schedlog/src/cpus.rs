/// Per-CPU utilization.
///
/// Two independent figures are combined for each CPU:
///
/// - busy time, which the simulator reports itself: every CPU thread writes its own execution log
///   (`cpu<id>.log` by default) and the quantum a task used is the trailing number on LEAVE_CPU and
///   FINISH_CPU records.  We sum the trailing number of every line of that log.
///
/// - the observation window, which we derive from the CPU-tagged records of the merged trace: the
///   time from the CPU's *second* record to its last.  The first record is the INIT marker the CPU
///   thread writes when it starts, which precedes any real work and would inflate the window.
///
/// Utilization is busy time over window, as a percentage.  A CPU with fewer than two records has an
/// empty window and is defined to have zero utilization.
///
/// The set of CPUs is discovered from the trace: the largest device id on any CPU-tagged record
/// defines the range 0..=max, so a CPU that never shows up but has a lower id than one that does
/// still gets a (zero) record, and still needs an execution log.
use crate::{Event, TraceError, Timestamp};

use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use traceutils::{expand_cpu_log, parse_digits};
use ustr::Ustr;

#[derive(Debug, Clone, PartialEq)]
pub struct CpuRecord {
    pub cpu_id: u32,

    /// Sum of the execution quanta in the CPU's execution log.
    pub busy_time: u64,

    /// Time from the second to the last CPU-tagged trace record for the CPU, zero if there are
    /// fewer than two such records.
    pub window: u64,

    /// busy_time / window * 100, or exactly 0.0 if the window is empty.
    pub utilization: f64,
}

/// Where to find the per-CPU execution logs: a directory and a file name pattern with a `{}` hole
/// for the CPU id.

#[derive(Debug, Clone)]
pub struct CpuLogs {
    dir: PathBuf,
    pattern: String,
}

impl CpuLogs {
    pub fn new<P: Into<PathBuf>>(dir: P, pattern: &str) -> CpuLogs {
        CpuLogs {
            dir: dir.into(),
            pattern: pattern.to_string(),
        }
    }

    pub fn path(&self, cpu_id: u32) -> PathBuf {
        self.dir.join(expand_cpu_log(&self.pattern, cpu_id))
    }
}

/// The largest CPU id on any record tagged with `cpu_tag`, or None if there are no such records.

pub fn max_cpu_id(events: &[Event], cpu_tag: Ustr) -> Option<u32> {
    events
        .iter()
        .filter(|e| e.device == cpu_tag)
        .map(|e| e.device_id)
        .max()
}

/// Sum the trailing numbers in an execution log.  A line whose last token is not a plain decimal
/// number, and a blank line, count as zero.  The file is closed on return.

pub fn read_exec_log(path: &Path) -> io::Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut total = 0u64;
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Some(quantum) = line.split_whitespace().next_back().and_then(parse_digits) {
            total = total.saturating_add(quantum);
        }
    }
    Ok(total)
}

/// Busy time for one CPU.  The log is required: without it the CPU's utilization is unknown, so a
/// missing or unreadable file is an error and not a zero.

pub fn cpu_busy_time(logs: &CpuLogs, cpu_id: u32) -> Result<u64, TraceError> {
    let path = logs.path(cpu_id);
    read_exec_log(&path).map_err(|source| TraceError::MissingCpuLog {
        cpu_id,
        path,
        source,
    })
}

/// Length of the observation window given the times of a CPU's trace records, in any order.

pub fn observation_window(times: &mut [Timestamp]) -> u64 {
    if times.len() < 2 {
        return 0;
    }
    times.sort_unstable();
    times[times.len() - 1] - times[1]
}

pub fn utilization(busy_time: u64, window: u64) -> f64 {
    if window == 0 {
        0.0
    } else {
        busy_time as f64 / window as f64 * 100.0
    }
}

/// Compute a record for every CPU in the discovered range, in id order.  Returns an empty vector if
/// the trace has no CPU-tagged records at all.

pub fn cpu_records(
    events: &[Event],
    cpu_tag: Ustr,
    logs: &CpuLogs,
) -> Result<Vec<CpuRecord>, TraceError> {
    let Some(max_id) = max_cpu_id(events, cpu_tag) else {
        return Ok(vec![]);
    };

    let mut times = events
        .iter()
        .filter(|e| e.device == cpu_tag)
        .map(|e| (e.device_id, e.timestamp))
        .into_group_map();

    let mut records = vec![];
    for cpu_id in 0..=max_id {
        let busy_time = cpu_busy_time(logs, cpu_id)?;
        let window = times
            .get_mut(&cpu_id)
            .map(|ts| observation_window(ts))
            .unwrap_or(0);
        records.push(CpuRecord {
            cpu_id,
            busy_time,
            window,
            utilization: utilization(busy_time, window),
        });
    }
    Ok(records)
}

#[cfg(test)]
use crate::parse_line;

#[cfg(test)]
fn events_of(lines: &[&str]) -> Vec<Event> {
    lines.iter().map(|l| parse_line(l).unwrap()).collect()
}

#[test]
fn test_observation_window() {
    assert!(observation_window(&mut []) == 0);
    assert!(observation_window(&mut [17]) == 0);
    assert!(observation_window(&mut [0, 10]) == 0);
    assert!(observation_window(&mut [200, 0, 10]) == 190);
    assert!(observation_window(&mut [5, 5, 5]) == 0);
}

#[test]
fn test_utilization() {
    let u = utilization(120, 190);
    assert!(format!("{u:.2}") == "63.16");
    assert!(utilization(120, 0) == 0.0);
    assert!(utilization(0, 0) == 0.0);
    assert!(!utilization(0, 0).is_nan());
    assert!(utilization(50, 50) == 100.0);
}

#[test]
fn test_read_exec_log() {
    assert!(read_exec_log(Path::new("../tests/schedlog/cpu0.log")).unwrap() == 120);
    assert!(read_exec_log(Path::new("../tests/schedlog/cpu1.log")).unwrap() == 60);
    // No trailing numbers at all.
    assert!(read_exec_log(Path::new("../tests/schedlog/io4.log")).unwrap() == 0);
    assert!(read_exec_log(Path::new("../tests/schedlog/empty.log")).unwrap() == 0);
    assert!(read_exec_log(Path::new("../tests/schedlog/cpu9.log")).is_err());
}

#[test]
fn test_cpu_logs_path() {
    let logs = CpuLogs::new("/tmp/run", "core{}.txt");
    assert!(logs.path(3) == Path::new("/tmp/run/core3.txt"));
}

#[test]
fn test_max_cpu_id() {
    let cpu = Ustr::from("CPU");
    let events = events_of(&["0 CPU 2 -1 INIT", "0 IO 5 -1 INIT", "3 CPU 0 1 ENTER_CPU"]);
    assert!(max_cpu_id(&events, cpu) == Some(2));
    assert!(max_cpu_id(&events, Ustr::from("GPU")).is_none());
    assert!(max_cpu_id(&[], cpu).is_none());
}

#[test]
fn test_cpu_records() {
    let events = events_of(&[
        "0 CPU 0 -1 INIT",
        "200 CPU 0 1 LEAVE_CPU 25",
        "10 CPU 0 1 ENTER_CPU",
        "2 CPU 1 -1 INIT",
        "90 IO 4 1 ENTER_IO",
    ]);
    let logs = CpuLogs::new("../tests/schedlog", "cpu{}.log");
    let records = cpu_records(&events, Ustr::from("CPU"), &logs).unwrap();
    assert!(records.len() == 2);

    // cpu0.log sums to 120.
    assert!(records[0].cpu_id == 0);
    assert!(records[0].busy_time == 120);
    assert!(records[0].window == 190);
    assert!(format!("{:.2}", records[0].utilization) == "63.16");

    // A single record gives an empty window and zero utilization, busy time notwithstanding.
    assert!(records[1].cpu_id == 1);
    assert!(records[1].busy_time == 60);
    assert!(records[1].window == 0);
    assert!(records[1].utilization == 0.0);
}

#[test]
fn test_cpu_records_gap_and_missing_log() {
    // CPU 1 has no traffic but is below the max id, so it is included and needs cpu1.log; CPU 2
    // has no log in the test directory.
    let events = events_of(&["0 CPU 0 -1 INIT", "0 CPU 2 -1 INIT"]);
    let logs = CpuLogs::new("../tests/schedlog", "cpu{}.log");
    match cpu_records(&events, Ustr::from("CPU"), &logs) {
        Err(TraceError::MissingCpuLog { cpu_id, path, .. }) => {
            assert!(cpu_id == 2);
            assert!(path == Path::new("../tests/schedlog/cpu2.log"));
        }
        _ => panic!("Expected a missing log"),
    }

    let events = events_of(&["0 CPU 0 -1 INIT", "5 CPU 1 -1 INIT"]);
    let records = cpu_records(&events, Ustr::from("CPU"), &logs).unwrap();
    assert!(records.len() == 2);
    assert!(records.iter().all(|r| r.window == 0 && r.utilization == 0.0));
}

#[test]
fn test_cpu_records_no_cpus() {
    let events = events_of(&["0 IO 4 -1 INIT"]);
    let logs = CpuLogs::new("../tests/schedlog/nowhere", "cpu{}.log");
    assert!(cpu_records(&events, Ustr::from("CPU"), &logs)
        .unwrap()
        .is_empty());
}
