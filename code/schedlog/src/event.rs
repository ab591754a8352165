use std::fmt;
use ustr::Ustr;

/// Microseconds since the simulator started.  All logs written by one simulator run share the
/// same origin, so timestamps from different device logs are comparable.  The trace reader only
/// accepts values up to i64::MAX.

pub type Timestamp = u64;

/// The kind of a trace record.  The simulator's vocabulary is open-ended; the kinds that the
/// metrics depend on have their own variants and everything else is carried as `Other` so that it
/// can still be printed.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The task became runnable and entered the dispatch queue.
    EnterSched,
    /// The task started executing on a CPU.
    EnterCpu,
    /// The task was taken off the CPU, usually with the quantum it used as payload.
    LeaveCpu,
    /// The task's last CPU burst completed.
    FinishCpu,
    EnterIo,
    LeaveIo,
    /// The task's I/O burst completed and was reported back to a CPU.
    FinishIo,
    /// Device startup marker, written with task id -1.
    Init,
    Other(Ustr),
}

impl EventKind {
    pub fn name(&self) -> &str {
        match self {
            EventKind::EnterSched => "ENTER_SCHED",
            EventKind::EnterCpu => "ENTER_CPU",
            EventKind::LeaveCpu => "LEAVE_CPU",
            EventKind::FinishCpu => "FINISH_CPU",
            EventKind::EnterIo => "ENTER_IO",
            EventKind::LeaveIo => "LEAVE_IO",
            EventKind::FinishIo => "FINISH_IO",
            EventKind::Init => "INIT",
            EventKind::Other(s) => s.as_str(),
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, EventKind::FinishCpu | EventKind::FinishIo)
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> EventKind {
        match s {
            "ENTER_SCHED" => EventKind::EnterSched,
            "ENTER_CPU" => EventKind::EnterCpu,
            "LEAVE_CPU" => EventKind::LeaveCpu,
            "FINISH_CPU" => EventKind::FinishCpu,
            "ENTER_IO" => EventKind::EnterIo,
            "LEAVE_IO" => EventKind::LeaveIo,
            "FINISH_IO" => EventKind::FinishIo,
            "INIT" => EventKind::Init,
            _ => EventKind::Other(Ustr::from(s)),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed trace record.  Events are never modified after parsing; downstream code copies them
/// into timelines, which is cheap because the strings are interned.
///
/// There may be very many of these, so the device kind is a Ustr and the ids are 32-bit.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Timestamp,

    /// The device kind that wrote the record, `CPU` or `IO` for the stock simulator.
    pub device: Ustr,

    pub device_id: u32,

    /// -1 for records that concern the device rather than a task.
    pub task_id: i32,

    pub kind: EventKind,

    /// Trailing number, present on some records only, eg the quantum on LEAVE_CPU and FINISH_CPU.
    pub payload: Option<u64>,
}

#[test]
fn test_event_kind_names() {
    for name in [
        "ENTER_SCHED",
        "ENTER_CPU",
        "LEAVE_CPU",
        "FINISH_CPU",
        "ENTER_IO",
        "LEAVE_IO",
        "FINISH_IO",
        "INIT",
        "PREEMPT",
    ] {
        assert!(EventKind::from(name).name() == name);
    }
    assert!(EventKind::from("PREEMPT") == EventKind::Other(Ustr::from("PREEMPT")));
    assert!(EventKind::from("FINISH_IO").is_finish());
    assert!(EventKind::from("FINISH_CPU").is_finish());
    assert!(!EventKind::from("LEAVE_CPU").is_finish());
    assert!(format!("{}", EventKind::EnterCpu) == "ENTER_CPU");
}
