/// Per-task scheduling metrics.
///
/// A task's life in the trace is a sequence of dispatch cycles: it becomes runnable (ENTER_SCHED),
/// waits, runs (ENTER_CPU), and then either finishes, goes to I/O and comes back, or is preempted
/// and re-enters the dispatch queue.  From the task's timeline we compute:
///
/// - response time: first ENTER_CPU minus first ENTER_SCHED
///
/// - turnaround time: last FINISH_CPU/FINISH_IO minus first ENTER_SCHED, or, if the completion was
///   not observed in the trace, the last event of any kind minus first ENTER_SCHED
///
/// - waiting time: the sum, over every ENTER_CPU, of the time since the most recent ENTER_SCHED
///   strictly before it
///
/// An ENTER_CPU with no earlier ENTER_SCHED contributes nothing to the waiting time.  For a trace
/// that was truncated at the start this understates the true waiting time; we do not try to guess
/// the missing dispatch.
///
/// A task without at least one ENTER_SCHED and one ENTER_CPU gets no metrics at all.
use crate::{Event, EventKind, TaskTimelines, Timestamp};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMetrics {
    pub task_id: i32,
    pub waiting_time: i64,
    pub turnaround_time: i64,
    pub response_time: i64,

    /// False if the task ran before it was first dispatched, which makes the response time
    /// negative.  That can only come from an inconsistent trace; the record is kept but flagged.
    pub consistent: bool,
}

// Exact for any two timestamps the trace reader accepts, as both are at most i64::MAX.
fn delta(later: Timestamp, earlier: Timestamp) -> i64 {
    later as i64 - earlier as i64
}

/// Compute the metrics for one task from its timeline, which must be sorted ascending by time (see
/// `build_timelines`).  Returns None if the task never both entered the dispatch queue and ran.

pub fn task_metrics(task_id: i32, timeline: &[Event]) -> Option<TaskMetrics> {
    debug_assert!(timeline
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));

    let mut sched = vec![];
    let mut cpu = vec![];
    let mut last_finish: Option<Timestamp> = None;
    for e in timeline {
        match e.kind {
            EventKind::EnterSched => sched.push(e.timestamp),
            EventKind::EnterCpu => cpu.push(e.timestamp),
            kind if kind.is_finish() => last_finish = Some(e.timestamp),
            _ => {}
        }
    }

    if sched.is_empty() || cpu.is_empty() {
        return None;
    }

    let first_sched = sched[0];
    let last_event_time = timeline[timeline.len() - 1].timestamp;

    let turnaround_time = delta(last_finish.unwrap_or(last_event_time), first_sched);
    let response_time = delta(cpu[0], first_sched);
    let waiting_time = cpu
        .iter()
        .map(|&entered| match latest_before(&sched, entered) {
            Some(dispatched) => delta(entered, dispatched),
            None => 0,
        })
        .sum::<i64>();

    Some(TaskMetrics {
        task_id,
        waiting_time,
        turnaround_time,
        response_time,
        consistent: response_time >= 0,
    })
}

// The greatest element of the ascending slice `xs` that is strictly less than `t`.

fn latest_before(xs: &[Timestamp], t: Timestamp) -> Option<Timestamp> {
    match xs.partition_point(|&x| x < t) {
        0 => None,
        k => Some(xs[k - 1]),
    }
}

/// Compute metrics for every task that qualifies, sorted by task id.  The tasks are independent
/// and are processed in parallel.

pub fn all_task_metrics(timelines: &TaskTimelines) -> Vec<TaskMetrics> {
    let mut records = timelines
        .par_iter()
        .filter_map(|(task_id, timeline)| task_metrics(*task_id, timeline))
        .collect::<Vec<TaskMetrics>>();
    records.sort_by_key(|r| r.task_id);
    for r in records.iter().filter(|r| !r.consistent) {
        log::warn!(
            "Task {} entered a CPU {} before it was first dispatched",
            r.task_id,
            -r.response_time
        );
    }
    records
}

#[cfg(test)]
use crate::{build_timelines, parse_line};

#[cfg(test)]
fn timeline_of(lines: &[&str]) -> Vec<Event> {
    let events = lines
        .iter()
        .map(|l| parse_line(l).unwrap())
        .collect::<Vec<Event>>();
    let mut timelines = build_timelines(&events);
    assert!(timelines.len() == 1);
    let (_, timeline) = timelines.drain().next().unwrap();
    timeline
}

#[test]
fn test_single_burst() {
    let tl = timeline_of(&[
        "10 CPU 0 1 ENTER_SCHED",
        "15 CPU 0 1 ENTER_CPU",
        "40 CPU 0 1 FINISH_CPU 25",
    ]);
    let m = task_metrics(1, &tl).unwrap();
    assert!(m.waiting_time == 5);
    assert!(m.response_time == 5);
    assert!(m.turnaround_time == 30);
    assert!(m.consistent);
}

#[test]
fn test_largest_timestamps() {
    let tl = timeline_of(&[
        "0 CPU 0 1 ENTER_SCHED",
        "9223372036854775806 CPU 0 1 ENTER_CPU",
        "9223372036854775807 CPU 0 1 FINISH_CPU 1",
    ]);
    let m = task_metrics(1, &tl).unwrap();
    assert!(m.waiting_time == i64::MAX - 1);
    assert!(m.response_time == i64::MAX - 1);
    assert!(m.turnaround_time == i64::MAX);
    assert!(m.consistent);
}

#[test]
fn test_multiple_dispatch_cycles() {
    let tl = timeline_of(&[
        "0 CPU 0 2 ENTER_SCHED",
        "5 CPU 0 2 ENTER_CPU",
        "12 CPU 0 2 LEAVE_CPU 7",
        "20 CPU 0 2 ENTER_SCHED",
        "50 CPU 1 2 ENTER_CPU",
    ]);
    let m = task_metrics(2, &tl).unwrap();
    assert!(m.waiting_time == (5 - 0) + (50 - 20));
    assert!(m.response_time == 5);
    // No FINISH, so turnaround runs to the last event.
    assert!(m.turnaround_time == 50);
}

#[test]
fn test_unobserved_completion() {
    let tl = timeline_of(&[
        "100 CPU 0 3 ENTER_SCHED",
        "130 CPU 0 3 ENTER_CPU",
        "170 CPU 0 3 LEAVE_CPU 40",
        "190 IO 4 3 ENTER_IO",
    ]);
    let m = task_metrics(3, &tl).unwrap();
    assert!(m.turnaround_time == 190 - 100);
    assert!(m.waiting_time == 30);
}

#[test]
fn test_latest_finish_wins() {
    let tl = timeline_of(&[
        "0 CPU 0 4 ENTER_SCHED",
        "1 CPU 0 4 ENTER_CPU",
        "3 CPU 0 4 FINISH_IO",
        "9 CPU 0 4 FINISH_CPU 2",
        "12 CPU 0 4 LEAVE_CPU 0",
    ]);
    let m = task_metrics(4, &tl).unwrap();
    assert!(m.turnaround_time == 9);
}

#[test]
fn test_missing_correlation() {
    // The first CPU entry has no earlier dispatch (truncated trace) and contributes nothing.  A
    // dispatch at the same instant as the entry is not "strictly before" it.
    let tl = timeline_of(&[
        "5 CPU 0 5 ENTER_CPU",
        "8 CPU 0 5 LEAVE_CPU 3",
        "20 CPU 0 5 ENTER_SCHED",
        "20 CPU 0 5 ENTER_CPU",
        "30 CPU 0 5 ENTER_SCHED",
        "34 CPU 0 5 ENTER_CPU",
    ]);
    let m = task_metrics(5, &tl).unwrap();
    assert!(m.waiting_time == 4);
    assert!(m.response_time == 5 - 20);
    assert!(!m.consistent);
}

#[test]
fn test_skipped_tasks() {
    let never_ran = timeline_of(&["10 CPU 0 6 ENTER_SCHED", "20 IO 4 6 ENTER_IO"]);
    assert!(task_metrics(6, &never_ran).is_none());

    let never_dispatched = timeline_of(&["10 CPU 0 7 ENTER_CPU", "20 CPU 0 7 FINISH_CPU 10"]);
    assert!(task_metrics(7, &never_dispatched).is_none());

    let device = timeline_of(&["0 CPU 0 -1 INIT"]);
    assert!(task_metrics(-1, &device).is_none());
}

#[test]
fn test_latest_before() {
    let xs = [0, 20, 20, 45];
    assert!(latest_before(&xs, 0).is_none());
    assert!(latest_before(&xs, 1) == Some(0));
    assert!(latest_before(&xs, 20) == Some(0));
    assert!(latest_before(&xs, 21) == Some(20));
    assert!(latest_before(&xs, 1000) == Some(45));
    assert!(latest_before(&[], 1000).is_none());
}

#[test]
fn test_all_task_metrics() {
    let events = [
        "0 CPU 0 -1 INIT",
        "30 CPU 1 3 ENTER_CPU",
        "10 CPU 0 1 ENTER_SCHED",
        "20 CPU 1 3 ENTER_SCHED",
        "15 CPU 0 1 ENTER_CPU",
        "16 CPU 0 2 ENTER_SCHED",
    ]
    .iter()
    .map(|l| parse_line(l).unwrap())
    .collect::<Vec<Event>>();
    let records = all_task_metrics(&build_timelines(&events));
    assert!(records.len() == 2);
    assert!(records[0].task_id == 1 && records[1].task_id == 3);
    assert!(records.iter().all(|r| r.waiting_time >= 0));
}
