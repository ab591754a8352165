/// Reconstruct per-task timelines from an interleaved trace.
use crate::Event;

use std::collections::HashMap;

/// Map from task id to that task's events, ascending by timestamp.  Records with equal timestamps
/// keep their relative order from the input.
///
/// Task ids are not dense (and -1 is used for device records) so this is keyed by id rather than
/// indexed.

pub type TaskTimelines = HashMap<i32, Vec<Event>>;

/// Bucket events by task and sort each bucket.  Every task id that appears in at least one event
/// gets a timeline, even if that timeline holds a single record.

pub fn build_timelines(events: &[Event]) -> TaskTimelines {
    let mut timelines = TaskTimelines::new();
    for e in events {
        timelines.entry(e.task_id).or_default().push(*e);
    }
    for timeline in timelines.values_mut() {
        // sort_by_key is stable.
        timeline.sort_by_key(|e| e.timestamp);
    }
    timelines
}

#[cfg(test)]
use crate::parse_line;

#[test]
fn test_build_timelines() {
    let events = [
        "50 CPU 0 2 ENTER_CPU",
        "0 CPU 0 -1 INIT",
        "10 CPU 0 1 ENTER_SCHED",
        "45 CPU 0 2 ENTER_SCHED",
        "15 CPU 1 1 ENTER_CPU",
        "15 CPU 1 1 LEAVE_CPU 0",
        "12 IO 4 1 FINISH_IO",
    ]
    .iter()
    .map(|l| parse_line(l).unwrap())
    .collect::<Vec<Event>>();

    let timelines = build_timelines(&events);
    assert!(timelines.len() == 3);
    assert!(timelines[&-1].len() == 1);

    let t1 = timelines[&1]
        .iter()
        .map(|e| (e.timestamp, e.kind.name()))
        .collect::<Vec<_>>();
    assert!(
        t1 == vec![
            (10, "ENTER_SCHED"),
            (12, "FINISH_IO"),
            (15, "ENTER_CPU"),
            (15, "LEAVE_CPU"),
        ]
    );

    let t2 = &timelines[&2];
    assert!(t2[0].timestamp == 45 && t2[1].timestamp == 50);
}

#[test]
fn test_build_timelines_empty() {
    assert!(build_timelines(&[]).is_empty());
}
