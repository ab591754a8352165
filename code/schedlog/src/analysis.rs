/// The whole metrics pipeline over an already-read trace.
///
/// The record filter selects the events that go into the per-task timelines.  The CPU calculator
/// always sees every event: a CPU's busy time comes from its execution log, which cannot be
/// filtered, so its observation window must cover all of its trace records too.
///
/// The task calculator and the CPU calculator run side by side.  They only read the events and
/// timelines and each produces its own output, so no coordination is needed beyond joining them.
use crate::{
    all_task_metrics, build_timelines, cpu_records, summarize, CorpusSummary, CpuLogs, CpuRecord,
    Event, TaskMetrics, TraceError,
};

use ustr::Ustr;

pub struct AnalysisOptions {
    /// Device kind that marks CPU records.
    pub cpu_tag: Ustr,

    /// Location of the per-CPU execution logs.
    pub cpu_logs: CpuLogs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Number of events that passed the record filter and went into the task timelines.
    pub num_events: usize,

    /// Number of distinct task ids seen, whether or not they qualified for metrics.
    pub num_timelines: usize,

    /// Per-task metrics, sorted by task id.
    pub tasks: Vec<TaskMetrics>,

    pub summary: CorpusSummary,

    cpus: Vec<CpuRecord>,
}

impl Analysis {
    /// Per-CPU records ordered by id, or `TraceError::NoCpus` if the trace had no CPU records.
    pub fn cpus(&self) -> Result<&[CpuRecord], TraceError> {
        if self.cpus.is_empty() {
            Err(TraceError::NoCpus)
        } else {
            Ok(&self.cpus)
        }
    }
}

/// Run the pipeline on `events`, computing task metrics only from events for which `record_filter`
/// returns true.  CPU records are computed from all events.  Fails only if a required execution log
/// is missing; an empty trace is a valid (empty) analysis.

pub fn analyze<F>(
    events: &[Event],
    record_filter: &F,
    opts: &AnalysisOptions,
) -> Result<Analysis, TraceError>
where
    F: Fn(&Event) -> bool,
{
    let selected = events
        .iter()
        .filter(|&e| record_filter(e))
        .copied()
        .collect::<Vec<Event>>();
    let timelines = build_timelines(&selected);

    let (tasks, cpus) = rayon::join(
        || all_task_metrics(&timelines),
        || cpu_records(events, opts.cpu_tag, &opts.cpu_logs),
    );
    let cpus = cpus?;
    let summary = summarize(&tasks);

    log::debug!(
        "{} events, {} timelines, {} tasks with metrics, {} cpus",
        selected.len(),
        timelines.len(),
        tasks.len(),
        cpus.len()
    );

    Ok(Analysis {
        num_events: selected.len(),
        num_timelines: timelines.len(),
        tasks,
        summary,
        cpus,
    })
}

#[cfg(test)]
use crate::parse_logfile;

#[cfg(test)]
fn test_options(dir: &str) -> AnalysisOptions {
    AnalysisOptions {
        cpu_tag: Ustr::from("CPU"),
        cpu_logs: CpuLogs::new(dir, "cpu{}.log"),
    }
}

#[cfg(test)]
fn read_test_trace(file_name: &str) -> Vec<Event> {
    let mut events = vec![];
    parse_logfile(file_name, &mut events).unwrap();
    events
}

#[test]
fn test_analyze() {
    let events = read_test_trace("../tests/schedlog/merged.log");
    let a = analyze(&events, &|_: &Event| true, &test_options("../tests/schedlog")).unwrap();

    assert!(a.num_events == 18);
    // Tasks -1, 1, 2, 3
    assert!(a.num_timelines == 4);

    let tasks = a
        .tasks
        .iter()
        .map(|t| (t.task_id, t.waiting_time, t.turnaround_time, t.response_time))
        .collect::<Vec<_>>();
    assert!(tasks == vec![(1, 5, 30, 5), (2, 15, 190, 5), (3, 10, 70, 10)]);

    let avg = a.summary.averages().unwrap();
    assert!(format!("{:.2}", avg.waiting) == "10.00");
    assert!(format!("{:.2}", avg.turnaround) == "96.67");
    assert!(format!("{:.2}", avg.response) == "6.67");

    let cpus = a.cpus().unwrap();
    assert!(cpus.len() == 2);
    assert!(cpus[0].busy_time == 120 && cpus[0].window == 225);
    assert!(format!("{:.2}", cpus[0].utilization) == "53.33");
    assert!(cpus[1].busy_time == 60 && cpus[1].window == 70);
    assert!(format!("{:.2}", cpus[1].utilization) == "85.71");
}

#[test]
fn test_analyze_is_idempotent() {
    let events = read_test_trace("../tests/schedlog/merged.log");
    let opts = test_options("../tests/schedlog");
    let a = analyze(&events, &|_: &Event| true, &opts).unwrap();
    let b = analyze(&events, &|_: &Event| true, &opts).unwrap();
    assert!(a == b);
}

#[test]
fn test_analyze_filtered() {
    let events = read_test_trace("../tests/schedlog/merged.log");
    let opts = test_options("../tests/schedlog");
    let full = analyze(&events, &|_: &Event| true, &opts).unwrap();

    let only_others = |e: &Event| e.task_id != 2;
    let a = analyze(&events, &only_others, &opts).unwrap();
    assert!(a.tasks.len() == 2);
    assert!(a.tasks.iter().all(|t| t.task_id != 2));
    assert!(a.num_events < full.num_events);
    // The filter does not reach the CPU records.
    assert!(a.cpus().unwrap() == full.cpus().unwrap());
    assert!(a.cpus().unwrap()[0].window == 225);

    let only_task_2 = |e: &Event| e.task_id == 2;
    let b = analyze(&events, &only_task_2, &opts).unwrap();
    assert!(b.tasks.len() == 1 && b.tasks[0].task_id == 2);
    let cpu0 = &b.cpus().unwrap()[0];
    assert!(cpu0.busy_time == 120 && cpu0.window == 225);
    assert!(format!("{:.2}", cpu0.utilization) == "53.33");
}

#[test]
fn test_analyze_empty() {
    let a = analyze(&[], &|_: &Event| true, &test_options("../tests/schedlog")).unwrap();
    assert!(a.summary.is_empty());
    assert!(matches!(a.summary.averages(), Err(TraceError::EmptyCorpus)));
    assert!(matches!(a.cpus(), Err(TraceError::NoCpus)));
}

#[test]
fn test_analyze_no_cpus() {
    let events = read_test_trace("../tests/schedlog/nocpu/merged.log");
    let a = analyze(&events, &|_: &Event| true, &test_options("../tests/schedlog/nocpu")).unwrap();
    assert!(a.num_events == 2);
    assert!(matches!(a.cpus(), Err(TraceError::NoCpus)));
}

#[test]
fn test_analyze_missing_log() {
    let events = read_test_trace("../tests/schedlog/missing/merged.log");
    match analyze(&events, &|_: &Event| true, &test_options("../tests/schedlog/missing")) {
        Err(TraceError::MissingCpuLog { cpu_id: 0, .. }) => {}
        _ => panic!("Expected a missing log"),
    }
}
