/// A scheduler simulator trace is a structured log: every record is one line saying that at a
/// given time a given device (a CPU or an I/O device, each with an id) did something (an *event*)
/// on behalf of a given task.  Each simulated device thread writes its own log, and a run's logs
/// are catenated and merged into one trace.  The merged trace interleaves records for all tasks and
/// all devices, and need not be sorted.
///
/// Besides the trace, every CPU thread writes an *execution log* whose records carry the quantum
/// the CPU spent on a task as a trailing number.  These are the simulator's own account of CPU
/// busy time.
///
/// This library has as its fundamental task to reconstruct, for every task, the ordered sequence
/// of scheduling events from the trace, and to derive scheduling metrics from them.  This breaks
/// down into a number of subtasks:
///
/// - Parse the trace records, silently dropping records that are malformed (the logs are written
///   by concurrent threads and may be read while being written).
///
/// - Bucket the records by task and order each bucket by time (a *timeline*).
///
/// - Correlate events within a timeline to compute waiting, turnaround, and response times.
///
/// - Discover the CPUs in the trace, and combine their execution logs with the span of their trace
///   records to compute utilization.
///
/// - Average the per-task figures across the corpus.
mod analysis;
mod cpus;
mod errors;
mod event;
mod logfile;
mod metrics;
mod summary;
mod timeline;

// The trace record, its kinds, and the time type.

pub use event::Event;
pub use event::EventKind;
pub use event::Timestamp;

// Parse one trace line into an Event, or None if it is malformed.

pub use logfile::parse_line;

// Lazily parse events from any line source, counting discarded lines.

pub use logfile::EventReader;

// Parse a trace file into a vector of Events, returning the number of discarded records.

pub use logfile::parse_logfile;

// Map from task id to the task's events, sorted by time.

pub use timeline::build_timelines;
pub use timeline::TaskTimelines;

// Per-task waiting, turnaround, and response time.

pub use metrics::all_task_metrics;
pub use metrics::task_metrics;
pub use metrics::TaskMetrics;

// Per-CPU busy time, observation window, and utilization.

pub use cpus::cpu_busy_time;
pub use cpus::cpu_records;
pub use cpus::max_cpu_id;
pub use cpus::observation_window;
pub use cpus::read_exec_log;
pub use cpus::utilization;
pub use cpus::CpuLogs;
pub use cpus::CpuRecord;

// Averages across tasks.

pub use summary::summarize;
pub use summary::Averages;
pub use summary::CorpusSummary;

// The full pipeline: filter, build timelines, compute task and CPU metrics, summarize.

pub use analysis::analyze;
pub use analysis::Analysis;
pub use analysis::AnalysisOptions;

// Conditions that callers need to distinguish: a missing execution log, an empty corpus, no CPUs.

pub use errors::TraceError;
