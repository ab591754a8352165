/// Failure conditions the caller needs to tell apart.  Malformed trace lines and missing event
/// correlations are not errors and never show up here.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    /// A per-CPU execution log that the discovered CPU range requires could not be read.
    #[error("Could not read execution log {} for CPU {cpu_id}: {source}", path.display())]
    MissingCpuLog {
        cpu_id: u32,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No task has both an ENTER_SCHED and an ENTER_CPU record, so there is nothing to average.
    #[error("No data available: no task was both dispatched and run")]
    EmptyCorpus,

    /// The trace has no CPU-tagged records, so there is no CPU to report on.
    #[error("No data available: no CPU lines found")]
    NoCpus,
}
