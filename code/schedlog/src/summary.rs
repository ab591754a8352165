/// Corpus-wide averages of the per-task metrics.
use crate::{TaskMetrics, TraceError};

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusSummary {
    /// Number of tasks that went into the averages.
    pub num_tasks: usize,

    // Unweighted means across tasks, None if there are no tasks.
    pub avg_waiting: Option<f64>,
    pub avg_turnaround: Option<f64>,
    pub avg_response: Option<f64>,
}

/// The averages of a nonempty corpus.

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Averages {
    pub waiting: f64,
    pub turnaround: f64,
    pub response: f64,
}

impl CorpusSummary {
    pub fn is_empty(&self) -> bool {
        self.num_tasks == 0
    }

    /// All three averages, or `TraceError::EmptyCorpus` if there was nothing to average.
    pub fn averages(&self) -> Result<Averages, TraceError> {
        match (self.avg_waiting, self.avg_turnaround, self.avg_response) {
            (Some(waiting), Some(turnaround), Some(response)) => Ok(Averages {
                waiting,
                turnaround,
                response,
            }),
            _ => Err(TraceError::EmptyCorpus),
        }
    }
}

// The sum is exact (integer) so the mean does not depend on the order of the records.

fn mean<I: Iterator<Item = i64>>(xs: I) -> Option<f64> {
    let (sum, count) = xs.fold((0i128, 0usize), |(sum, count), x| {
        (sum + x as i128, count + 1)
    });
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

pub fn summarize(records: &[TaskMetrics]) -> CorpusSummary {
    CorpusSummary {
        num_tasks: records.len(),
        avg_waiting: mean(records.iter().map(|r| r.waiting_time)),
        avg_turnaround: mean(records.iter().map(|r| r.turnaround_time)),
        avg_response: mean(records.iter().map(|r| r.response_time)),
    }
}

#[cfg(test)]
fn record(task_id: i32, waiting_time: i64, turnaround_time: i64, response_time: i64) -> TaskMetrics {
    TaskMetrics {
        task_id,
        waiting_time,
        turnaround_time,
        response_time,
        consistent: response_time >= 0,
    }
}

#[test]
fn test_summarize() {
    let s = summarize(&[record(1, 5, 30, 5), record(2, 15, 190, 5), record(3, 10, 70, 10)]);
    assert!(s.num_tasks == 3);
    assert!(!s.is_empty());
    let a = s.averages().unwrap();
    assert!(format!("{:.2}", a.waiting) == "10.00");
    assert!(format!("{:.2}", a.turnaround) == "96.67");
    assert!(format!("{:.2}", a.response) == "6.67");
}

#[test]
fn test_summarize_empty() {
    let s = summarize(&[]);
    assert!(s.is_empty());
    assert!(s.avg_waiting.is_none() && s.avg_turnaround.is_none() && s.avg_response.is_none());
    assert!(matches!(s.averages(), Err(TraceError::EmptyCorpus)));
}

#[test]
fn test_summarize_order_independent() {
    let mut rs = vec![record(1, 1, 7, 3), record(2, 2, 11, -1), record(3, 4, 13, 2)];
    let s1 = summarize(&rs);
    rs.reverse();
    let s2 = summarize(&rs);
    assert!(s1 == s2);
    assert!(s1.avg_response == Some(4.0 / 3.0));
}
