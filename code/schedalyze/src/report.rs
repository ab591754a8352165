/// The plain-text report, in the layout that downstream scripts scrape:
///
///   <blank>
///   CPU exec time:  [<busy time per CPU>]
///   CPU total time: [<window per CPU>]
///   <blank>
///   <average waiting time>
///   <average turnaround time>
///   <average response time>
///   <utilization per CPU, one per line>
///
/// All averages and utilizations have two decimals.  If there are no CPU records the report stops
/// after the first line with `No CPU lines found.`; if no task has metrics the three averages are
/// replaced by `No data available.`.
use anyhow::Result;
use itertools::Itertools;
use schedlog::{Analysis, TraceError};
use std::io::{self, Write};

pub fn print_report(output: &mut dyn io::Write, analysis: &Analysis) -> Result<()> {
    writeln!(output)?;
    let cpus = match analysis.cpus() {
        Ok(cpus) => cpus,
        Err(TraceError::NoCpus) => {
            writeln!(output, "No CPU lines found.")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    writeln!(
        output,
        "CPU exec time:  [{}]",
        cpus.iter().map(|c| c.busy_time).join(", ")
    )?;
    writeln!(
        output,
        "CPU total time: [{}]",
        cpus.iter().map(|c| c.window).join(", ")
    )?;
    writeln!(output)?;

    match analysis.summary.averages() {
        Ok(avg) => {
            writeln!(output, "{:.2}", avg.waiting)?;
            writeln!(output, "{:.2}", avg.turnaround)?;
            writeln!(output, "{:.2}", avg.response)?;
        }
        Err(TraceError::EmptyCorpus) => writeln!(output, "No data available.")?,
        Err(e) => return Err(e.into()),
    }

    for c in cpus {
        writeln!(output, "{:.2}", c.utilization)?;
    }
    Ok(())
}

#[cfg(test)]
use schedlog::{analyze, parse_line, parse_logfile, AnalysisOptions, CpuLogs, Event};

#[cfg(test)]
fn report_for(events: &[Event], dir: &str) -> String {
    let opts = AnalysisOptions {
        cpu_tag: ustr::Ustr::from("CPU"),
        cpu_logs: CpuLogs::new(dir, "cpu{}.log"),
    };
    let analysis = analyze(events, &|_: &Event| true, &opts).unwrap();
    let mut output = Vec::new();
    print_report(&mut output, &analysis).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_report() {
    let mut events = vec![];
    parse_logfile("../tests/schedlog/merged.log", &mut events).unwrap();
    assert!(
        report_for(&events, "../tests/schedlog")
            == "\n\
                CPU exec time:  [120, 60]\n\
                CPU total time: [225, 70]\n\
                \n\
                10.00\n\
                96.67\n\
                6.67\n\
                53.33\n\
                85.71\n"
    );
}

#[test]
fn test_report_no_tasks() {
    // CPU records only, and no task ever both dispatched and ran.
    let events = ["0 CPU 0 -1 INIT", "5 CPU 0 3 ENTER_CPU", "9 CPU 0 3 LEAVE_CPU 4"]
        .iter()
        .map(|l| parse_line(l).unwrap())
        .collect::<Vec<Event>>();
    assert!(
        report_for(&events, "../tests/schedlog")
            == "\n\
                CPU exec time:  [120]\n\
                CPU total time: [4]\n\
                \n\
                No data available.\n\
                3000.00\n"
    );
}

#[test]
fn test_report_no_cpus() {
    let mut events = vec![];
    parse_logfile("../tests/schedlog/nocpu/merged.log", &mut events).unwrap();
    assert!(report_for(&events, "../tests/schedlog/nocpu") == "\nNo CPU lines found.\n");
}
