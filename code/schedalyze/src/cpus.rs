use crate::format;
use crate::{MetaArgs, PrintArgs};

use anyhow::Result;
use schedlog::{Analysis, CpuRecord, TraceError};
use std::collections::HashMap;
use std::io::{self, Write};

/// Print one row per CPU in id order.  A trace without CPU records prints a note instead of an
/// empty table.

pub fn print_cpus(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    meta_args: &MetaArgs,
    analysis: &Analysis,
) -> Result<()> {
    let cpus = match analysis.cpus() {
        Ok(cpus) => cpus,
        Err(TraceError::NoCpus) => {
            writeln!(output, "No CPU lines found.")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if meta_args.raw {
        for c in cpus {
            writeln!(output, "{:?}", c)?;
        }
        return Ok(());
    }

    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, FMT_DEFAULTS, &formatters, &aliases)?;
    let opts = format::standard_options(&others)?;
    format::format_data(output, &fields, &formatters, &opts, cpus)
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "all";

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(CpuDatum) -> String>,
    HashMap<String, Vec<String>>,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(CpuDatum) -> String> = HashMap::new();
    let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
    formatters.insert("cpu".to_string(), &format_cpu);
    formatters.insert("busy".to_string(), &format_busy);
    formatters.insert("window".to_string(), &format_window);
    formatters.insert("util".to_string(), &format_util);

    aliases.insert(
        "all".to_string(),
        vec![
            "cpu".to_string(),
            "busy".to_string(),
            "window".to_string(),
            "util".to_string(),
        ],
    );

    (formatters, aliases)
}

type CpuDatum<'a> = &'a CpuRecord;

fn format_cpu(d: CpuDatum) -> String {
    d.cpu_id.to_string()
}

fn format_busy(d: CpuDatum) -> String {
    d.busy_time.to_string()
}

fn format_window(d: CpuDatum) -> String {
    d.window.to_string()
}

fn format_util(d: CpuDatum) -> String {
    format!("{:.2}", d.utilization)
}

#[cfg(test)]
use schedlog::{analyze, parse_logfile, AnalysisOptions, CpuLogs, Event};

#[cfg(test)]
fn analyze_test_trace(dir: &str) -> Analysis {
    let mut events = vec![];
    parse_logfile(&format!("{dir}/merged.log"), &mut events).unwrap();
    let opts = AnalysisOptions {
        cpu_tag: ustr::Ustr::from("CPU"),
        cpu_logs: CpuLogs::new(dir, "cpu{}.log"),
    };
    analyze(&events, &|_: &Event| true, &opts).unwrap()
}

#[test]
fn test_print_cpus() {
    let analysis = analyze_test_trace("../tests/schedlog");
    let mut output = Vec::new();
    print_cpus(&mut output, &PrintArgs::default(), &MetaArgs::default(), &analysis).unwrap();
    assert!(
        String::from_utf8(output).unwrap()
            == "cpu  busy  window  util\n\
                0    120   225     53.33\n\
                1    60    70      85.71\n"
    );

    let print_args = PrintArgs {
        fmt: Some("util,csv".to_string()),
    };
    let mut output = Vec::new();
    print_cpus(&mut output, &print_args, &MetaArgs::default(), &analysis).unwrap();
    assert!(String::from_utf8(output).unwrap() == "53.33\n85.71\n");
}

#[test]
fn test_print_no_cpus() {
    let analysis = analyze_test_trace("../tests/schedlog/nocpu");
    let mut output = Vec::new();
    print_cpus(&mut output, &PrintArgs::default(), &MetaArgs::default(), &analysis).unwrap();
    assert!(String::from_utf8(output).unwrap() == "No CPU lines found.\n");
}
