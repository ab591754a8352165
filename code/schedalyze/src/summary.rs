use crate::format;
use crate::{MetaArgs, PrintArgs};

use anyhow::Result;
use schedlog::CorpusSummary;
use std::collections::HashMap;
use std::io::{self, Write};

/// Print the corpus averages as a single row, or a note if no task had metrics.

pub fn print_summary(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    meta_args: &MetaArgs,
    summary: &CorpusSummary,
) -> Result<()> {
    if meta_args.raw {
        writeln!(output, "{:?}", summary)?;
        return Ok(());
    }

    if summary.is_empty() {
        writeln!(output, "No data available.")?;
        return Ok(());
    }

    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, FMT_DEFAULTS, &formatters, &aliases)?;
    let opts = format::standard_options(&others)?;
    format::format_data(output, &fields, &formatters, &opts, std::slice::from_ref(summary))
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "all";

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(SummaryDatum) -> String>,
    HashMap<String, Vec<String>>,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(SummaryDatum) -> String> =
        HashMap::new();
    let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
    formatters.insert("tasks".to_string(), &format_tasks);
    formatters.insert("waiting".to_string(), &format_waiting);
    formatters.insert("turnaround".to_string(), &format_turnaround);
    formatters.insert("response".to_string(), &format_response);

    aliases.insert(
        "all".to_string(),
        vec![
            "tasks".to_string(),
            "waiting".to_string(),
            "turnaround".to_string(),
            "response".to_string(),
        ],
    );

    (formatters, aliases)
}

type SummaryDatum<'a> = &'a CorpusSummary;

fn format_average(avg: Option<f64>) -> String {
    avg.map(|x| format!("{x:.2}")).unwrap_or_default()
}

fn format_tasks(d: SummaryDatum) -> String {
    d.num_tasks.to_string()
}

fn format_waiting(d: SummaryDatum) -> String {
    format_average(d.avg_waiting)
}

fn format_turnaround(d: SummaryDatum) -> String {
    format_average(d.avg_turnaround)
}

fn format_response(d: SummaryDatum) -> String {
    format_average(d.avg_response)
}

#[cfg(test)]
use schedlog::{summarize, TaskMetrics};

#[cfg(test)]
fn print_to_string(fmt: Option<&str>, summary: &CorpusSummary) -> String {
    let print_args = PrintArgs {
        fmt: fmt.map(|s| s.to_string()),
    };
    let mut output = Vec::new();
    print_summary(&mut output, &print_args, &MetaArgs::default(), summary).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_print_summary() {
    let summary = summarize(&[
        TaskMetrics {
            task_id: 1,
            waiting_time: 5,
            turnaround_time: 30,
            response_time: 5,
            consistent: true,
        },
        TaskMetrics {
            task_id: 2,
            waiting_time: 15,
            turnaround_time: 190,
            response_time: 5,
            consistent: true,
        },
        TaskMetrics {
            task_id: 3,
            waiting_time: 10,
            turnaround_time: 70,
            response_time: 10,
            consistent: true,
        },
    ]);
    assert!(
        print_to_string(None, &summary)
            == "tasks  waiting  turnaround  response\n\
                3      10.00    96.67       6.67\n"
    );
    assert!(print_to_string(Some("csv,waiting,response"), &summary) == "10.00,6.67\n");
    // A format control alone selects the default fields.
    assert!(
        print_to_string(Some("json"), &summary)
            == "[{\"tasks\":\"3\",\"waiting\":\"10.00\",\"turnaround\":\"96.67\",\"response\":\"6.67\"}]\n"
    );
}

#[test]
fn test_print_summary_empty() {
    assert!(print_to_string(None, &summarize(&[])) == "No data available.\n");
}
