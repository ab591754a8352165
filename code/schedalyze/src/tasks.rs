use crate::format;
use crate::{MetaArgs, PrintArgs};

use anyhow::Result;
use schedlog::TaskMetrics;
use std::collections::HashMap;
use std::io::{self, Write};

pub fn print_tasks(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    meta_args: &MetaArgs,
    tasks: &[TaskMetrics],
) -> Result<()> {
    if meta_args.raw {
        for t in tasks {
            writeln!(output, "{:?}", t)?;
        }
        return Ok(());
    }

    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, FMT_DEFAULTS, &formatters, &aliases)?;
    let opts = format::standard_options(&others)?;
    format::format_data(output, &fields, &formatters, &opts, tasks)
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "task,waiting,turnaround,response";

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(TaskDatum) -> String>,
    HashMap<String, Vec<String>>,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(TaskDatum) -> String> = HashMap::new();
    let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
    formatters.insert("task".to_string(), &format_task);
    formatters.insert("waiting".to_string(), &format_waiting);
    formatters.insert("turnaround".to_string(), &format_turnaround);
    formatters.insert("response".to_string(), &format_response);
    formatters.insert("consistent".to_string(), &format_consistent);

    aliases.insert(
        "all".to_string(),
        ["task", "waiting", "turnaround", "response", "consistent"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );

    (formatters, aliases)
}

type TaskDatum<'a> = &'a TaskMetrics;

fn format_task(d: TaskDatum) -> String {
    d.task_id.to_string()
}

fn format_waiting(d: TaskDatum) -> String {
    d.waiting_time.to_string()
}

fn format_turnaround(d: TaskDatum) -> String {
    d.turnaround_time.to_string()
}

fn format_response(d: TaskDatum) -> String {
    d.response_time.to_string()
}

fn format_consistent(d: TaskDatum) -> String {
    let s = if d.consistent { "yes" } else { "no" };
    s.to_string()
}

#[cfg(test)]
fn test_tasks() -> Vec<TaskMetrics> {
    vec![
        TaskMetrics {
            task_id: 1,
            waiting_time: 5,
            turnaround_time: 30,
            response_time: 5,
            consistent: true,
        },
        TaskMetrics {
            task_id: 12,
            waiting_time: 0,
            turnaround_time: 190,
            response_time: -15,
            consistent: false,
        },
    ]
}

#[cfg(test)]
fn print_to_string(fmt: Option<&str>) -> String {
    let print_args = PrintArgs {
        fmt: fmt.map(|s| s.to_string()),
    };
    let mut output = Vec::new();
    print_tasks(&mut output, &print_args, &MetaArgs::default(), &test_tasks()).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_print_tasks() {
    assert!(
        print_to_string(None)
            == "task  waiting  turnaround  response\n\
                1     5        30          5\n\
                12    0        190         -15\n"
    );
    assert!(print_to_string(Some("task,consistent,csv")) == "1,yes\n12,no\n");
    assert!(print_to_string(Some("all,csvnamed")).starts_with("task=1,waiting=5,"));
    assert!(print_to_string(Some("task,json")) == "[{\"task\":\"1\"},{\"task\":\"12\"}]\n");
}

#[test]
fn test_print_tasks_bad_fmt() {
    let print_args = PrintArgs {
        fmt: Some("task,wating".to_string()),
    };
    let mut output = Vec::new();
    assert!(print_tasks(&mut output, &print_args, &MetaArgs::default(), &test_tasks()).is_err());
}
