use crate::format;
use crate::{MetaArgs, PrintArgs};

use anyhow::Result;
use schedlog::Event;
use std::collections::HashMap;
use std::io::{self, Write};

/// Print the events in trace order.

pub fn print_parsed_data(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    meta_args: &MetaArgs,
    events: &[Event],
) -> Result<()> {
    if meta_args.raw {
        for e in events {
            writeln!(output, "{:?}", e)?;
        }
        return Ok(());
    }

    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, FMT_DEFAULTS, &formatters, &aliases)?;
    let mut opts = format::standard_options(&others)?;
    // `parse` defaults to headerless un-named csv.
    if !opts.fixed && !opts.csv && !opts.json {
        opts.csv = true;
        opts.header = false;
    }
    format::format_data(output, &fields, &formatters, &opts, events)
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "all";

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(EventDatum) -> String>,
    HashMap<String, Vec<String>>,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(EventDatum) -> String> = HashMap::new();
    let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
    formatters.insert("time".to_string(), &format_time);
    formatters.insert("device".to_string(), &format_device);
    formatters.insert("id".to_string(), &format_id);
    formatters.insert("task".to_string(), &format_task);
    formatters.insert("event".to_string(), &format_event);
    formatters.insert("payload".to_string(), &format_payload);

    aliases.insert(
        "all".to_string(),
        ["time", "device", "id", "task", "event", "payload"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );

    (formatters, aliases)
}

type EventDatum<'a> = &'a Event;

fn format_time(d: EventDatum) -> String {
    d.timestamp.to_string()
}

fn format_device(d: EventDatum) -> String {
    d.device.to_string()
}

fn format_id(d: EventDatum) -> String {
    d.device_id.to_string()
}

fn format_task(d: EventDatum) -> String {
    d.task_id.to_string()
}

fn format_event(d: EventDatum) -> String {
    d.kind.to_string()
}

fn format_payload(d: EventDatum) -> String {
    d.payload.map(|p| p.to_string()).unwrap_or_default()
}

#[cfg(test)]
use schedlog::parse_line;

#[cfg(test)]
fn print_to_string(fmt: Option<&str>, lines: &[&str]) -> String {
    let events = lines
        .iter()
        .map(|l| parse_line(l).unwrap())
        .collect::<Vec<Event>>();
    let print_args = PrintArgs {
        fmt: fmt.map(|s| s.to_string()),
    };
    let mut output = Vec::new();
    print_parsed_data(&mut output, &print_args, &MetaArgs::default(), &events).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_print_parsed_data() {
    let lines = ["10 CPU 0 1 ENTER_SCHED", "40 CPU 1 7 FINISH_CPU 25"];
    assert!(
        print_to_string(None, &lines)
            == "10,CPU,0,1,ENTER_SCHED,\n40,CPU,1,7,FINISH_CPU,25\n"
    );
    assert!(
        print_to_string(Some("time,event,fixed"), &lines)
            == "time  event\n10    ENTER_SCHED\n40    FINISH_CPU\n"
    );
    assert!(
        print_to_string(Some("task,payload,json"), &lines)
            == "[{\"task\":\"1\",\"payload\":\"\"},{\"task\":\"7\",\"payload\":\"25\"}]\n"
    );
}
