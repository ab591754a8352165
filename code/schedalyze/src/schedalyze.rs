/// `schedalyze` -- Analyze scheduler simulator traces
///
/// Run with --help for brief help, or with --fmt=help on any printing command for the available
/// output fields.
///
/// Quirks
///
/// The record filters (--task, --exclude-task, and the config file's exclude-task) select the
/// records that go into the task metrics and the records that `parse` prints.  They do not apply to
/// the CPU figures: busy times come from the execution logs, which cannot be filtered, and the
/// observation windows are always computed from all CPU records of the trace.  So `cpus`, `report`
/// and `summary` agree on utilization no matter which tasks are selected.
///
/// When the trace is given as a file name after `--`, the execution logs are looked for in the
/// directory of that file, not in the data path.
mod cpus;
mod format;
mod parse;
mod report;
mod summary;
mod tasks;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use schedlog::{analyze, parse_logfile, AnalysisOptions, CpuLogs, Event};
use std::collections::HashSet;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use traceutils::{check_cpu_log_pattern, read_analysis_config, AnalysisConfig};
use ustr::Ustr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print information about the program
    Version,

    /// Print waiting, turnaround, and response time for every task
    Tasks(PrintCmdArgs),

    /// Print busy time, observation window, and utilization for every CPU
    Cpus(PrintCmdArgs),

    /// Print the averages of the per-task metrics
    Summary(PrintCmdArgs),

    /// Print CPU busy times and windows, task averages, and CPU utilizations as plain text
    Report(ReportCmdArgs),

    /// Parse the trace, apply record filtering, and print the events
    Parse(PrintCmdArgs),
}

impl Commands {
    fn print_args(&self) -> Option<&PrintArgs> {
        match self {
            Commands::Tasks(ref args)
            | Commands::Cpus(ref args)
            | Commands::Summary(ref args)
            | Commands::Parse(ref args) => Some(&args.print_args),
            Commands::Report(_) | Commands::Version => None,
        }
    }

    fn common_args(&self) -> Option<(&SourceArgs, &RecordFilterArgs, &MetaArgs)> {
        match self {
            Commands::Tasks(ref args)
            | Commands::Cpus(ref args)
            | Commands::Summary(ref args)
            | Commands::Parse(ref args) => {
                Some((&args.source_args, &args.record_filter_args, &args.meta_args))
            }
            Commands::Report(ref args) => {
                Some((&args.source_args, &args.record_filter_args, &args.meta_args))
            }
            Commands::Version => None,
        }
    }
}

#[derive(Args, Debug)]
pub struct PrintCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    record_filter_args: RecordFilterArgs,

    #[command(flatten)]
    print_args: PrintArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct ReportCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    record_filter_args: RecordFilterArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Select the directory holding the trace and the execution logs [default: $SCHEDTRACE_ROOT, or .]
    #[arg(long)]
    data_path: Option<String>,

    /// File name of the merged trace within the data directory [default: merged.log]
    #[arg(long)]
    trace: Option<String>,

    /// File containing JSON data describing the simulator run [default: none]
    #[arg(long)]
    config_file: Option<String>,

    /// Device kind that marks CPU records in the trace [default: CPU]
    #[arg(long)]
    cpu_tag: Option<String>,

    /// File name pattern for the per-CPU execution logs, `{}` is replaced by the CPU id [default: cpu{}.log]
    #[arg(long)]
    cpu_log: Option<String>,

    /// Trace file name (overrides --data-path and --trace)
    #[arg(last = true)]
    logfiles: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct RecordFilterArgs {
    /// Select records for this task id (repeatable) [default: all]
    #[arg(long, short)]
    task: Vec<i32>,

    /// Exclude records for this task id (repeatable) [default: none]
    #[arg(long)]
    exclude_task: Vec<i32>,
}

#[derive(Args, Debug, Default)]
pub struct PrintArgs {
    /// Select fields and format for the output [default: command dependent, try --fmt=help]
    #[arg(long)]
    fmt: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct MetaArgs {
    /// Print useful statistics about the input to stderr, and log debug messages
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    /// Print unformatted and/or debug-formatted data (for developers)
    #[arg(long, default_value_t = false)]
    raw: bool,
}

fn main() {
    match schedalyze() {
        Ok(()) => {}
        Err(msg) => {
            eprintln!("ERROR: {:#}", msg);
            process::exit(1);
        }
    }
}

fn schedalyze() -> Result<()> {
    let cli = Cli::parse();

    let Some((source_args, record_filter_args, meta_args)) = cli.command.common_args() else {
        // Syntax:
        //  - components of the version string are space-separated but there are spaces nowhere else
        //  - the keyword "schedalyze" is always the first component
        //  - every component is keyword(value)
        //  - "version" carries a semver
        println!("schedalyze version({})", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };

    if let Some(print_args) = cli.command.print_args() {
        if match cli.command {
            Commands::Tasks(_) => format::maybe_help(&print_args.fmt, &tasks::fmt_help),
            Commands::Cpus(_) => format::maybe_help(&print_args.fmt, &cpus::fmt_help),
            Commands::Summary(_) => format::maybe_help(&print_args.fmt, &summary::fmt_help),
            Commands::Parse(_) => format::maybe_help(&print_args.fmt, &parse::fmt_help),
            Commands::Report(_) | Commands::Version => false,
        } {
            return Ok(());
        }
    }

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    logger.format(|buf, record| writeln!(buf, "{}", record.args()));
    if meta_args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    // Analysis configuration, if specified.  Command line switches override the file.

    let config = if let Some(ref config_filename) = source_args.config_file {
        read_analysis_config(config_filename)
            .with_context(|| format!("Could not read config file {config_filename}"))?
    } else {
        AnalysisConfig::default()
    };
    if meta_args.verbose && !config.name.is_empty() {
        eprintln!("Run: {} {}", config.name, config.description);
    }

    let cpu_tag = source_args.cpu_tag.as_ref().unwrap_or(&config.cpu_tag);
    if cpu_tag.is_empty() || cpu_tag.contains(char::is_whitespace) {
        bail!("The CPU tag must be a single nonempty word");
    }
    let cpu_log = source_args.cpu_log.as_ref().unwrap_or(&config.cpu_log);
    check_cpu_log_pattern(cpu_log)?;

    // The trace file and the directory of the execution logs.

    let (trace_file, log_dir) = match source_args.logfiles.as_slice() {
        [] => {
            let data_path = if let Some(ref path) = source_args.data_path {
                PathBuf::from(path)
            } else if let Ok(val) = env::var("SCHEDTRACE_ROOT") {
                PathBuf::from(val)
            } else {
                PathBuf::from(".")
            };
            let trace = source_args.trace.as_ref().unwrap_or(&config.trace);
            (data_path.join(trace), data_path)
        }
        [logfile] => {
            let trace_file = PathBuf::from(logfile);
            let log_dir = trace_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            (trace_file, log_dir)
        }
        _ => bail!("At most one trace file can be given"),
    };

    if meta_args.verbose {
        eprintln!("Trace file: {:?}", trace_file);
        eprintln!("Execution logs: {:?}", log_dir.join(cpu_log));
    }

    // Record filtering logic is the same for all commands.

    let include_tasks = record_filter_args
        .task
        .iter()
        .copied()
        .collect::<HashSet<i32>>();
    let exclude_tasks = record_filter_args
        .exclude_task
        .iter()
        .map(|&t| t as i64)
        .chain(config.exclude_task.iter().copied())
        .collect::<HashSet<i64>>();

    let record_filter = |e: &Event| {
        (include_tasks.is_empty() || include_tasks.contains(&e.task_id))
            && !exclude_tasks.contains(&(e.task_id as i64))
    };

    let mut events = vec![];
    let discarded = parse_logfile(&trace_file.to_string_lossy(), &mut events)?;
    if meta_args.verbose {
        eprintln!("Number of events read: {}", events.len());
        eprintln!("Number of records discarded: {discarded}");
    }

    if let Commands::Parse(ref parse_args) = cli.command {
        let events = events
            .into_iter()
            .filter(|e| record_filter(e))
            .collect::<Vec<Event>>();
        return parse::print_parsed_data(
            &mut io::stdout(),
            &parse_args.print_args,
            meta_args,
            &events,
        );
    }

    let opts = AnalysisOptions {
        cpu_tag: Ustr::from(cpu_tag.as_str()),
        cpu_logs: CpuLogs::new(log_dir, cpu_log),
    };
    let analysis = analyze(&events, &record_filter, &opts)?;
    if meta_args.verbose {
        eprintln!("Number of events after input filtering: {}", analysis.num_events);
        eprintln!("Number of task timelines: {}", analysis.num_timelines);
        eprintln!("Number of tasks with metrics: {}", analysis.tasks.len());
        eprintln!(
            "Number of CPUs: {}",
            analysis.cpus().map(|cpus| cpus.len()).unwrap_or(0)
        );
    }

    match cli.command {
        Commands::Tasks(ref args) => tasks::print_tasks(
            &mut io::stdout(),
            &args.print_args,
            meta_args,
            &analysis.tasks,
        ),
        Commands::Cpus(ref args) => {
            cpus::print_cpus(&mut io::stdout(), &args.print_args, meta_args, &analysis)
        }
        Commands::Summary(ref args) => summary::print_summary(
            &mut io::stdout(),
            &args.print_args,
            meta_args,
            &analysis.summary,
        ),
        Commands::Report(_) => report::print_report(&mut io::stdout(), &analysis),
        Commands::Parse(_) | Commands::Version => Ok(()),
    }
}
