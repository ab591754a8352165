/// Read analysis configuration data for a simulator run from a json file.
///
/// File format:
///
/// An object { ... } with the following named fields and value types:
///
///   name - string, the name of the run or experiment
///   description - string, optional, arbitrary text describing the run
///   cpu-tag - string, optional, the device kind that marks CPU records in the trace [default: CPU]
///   cpu-log - string, optional, file name pattern for the per-CPU execution logs, where `{}` is
///      replaced by the CPU id [default: cpu{}.log]
///   trace - string, optional, file name of the merged trace [default: merged.log]
///   exclude-task - array of integers, optional, task ids whose events should be dropped before
///      analysis
///
/// Any field name starting with '#' is reserved for arbitrary comments.
///
/// The `exclude-task` option exists for the case where the simulator emits housekeeping tasks that
/// should not count towards the averages.  It is on purpose very limited.
use anyhow::{bail, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path;

const DEFAULT_CPU_TAG: &str = "CPU";
const DEFAULT_CPU_LOG: &str = "cpu{}.log";
const DEFAULT_TRACE: &str = "merged.log";

// See above comment block for field documentation.

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub name: String,
    pub description: String,
    pub cpu_tag: String,
    pub cpu_log: String,
    pub trace: String,
    pub exclude_task: Vec<i64>,
}

impl Default for AnalysisConfig {
    fn default() -> AnalysisConfig {
        AnalysisConfig {
            name: "".to_string(),
            description: "".to_string(),
            cpu_tag: DEFAULT_CPU_TAG.to_string(),
            cpu_log: DEFAULT_CPU_LOG.to_string(),
            trace: DEFAULT_TRACE.to_string(),
            exclude_task: vec![],
        }
    }
}

/// The file name of the execution log for `cpu_id`, relative to the log directory.

pub fn expand_cpu_log(pattern: &str, cpu_id: u32) -> String {
    pattern.replacen("{}", &cpu_id.to_string(), 1)
}

/// Check that a CPU log pattern has exactly one `{}` hole.
pub fn check_cpu_log_pattern(pattern: &str) -> Result<()> {
    if pattern.matches("{}").count() != 1 {
        bail!("The CPU log pattern '{pattern}' must contain exactly one '{{}}'");
    }
    Ok(())
}

/// Since the input is human-generated and has optional fields, I've opted to use the generic JSON
/// parser followed by explicit decoding of the fields, rather than a (derived) strongly-typed
/// parser.

pub fn read_analysis_config(filename: &str) -> Result<AnalysisConfig> {
    let file = File::open(path::Path::new(filename))?;
    let reader = BufReader::new(file);
    let v = serde_json::from_reader(reader)?;
    let mut cfg: AnalysisConfig = Default::default();
    if let Value::Object(fields) = v {
        cfg.name = grab_string(&fields, "name")?;
        cfg.description = grab_string_opt(&fields, "description")?.unwrap_or_default();
        if let Some(tag) = grab_string_opt(&fields, "cpu-tag")? {
            if tag.is_empty() || tag.contains(char::is_whitespace) {
                bail!("The field 'cpu-tag' must be a single nonempty word");
            }
            cfg.cpu_tag = tag;
        }
        if let Some(pattern) = grab_string_opt(&fields, "cpu-log")? {
            check_cpu_log_pattern(&pattern)?;
            cfg.cpu_log = pattern;
        }
        if let Some(trace) = grab_string_opt(&fields, "trace")? {
            cfg.trace = trace;
        }
        cfg.exclude_task = grab_ints_opt(&fields, "exclude-task")?;
    } else {
        bail!("Expected an object value")
    }
    Ok(cfg)
}

fn grab_string(fields: &serde_json::Map<String, Value>, name: &str) -> Result<String> {
    if let Some(Value::String(s)) = fields.get(name) {
        Ok(s.to_string())
    } else {
        bail!("Field '{name}' must be present and have a string value");
    }
}

fn grab_string_opt(fields: &serde_json::Map<String, Value>, name: &str) -> Result<Option<String>> {
    match fields.get(name) {
        Some(Value::String(s)) => Ok(Some(s.to_string())),
        Some(_) => bail!("Field '{name}' must have a string value"),
        None => Ok(None),
    }
}

fn grab_ints_opt(fields: &serde_json::Map<String, Value>, name: &str) -> Result<Vec<i64>> {
    let mut result = vec![];
    match fields.get(name) {
        Some(Value::Array(vals)) => {
            for v in vals {
                if let Some(n) = v.as_i64() {
                    result.push(n);
                } else {
                    bail!("Field '{name}' must have integer values");
                }
            }
        }
        Some(_) => bail!("Field '{name}' must be an array"),
        None => {}
    }
    Ok(result)
}

// Basic whitebox tests that the reading of configs works.

#[test]
fn test_config() {
    let conf = read_analysis_config("../tests/schedlog/whitebox-config.json").unwrap();
    assert!(conf.name == "o1-two-cpus");
    assert!(conf.description == "O(1) scheduler, two CPUs, two IO devices");
    assert!(conf.cpu_tag == "CPU");
    assert!(conf.cpu_log == "cpu{}.log");
    assert!(conf.trace == "merged.log");
    assert!(conf.exclude_task == vec![99]);
}

#[test]
fn test_config_defaults() {
    let conf = read_analysis_config("../tests/schedlog/whitebox-config-minimal.json").unwrap();
    assert!(conf.name == "minimal");
    assert!(conf.description == "");
    assert!(conf == AnalysisConfig { name: "minimal".to_string(), ..Default::default() });
    assert!(conf.cpu_tag == "CPU" && conf.cpu_tag == DEFAULT_CPU_TAG);
    assert!(conf.cpu_log == "cpu{}.log" && conf.trace == "merged.log");
}

#[test]
fn test_config_errors() {
    assert!(read_analysis_config("../tests/schedlog/no-such-config.json").is_err());
    assert!(read_analysis_config("../tests/schedlog/whitebox-config-bad.json").is_err());
}

#[test]
fn test_cpu_log_pattern() {
    assert!(check_cpu_log_pattern("cpu{}.log").is_ok());
    assert!(check_cpu_log_pattern("cpu.log").is_err());
    assert!(check_cpu_log_pattern("cpu{}-{}.log").is_err());
    assert!(expand_cpu_log("logs/core{}.txt", 12) == "logs/core12.txt");
}
