// Blackbox tests: run the binary on the test traces and check what it prints.

use std::process::{Command, Output};

fn schedalyze(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schedalyze"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("SCHEDTRACE_ROOT")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout_of(args: &[&str]) -> String {
    let output = schedalyze(args);
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

const REPORT: &str = "
CPU exec time:  [120, 60]
CPU total time: [225, 70]

10.00
96.67
6.67
53.33
85.71
";

#[test]
fn test_version() {
    assert!(stdout_of(&["version"]) == "schedalyze version(0.1.0)\n");
}

#[test]
fn test_report_from_file() {
    assert!(stdout_of(&["report", "--", "../tests/schedlog/merged.log"]) == REPORT);
}

#[test]
fn test_report_from_data_path() {
    assert!(stdout_of(&["report", "--data-path", "../tests/schedlog"]) == REPORT);
}

#[test]
fn test_report_from_env() {
    let output = Command::new(env!("CARGO_BIN_EXE_schedalyze"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("SCHEDTRACE_ROOT", "../tests/schedlog")
        .arg("report")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap() == REPORT);
}

#[test]
fn test_report_with_config() {
    // The config only excludes a task that is not in the trace.
    assert!(
        stdout_of(&[
            "report",
            "--data-path",
            "../tests/schedlog",
            "--config-file",
            "../tests/schedlog/whitebox-config.json"
        ]) == REPORT
    );
}

#[test]
fn test_tasks() {
    assert!(
        stdout_of(&[
            "tasks",
            "--fmt=csv,task,waiting,turnaround,response",
            "--",
            "../tests/schedlog/merged.log"
        ]) == "1,5,30,5\n2,15,190,5\n3,10,70,10\n"
    );
    assert!(
        stdout_of(&[
            "tasks",
            "--task",
            "2",
            "--fmt=csvnamed,task,waiting",
            "--",
            "../tests/schedlog/merged.log"
        ]) == "task=2,waiting=15\n"
    );
    assert!(
        stdout_of(&[
            "tasks",
            "--exclude-task",
            "2",
            "--fmt=csv,task",
            "--",
            "../tests/schedlog/merged.log"
        ]) == "1\n3\n"
    );
}

#[test]
fn test_summary() {
    assert!(
        stdout_of(&["summary", "--fmt=json", "--", "../tests/schedlog/merged.log"])
            == "[{\"tasks\":\"3\",\"waiting\":\"10.00\",\"turnaround\":\"96.67\",\"response\":\"6.67\"}]\n"
    );
}

#[test]
fn test_cpus() {
    assert!(
        stdout_of(&["cpus", "--fmt=csv,cpu,util", "--", "../tests/schedlog/merged.log"])
            == "0,53.33\n1,85.71\n"
    );
}

#[test]
fn test_cpus_ignore_record_filters() {
    assert!(
        stdout_of(&[
            "cpus",
            "--task",
            "2",
            "--fmt=csv,cpu,busy,window,util",
            "--",
            "../tests/schedlog/merged.log"
        ]) == "0,120,225,53.33\n1,60,70,85.71\n"
    );
    assert!(
        stdout_of(&["report", "--exclude-task", "1", "--", "../tests/schedlog/merged.log"])
            .starts_with("\nCPU exec time:  [120, 60]\nCPU total time: [225, 70]\n")
    );
}

#[test]
fn test_parse() {
    let out = stdout_of(&["parse", "--task", "1", "--", "../tests/schedlog/merged.log"]);
    let lines = out.lines().collect::<Vec<&str>>();
    assert!(lines.len() == 3);
    assert!(lines[0] == "10,CPU,0,1,ENTER_SCHED,");
}

#[test]
fn test_no_cpus() {
    assert!(
        stdout_of(&["report", "--", "../tests/schedlog/nocpu/merged.log"])
            == "\nNo CPU lines found.\n"
    );
}

#[test]
fn test_missing_cpu_log() {
    let output = schedalyze(&["report", "--", "../tests/schedlog/missing/merged.log"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("ERROR: "));
    assert!(stderr.contains("CPU 0"));
}

#[test]
fn test_missing_trace() {
    let output = schedalyze(&["report", "--", "../tests/schedlog/no-such-trace.log"]);
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().starts_with("ERROR: "));
}

#[test]
fn test_bad_cpu_log_pattern() {
    let output = schedalyze(&[
        "report",
        "--cpu-log",
        "cpu.log",
        "--data-path",
        "../tests/schedlog",
    ]);
    assert!(!output.status.success());
}
