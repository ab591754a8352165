// Misc utilities useful to both schedlog and schedalyze.

mod configs;
mod numbers;

// A structure representing the configuration of one analysis run.

pub use configs::AnalysisConfig;

// Read an analysis configuration from a file.

pub use configs::read_analysis_config;

// Expand and validate per-CPU log name patterns.

pub use configs::check_cpu_log_pattern;
pub use configs::expand_cpu_log;

// Strict, non-allocating integer token parsers.

pub use numbers::parse_digits;
pub use numbers::parse_signed;
