//! Run configuration handed to the analyzer and the report renderer.
//!
//! Defaults:
//! - log directory: `tests/logs/analyzers` (one subdirectory per tool)
//! - tools: helgrind, drd, tsan
//! - exclude: `debug.h`; include: none
//! - detailed report capped at 10 issues per tool

use crate::filter::DEFAULT_EXCLUDES;
use crate::issue::Tool;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_LOG_DIR: &str = "tests/logs/analyzers";
pub const DEFAULT_TOOLS: &str = "helgrind,drd,tsan";
pub const DEFAULT_MAX_ISSUES: usize = 10;

/// What to scan and which blocks to keep
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub log_dir: PathBuf,
    pub tools: Vec<Tool>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    /// Parse each tool's files on the rayon pool
    pub parallel: bool,
    /// Keep only issues touching one of these file base names (empty keeps all)
    pub only_files: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            tools: Tool::ALL.to_vec(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
            parallel: false,
            only_files: Vec::new(),
        }
    }
}

/// How the text report is laid out
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub summary_only: bool,
    pub max_issues: usize,
    pub count_by_file: bool,
    pub show_raw: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            summary_only: false,
            max_issues: DEFAULT_MAX_ISSUES,
            count_by_file: false,
            show_raw: false,
        }
    }
}

/// Parse a comma-separated tool list such as `"Helgrind, tsan"`.
///
/// Unknown names are reported and skipped; repeats are kept once.
pub fn parse_tool_list(list: &str) -> Vec<Tool> {
    let mut tools = Vec::new();

    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<Tool>() {
            Ok(tool) if !tools.contains(&tool) => tools.push(tool),
            Ok(_) => {}
            Err(err) => warn!("Skipping {}", err),
        }
    }

    tools
}

/// Split a comma-separated list into trimmed, non-empty entries.
pub fn parse_name_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
