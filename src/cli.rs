use crate::config::{
    AnalysisConfig, DEFAULT_LOG_DIR, DEFAULT_MAX_ISSUES, DEFAULT_TOOLS, ReportOptions,
    parse_name_list, parse_tool_list,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "threadsift")]
#[clap(about = "Summarize Helgrind, DRD and ThreadSanitizer logs", long_about = None)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Base directory containing one subdirectory of logs per tool
    #[clap(short = 'd', long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Comma-separated list of tools to analyze
    #[clap(short, long, default_value = DEFAULT_TOOLS)]
    pub tools: String,

    /// Drop blocks with a line containing this text (replaces the default)
    #[clap(short, long, default_value = "debug.h")]
    pub exclude: Vec<String>,

    /// Keep lines containing this text even if they match an exclude
    #[clap(short, long)]
    pub include: Vec<String>,

    /// Write the text report here instead of stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the issues as JSON to this file
    #[clap(short, long)]
    pub json: Option<PathBuf>,

    /// Show only summary statistics
    #[clap(short, long)]
    pub summary_only: bool,

    /// Maximum number of detailed issues per tool
    #[clap(short, long, default_value_t = DEFAULT_MAX_ISSUES)]
    pub max_issues: usize,

    /// Parse each tool's log files in parallel
    #[clap(long)]
    pub parallel: bool,

    /// Show issue counts per source file
    #[clap(short, long)]
    pub count_by_file: bool,

    /// Only report issues touching these files (comma-separated base names)
    #[clap(short = 'f', long)]
    pub only_files: Option<String>,

    /// Print each issue's raw analyzer output in the detailed report
    #[clap(long)]
    pub raw: bool,

    /// Render a previously exported JSON report instead of scanning logs
    #[clap(long)]
    pub from_json: Option<PathBuf>,
}

impl Args {
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            log_dir: self.log_dir.clone(),
            tools: parse_tool_list(&self.tools),
            exclude: self.exclude.clone(),
            include: self.include.clone(),
            parallel: self.parallel,
            only_files: self.only_files.as_deref().map(parse_name_list).unwrap_or_default(),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            summary_only: self.summary_only,
            max_issues: self.max_issues,
            count_by_file: self.count_by_file,
            show_raw: self.raw,
        }
    }
}
