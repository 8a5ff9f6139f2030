// Declare our modules
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod issue;
pub mod parser;
pub mod patterns;

// Re-export key types for convenience
pub use analyzer::{ThreadLogAnalyzer, ToolIssueSet};
pub use cli::Args;
pub use config::{AnalysisConfig, ReportOptions};
pub use dedup::dedupe;
pub use error::{Error, Result};
pub use formatter::{render_json, render_text};
pub use issue::{Category, Issue, Tool};
