use crate::config::AnalysisConfig;
use crate::dedup::dedupe;
use crate::error::{Error, Result};
use crate::filter::BlockFilter;
use crate::issue::{Issue, IssueRecord, Tool};
use crate::parser::parser_for;
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Issues grouped by tool, in the order the tools were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolIssueSet {
    entries: Vec<(Tool, Vec<Issue>)>,
}

impl ToolIssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the issues for a tool, replacing any previous entry in place.
    pub fn insert(&mut self, tool: Tool, issues: Vec<Issue>) {
        match self.entries.iter_mut().find(|(t, _)| *t == tool) {
            Some((_, existing)) => *existing = issues,
            None => self.entries.push((tool, issues)),
        }
    }

    pub fn get(&self, tool: Tool) -> Option<&[Issue]> {
        self.entries
            .iter()
            .find(|(t, _)| *t == tool)
            .map(|(_, issues)| issues.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tool, &[Issue])> {
        self.entries.iter().map(|(tool, issues)| (*tool, issues.as_slice()))
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|(tool, _)| *tool).collect()
    }

    pub fn total_issues(&self) -> usize {
        self.entries.iter().map(|(_, issues)| issues.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every issue for which `keep` returns false.
    pub fn retain_issues<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Issue) -> bool,
    {
        for (_, issues) in self.entries.iter_mut() {
            issues.retain(|issue| keep(issue));
        }
    }
}

impl Serialize for ToolIssueSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (tool, issues) in &self.entries {
            let records: Vec<IssueRecord> = issues.iter().map(Issue::to_record).collect();
            map.serialize_entry(tool.as_str(), &records)?;
        }
        map.end()
    }
}

/// Drives discovery, parsing and deduplication for every requested tool.
pub struct ThreadLogAnalyzer {
    config: AnalysisConfig,
    filter: BlockFilter,
}

impl ThreadLogAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let filter = BlockFilter::new(&config.exclude, &config.include);
        ThreadLogAnalyzer { config, filter }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parse and deduplicate the logs of every configured tool.
    pub fn analyze(&self) -> ToolIssueSet {
        let mut set = ToolIssueSet::new();

        for &tool in &self.config.tools {
            let files = match find_log_files(&self.config.log_dir, tool) {
                Ok(files) => files,
                Err(err) => {
                    warn!("{}", err);
                    Vec::new()
                }
            };
            info!("Found {} log files for {}", files.len(), tool);

            let issues = dedupe(self.parse_files(tool, &files));
            set.insert(tool, issues);
        }

        if !self.config.only_files.is_empty() {
            let only = &self.config.only_files;
            set.retain_issues(|issue| touches_any_file(issue, only));
        }

        set
    }

    /// Parse every file of one tool, in the given order. Deduplication is
    /// left to the caller so it can see all files at once.
    pub fn parse_files(&self, tool: Tool, files: &[PathBuf]) -> Vec<Issue> {
        let parser = parser_for(tool);

        if self.config.parallel {
            files
                .par_iter()
                .map(|path| parser.parse_file(path, &self.filter))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            files
                .iter()
                .flat_map(|path| parser.parse_file(path, &self.filter))
                .collect()
        }
    }
}

/// List `<log_dir>/<tool>/<tool>_*.log`, sorted by path.
///
/// A missing tool directory, or one without logs, is reported and yields an
/// empty list.
pub fn find_log_files(log_dir: &Path, tool: Tool) -> Result<Vec<PathBuf>> {
    let tool_dir = log_dir.join(tool.as_str());
    if !tool_dir.is_dir() {
        warn!("Directory not found: {}", tool_dir.display());
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/{}*.log",
        glob::Pattern::escape(&tool_dir.to_string_lossy()),
        tool.file_prefix()
    );
    let entries = glob::glob(&pattern).map_err(|source| Error::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!("Skipping {}: {}", err.path().display(), err.error()),
        }
    }
    files.sort();

    if files.is_empty() {
        warn!("No {} logs in {}", tool, tool_dir.display());
    }

    Ok(files)
}

/// True when any `path:line` location of the issue names one of `files`
/// (compared by base name).
pub fn touches_any_file(issue: &Issue, files: &[String]) -> bool {
    issue.file_locations().iter().any(|loc| {
        let path = loc.rsplit_once(':').map_or(loc.as_str(), |(path, _)| path);
        let base = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        files.iter().any(|f| f.as_str() == base)
    })
}
