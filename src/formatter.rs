use crate::analyzer::ToolIssueSet;
use crate::config::ReportOptions;
use crate::error::{Error, Result};
use crate::issue::{Category, Issue, IssueRecord, SIGNATURE_FRAMES, Tool};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File locations listed per issue before the remainder is summarized
const MAX_LOCATIONS: usize = 5;

/// Write the human-readable report.
pub fn render_text<W: Write>(set: &ToolIssueSet, options: &ReportOptions, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Thread Analysis Summary")?;
    writeln!(writer, "=====================")?;
    writeln!(writer, "Total unique issues found: {}", set.total_issues())?;
    writeln!(writer)?;

    for (tool, issues) in set.iter() {
        if issues.is_empty() {
            writeln!(writer, "{}: No issues found", tool.display_name())?;
            continue;
        }

        writeln!(writer, "{}: {} issues found", tool.display_name(), issues.len())?;
        for (category, count) in count_by_category(issues) {
            writeln!(writer, "  - {}: {}", category, count)?;
        }
        writeln!(writer)?;
    }

    if options.count_by_file {
        write_file_counts(set, writer)?;
    }

    if options.summary_only {
        return Ok(());
    }

    writeln!(writer, "Detailed Issues")?;
    writeln!(writer, "==============")?;

    for (tool, issues) in set.iter() {
        if issues.is_empty() {
            continue;
        }
        write_tool_details(tool, issues, options, writer)?;
    }

    Ok(())
}

pub fn render_text_to_string(set: &ToolIssueSet, options: &ReportOptions) -> io::Result<String> {
    let mut buffer = Vec::new();
    render_text(set, options, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Category counts in order of first appearance
fn count_by_category(issues: &[Issue]) -> Vec<(&Category, usize)> {
    let mut counts: Vec<(&Category, usize)> = Vec::new();
    for issue in issues {
        match counts.iter_mut().find(|(c, _)| *c == issue.category()) {
            Some((_, n)) => *n += 1,
            None => counts.push((issue.category(), 1)),
        }
    }
    counts
}

fn write_tool_details<W: Write>(
    tool: Tool,
    issues: &[Issue],
    options: &ReportOptions,
    writer: &mut W,
) -> io::Result<()> {
    let name = tool.display_name();
    writeln!(writer, "\n{} Issues:", name)?;
    writeln!(writer, "{}", "=".repeat(name.len() + 8))?;

    // Stable: issues of one category keep discovery order
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| a.category().label().cmp(b.category().label()));

    for (idx, issue) in sorted.iter().take(options.max_issues).enumerate() {
        let label = issue.category().label();
        writeln!(writer, "\nIssue #{}: {}", idx + 1, label)?;
        writeln!(writer, "{}", "-".repeat(10 + label.len()))?;
        writeln!(writer, "Description: {}", issue.description())?;

        let locations = issue.file_locations();
        if !locations.is_empty() {
            writeln!(writer, "File locations:")?;
            for loc in locations.iter().take(MAX_LOCATIONS) {
                writeln!(writer, "  - {}", loc)?;
            }
            if locations.len() > MAX_LOCATIONS {
                writeln!(writer, "  - ...and {} more locations", locations.len() - MAX_LOCATIONS)?;
            }
        }

        if !issue.stack_frames().is_empty() {
            writeln!(writer, "Stack trace (first {} frames):", SIGNATURE_FRAMES)?;
            for frame in issue.stack_frames().iter().take(SIGNATURE_FRAMES) {
                writeln!(writer, "  - {}", frame)?;
            }
        }

        if options.show_raw && !issue.raw_block().is_empty() {
            writeln!(writer, "Raw report (run {}):", issue.run_id())?;
            for line in issue.raw_block() {
                writeln!(writer, "    {}", line)?;
            }
        }
    }

    if sorted.len() > options.max_issues {
        writeln!(
            writer,
            "\n...and {} more {} issues",
            sorted.len() - options.max_issues,
            name
        )?;
    }

    Ok(())
}

/// Source files referenced by the issues, with issue counts and line numbers
fn write_file_counts<W: Write>(set: &ToolIssueSet, writer: &mut W) -> io::Result<()> {
    let mut per_file: FxHashMap<&str, (usize, BTreeSet<u64>)> = FxHashMap::default();

    for (_, issues) in set.iter() {
        for issue in issues {
            let mut files_seen: BTreeSet<&str> = BTreeSet::new();
            for loc in issue.file_locations() {
                let Some((path, line)) = loc.rsplit_once(':') else {
                    continue;
                };
                let entry = per_file.entry(path).or_default();
                if files_seen.insert(path) {
                    entry.0 += 1;
                }
                if let Ok(n) = line.parse() {
                    entry.1.insert(n);
                }
            }
        }
    }

    let mut entries: Vec<_> = per_file.into_iter().collect();
    entries.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.0.cmp(b.0)));

    writeln!(writer, "Issues by file")?;
    writeln!(writer, "==============")?;
    if entries.is_empty() {
        writeln!(writer, "No file locations found")?;
    }
    for (path, (count, lines)) in entries {
        let lines: Vec<String> = lines.iter().map(|n| n.to_string()).collect();
        writeln!(
            writer,
            "  {}: {} issue{} (lines {})",
            path,
            count,
            if count == 1 { "" } else { "s" },
            lines.join(", ")
        )?;
    }
    writeln!(writer)?;

    Ok(())
}

/// JSON export: tool name -> array of issues, raw blocks excluded.
pub fn render_json(set: &ToolIssueSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

/// Rebuild an issue set from a previous JSON export.
///
/// Keys that are not a known tool are reported and skipped. Issues keep the
/// tool of the key they were listed under.
pub fn load_json(text: &str) -> Result<ToolIssueSet> {
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
    let mut set = ToolIssueSet::new();

    for (key, value) in raw {
        let tool = match key.parse::<Tool>() {
            Ok(tool) => tool,
            Err(err) => {
                warn!("Skipping {} in JSON report", err);
                continue;
            }
        };
        let records: Vec<IssueRecord> = serde_json::from_value(value)?;
        let issues = records
            .into_iter()
            .map(|mut record| {
                record.tool = tool;
                Issue::from(record)
            })
            .collect();
        set.insert(tool, issues);
    }

    Ok(set)
}

/// Send text to a file, or to stdout when no path is given.
pub fn emit(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text).map_err(|source| Error::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", text)
                .and_then(|_| handle.flush())
                .map_err(|source| Error::Write {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
        }
    }
    Ok(())
}

/// Write the JSON export to `path`.
pub fn emit_json(set: &ToolIssueSet, path: &Path) -> Result<()> {
    let json = render_json(set)?;
    std::fs::write(path, json).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("JSON data written to {}", path.display());
    Ok(())
}
