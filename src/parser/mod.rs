use crate::error::{Error, Result};
use crate::filter::BlockFilter;
use crate::issue::{Category, Issue, Tool};
use crate::patterns::{extract_file_locations, extract_stack_trace};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Description used when no line of a block explains it
pub const UNKNOWN_DESCRIPTION: &str = "Unknown issue";

/// Interface shared by the per-analyzer log parsers
pub trait ToolParser: Send + Sync {
    /// The analyzer whose format this parser understands
    fn tool(&self) -> Tool;

    /// Slice the log text into one string per reported event.
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Ordered classification rules; the first rule that applies wins.
    fn rules(&self) -> &'static [Rule];

    /// Category and description for a block no rule matched.
    fn fallback(&self, _block: &Block<'_>) -> (Category, String) {
        (Category::Unknown, UNKNOWN_DESCRIPTION.to_string())
    }

    fn classify(&self, block: &Block<'_>) -> (Category, String) {
        classify_with(self.rules(), block).unwrap_or_else(|| self.fallback(block))
    }

    /// Turn a whole log into issues, one per accepted block.
    fn parse(&self, text: &str, run_id: &str, filter: &BlockFilter) -> Vec<Issue> {
        let tool = self.tool();
        let mut issues = Vec::new();

        for piece in self.segment(text) {
            let block = Block::new(piece);
            if filter.rejects(&block.lines) {
                continue;
            }

            let (category, description) = self.classify(&block);
            let stack_frames = extract_stack_trace(&block.lines, tool);
            let file_locations = extract_file_locations(&block.lines);

            issues.push(Issue::new(
                tool,
                category,
                description,
                stack_frames,
                file_locations,
                run_id.to_string(),
                block.lines.iter().map(|l| l.to_string()).collect(),
            ));
        }

        issues
    }

    /// Read and parse one log file. An unreadable file is reported and
    /// contributes nothing.
    fn parse_file(&self, path: &Path, filter: &BlockFilter) -> Vec<Issue> {
        let text = match read_log(path) {
            Ok(text) => text,
            Err(err) => {
                warn!("{}", err);
                return Vec::new();
            }
        };
        let run_id = run_id_from_path(path, self.tool());
        self.parse(&text, &run_id, filter)
    }
}

/// Pick the parser for a tool
pub fn parser_for(tool: Tool) -> &'static dyn ToolParser {
    match tool {
        Tool::Helgrind => &helgrind::HelgrindParser,
        Tool::Drd => &drd::DrdParser,
        Tool::Tsan => &tsan::TsanParser,
    }
}

/// A raw block with its lines and a lowercased copy for case-insensitive rules
pub struct Block<'a> {
    pub text: &'a str,
    pub lower: String,
    pub lines: Vec<&'a str>,
}

impl<'a> Block<'a> {
    pub fn new(raw: &'a str) -> Self {
        let text = raw.trim();
        Block {
            text,
            lower: text.to_lowercase(),
            lines: text.lines().collect(),
        }
    }
}

/// How a rule picks the description line once it applies
#[derive(Debug, Clone, Copy)]
pub enum Describe {
    /// First line of the block
    FirstLine,
    /// First line containing the needle, optionally within the first N lines
    FirstContaining {
        needle: fn(&str) -> bool,
        within: Option<usize>,
    },
}

/// One step of a priority-ordered classification chain
pub struct Rule {
    pub category: Category,
    pub applies: fn(&Block<'_>) -> bool,
    pub describe: Describe,
}

/// Run the rules in order and return the first hit.
pub fn classify_with(rules: &[Rule], block: &Block<'_>) -> Option<(Category, String)> {
    let rule = rules.iter().find(|rule| (rule.applies)(block))?;

    let description = match rule.describe {
        Describe::FirstLine => block.lines.first().map(|l| l.trim().to_string()),
        Describe::FirstContaining { needle, within } => block
            .lines
            .iter()
            .take(within.unwrap_or(usize::MAX))
            .find(|line| needle(line))
            .map(|l| l.trim().to_string()),
    };

    Some((
        rule.category.clone(),
        description.unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string()),
    ))
}

/// Slice `text` into blocks that begin at each header position.
///
/// Every position is moved back to the start of its line so that line
/// prefixes (`==pid==`, indentation) stay with the block they introduce.
/// Text before the first header is dropped.
pub fn split_at_headers<I>(text: &str, header_positions: I) -> Vec<&str>
where
    I: IntoIterator<Item = usize>,
{
    let mut starts: Vec<usize> = Vec::new();
    for pos in header_positions {
        let line_start = text[..pos].rfind('\n').map_or(0, |nl| nl + 1);
        if starts.last().is_none_or(|&last| line_start > last) {
            starts.push(line_start);
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

/// Read a whole log, replacing invalid UTF-8.
pub fn read_log(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `helgrind_run3.log` -> `run3`
pub fn run_id_from_path(path: &Path, tool: Tool) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_prefix(tool.file_prefix()).unwrap_or(&name);
    let name = name.strip_suffix(".log").unwrap_or(name);
    name.to_string()
}

pub mod drd;
pub mod helgrind;
pub mod tsan;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_split_at_headers_snaps_to_line_start() {
        let text = "header\n==1== MARK one\nbody\n==1== MARK two\n";
        let positions = text.match_indices("MARK").map(|(i, _)| i);
        let blocks = split_at_headers(text, positions);
        assert_eq!(blocks, vec!["==1== MARK one\nbody\n", "==1== MARK two\n"]);
    }

    #[test]
    fn test_split_at_headers_merges_headers_on_one_line() {
        let text = "MARK MARK\nrest";
        let positions = text.match_indices("MARK").map(|(i, _)| i);
        assert_eq!(split_at_headers(text, positions), vec!["MARK MARK\nrest"]);
    }

    #[test]
    fn test_run_id_from_path() {
        let path = PathBuf::from("logs/tsan/tsan_nightly_7.log");
        assert_eq!(run_id_from_path(&path, Tool::Tsan), "nightly_7");
        let path = PathBuf::from("drd_3.txt");
        assert_eq!(run_id_from_path(&path, Tool::Drd), "3.txt");
    }
}
