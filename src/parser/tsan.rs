//! ThreadSanitizer reports. Each `WARNING: ThreadSanitizer:` line opens a
//! report that ends at the first blank line.

use super::{Block, Describe, Rule, ToolParser, UNKNOWN_DESCRIPTION, split_at_headers};
use crate::issue::{Category, Tool};
use lazy_static::lazy_static;
use memchr::memmem;
use regex::Regex;

pub const WARNING_MARKER: &str = "WARNING: ThreadSanitizer:";

lazy_static! {
    static ref FREE_TEXT_CATEGORY: Regex =
        Regex::new(r"WARNING: ThreadSanitizer:\s*([^:]+)").unwrap();
}

static RULES: &[Rule] = &[
    Rule {
        category: Category::DataRace,
        applies: |b| b.lower.contains("data race"),
        describe: Describe::FirstLine,
    },
    Rule {
        category: Category::LockOrderViolation,
        applies: |b| b.lower.contains("lock order inversion") || b.lower.contains("deadlock"),
        describe: Describe::FirstLine,
    },
    Rule {
        category: Category::ThreadLeak,
        applies: |b| b.lower.contains("thread leak"),
        describe: Describe::FirstLine,
    },
    Rule {
        category: Category::UseAfterFree,
        applies: |b| b.lower.contains("use-after-free"),
        describe: Describe::FirstLine,
    },
];

/// Cut a report at its first blank-line gap, `\n\n` or `\r\n\r\n`.
fn truncate_report(block: &str) -> &str {
    let bytes = block.as_bytes();
    let gap = [memmem::find(bytes, b"\n\n"), memmem::find(bytes, b"\n\r\n")]
        .into_iter()
        .flatten()
        .min();
    match gap {
        Some(end) if end > 0 => &block[..end],
        _ => block,
    }
}

pub struct TsanParser;

impl ToolParser for TsanParser {
    fn tool(&self) -> Tool {
        Tool::Tsan
    }

    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let positions = memmem::find_iter(text.as_bytes(), WARNING_MARKER.as_bytes());
        split_at_headers(text, positions)
            .into_iter()
            .map(truncate_report)
            .collect()
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }

    /// Use the analyzer's own label, the text between the marker and the
    /// next colon.
    fn fallback(&self, block: &Block<'_>) -> (Category, String) {
        let Some(first) = block.lines.first().map(|l| l.trim()) else {
            return (Category::Unknown, UNKNOWN_DESCRIPTION.to_string());
        };

        let category = FREE_TEXT_CATEGORY
            .captures(first)
            .map(|caps| caps[1].trim().to_string())
            .filter(|label| !label.is_empty())
            .map_or(Category::Unknown, Category::Other);

        (category, first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::BlockFilter;

    #[test]
    fn test_block_truncated_at_blank_line() {
        let log = "\
==================
WARNING: ThreadSanitizer: data race (pid=42)
  Write of size 4 at 0x7b04 by thread T1:
    #0 Sensor::update() sensor.cpp:31 (app+0x11)
    #1 worker(void*) main.cpp:12 (app+0x12)

  Previous read of size 4 at 0x7b04 by main thread:
    #0 Sensor::value() sensor.cpp:20 (app+0x13)
";
        let blocks = TsanParser.segment(log);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].contains("Previous read"));

        let issues = TsanParser.parse(log, "1", &BlockFilter::none());
        assert_eq!(issues[0].category(), &Category::DataRace);
        assert_eq!(issues[0].description(), "WARNING: ThreadSanitizer: data race (pid=42)");
        assert_eq!(issues[0].stack_frames().len(), 2);
    }

    #[test]
    fn test_rules_are_case_insensitive() {
        let log = "WARNING: ThreadSanitizer: lock-order-inversion (potential Deadlock) (pid=1)\n";
        let issues = TsanParser.parse(log, "1", &BlockFilter::none());
        assert_eq!(issues[0].category(), &Category::LockOrderViolation);

        let log = "WARNING: ThreadSanitizer: Thread Leak (pid=1)\n";
        let issues = TsanParser.parse(log, "1", &BlockFilter::none());
        assert_eq!(issues[0].category(), &Category::ThreadLeak);

        let log = "WARNING: ThreadSanitizer: heap-use-after-free (pid=1)\n";
        let issues = TsanParser.parse(log, "1", &BlockFilter::none());
        assert_eq!(issues[0].category(), &Category::UseAfterFree);
    }

    #[test]
    fn test_free_text_category() {
        let log = "WARNING: ThreadSanitizer: signal-unsafe call inside of a signal (pid=3)\n";
        let issues = TsanParser.parse(log, "1", &BlockFilter::none());
        assert_eq!(
            issues[0].category(),
            &Category::Other("signal-unsafe call inside of a signal (pid=3)".into())
        );
    }
}
