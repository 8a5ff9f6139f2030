//! Helgrind reports. Every error is introduced by a thread announcement
//! banner, so the banner is used as the block boundary and stays at the top
//! of the block it introduces.

use super::{Describe, Rule, ToolParser, split_at_headers};
use crate::issue::{Category, Tool};
use memchr::memmem;

pub const ANNOUNCEMENT_MARKER: &str = "---Thread-Announcement--";

/// Lines of the block searched for a thread-access description
const ACCESS_DESCRIPTION_LINES: usize = 10;

fn mentions_access(text: &str) -> bool {
    text.contains("Thread #") && (text.contains("read") || text.contains("write"))
}

static RULES: &[Rule] = &[
    Rule {
        category: Category::DataRace,
        applies: |b| b.text.contains("Possible data race"),
        describe: Describe::FirstContaining {
            needle: |l| l.contains("Possible data race"),
            within: None,
        },
    },
    Rule {
        category: Category::LockOrderViolation,
        applies: |b| b.text.contains("Lock order"),
        describe: Describe::FirstContaining {
            needle: |l| l.contains("Lock order"),
            within: None,
        },
    },
    Rule {
        category: Category::DataAccessViolation,
        applies: |b| mentions_access(b.text),
        describe: Describe::FirstContaining {
            needle: mentions_access,
            within: Some(ACCESS_DESCRIPTION_LINES),
        },
    },
];

pub struct HelgrindParser;

impl ToolParser for HelgrindParser {
    fn tool(&self) -> Tool {
        Tool::Helgrind
    }

    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let positions = memmem::find_iter(text.as_bytes(), ANNOUNCEMENT_MARKER.as_bytes());
        split_at_headers(text, positions)
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}
