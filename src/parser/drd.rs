//! DRD reports. A block starts at each conflicting-access or lock-order
//! header and runs until the next one.

use super::{Describe, Rule, ToolParser, split_at_headers};
use crate::issue::{Category, Tool};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADER: Regex =
        Regex::new(r"Conflicting (?:load|store)|[A-Z][a-z]+ lock order violation").unwrap();
}

fn is_conflict(text: &str) -> bool {
    text.contains("Conflicting load") || text.contains("Conflicting store")
}

static RULES: &[Rule] = &[
    Rule {
        category: Category::DataRace,
        applies: |b| is_conflict(b.text),
        describe: Describe::FirstContaining {
            needle: |l| l.contains("Conflicting"),
            within: None,
        },
    },
    Rule {
        category: Category::LockOrderViolation,
        applies: |b| b.text.contains("lock order violation"),
        describe: Describe::FirstContaining {
            needle: |l| l.contains("lock order violation"),
            within: None,
        },
    },
];

pub struct DrdParser;

impl ToolParser for DrdParser {
    fn tool(&self) -> Tool {
        Tool::Drd
    }

    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        split_at_headers(text, HEADER.find_iter(text).map(|m| m.start()))
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}
