use crate::issue::Tool;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

// Path: no colons, whitespace or parens, ending in a C/C++ source or header
// extension. The line number must follow the extension directly.
macro_rules! src_path {
    () => {
        r"([^:\s()]+\.(?:c|h|cc|hh|cpp|hpp|cxx|hxx|c\+\+|h\+\+|inl|ipp|tcc)):(\d+)"
    };
}

lazy_static! {
    // Checked in this order; every match of every pattern is kept.
    static ref FILE_PATTERNS: Vec<Regex> = vec![
        // at file.c:123
        Regex::new(concat!(r"\bat\s+", src_path!())).unwrap(),
        // in func(file.c:123)
        Regex::new(concat!(r"\bin\s+[^(]+\(", src_path!(), r"\)")).unwrap(),
        // (file.c:123)
        Regex::new(concat!(r"\(", src_path!(), r"\)")).unwrap(),
        // file.c:123 anywhere
        Regex::new(src_path!()).unwrap(),
    ];

    // Valgrind frames, optionally behind the `==pid==` line prefix.
    static ref VALGRIND_FRAME: Regex =
        Regex::new(r"^(?:==\d+==)?\s*(?:at|by)\s+(.*)$").unwrap();

    static ref VALGRIND_PREFIX: Regex = Regex::new(r"^==\d+==").unwrap();

    static ref TSAN_FRAME: Regex = Regex::new(r"^\s*#\d+\s+(.*)$").unwrap();
}

/// Collect every `path:line` reference found anywhere in the block.
///
/// Extraction is best effort: matches without both groups, or with a line
/// number that is not a positive integer, are skipped.
pub fn extract_file_locations<S: AsRef<str>>(lines: &[S]) -> BTreeSet<String> {
    let mut locations = BTreeSet::new();

    for line in lines {
        let line = line.as_ref();
        for pattern in FILE_PATTERNS.iter() {
            for caps in pattern.captures_iter(line) {
                let (Some(path), Some(num)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                match num.as_str().parse::<u64>() {
                    Ok(n) if n > 0 => {
                        locations.insert(format!("{}:{}", path.as_str(), n));
                    }
                    _ => continue,
                }
            }
        }
    }

    locations
}

/// Extract the call stack of a block, innermost frame first.
pub fn extract_stack_trace<S: AsRef<str>>(lines: &[S], tool: Tool) -> Vec<String> {
    match tool {
        Tool::Helgrind | Tool::Drd => valgrind_frames(lines),
        Tool::Tsan => tsan_frames(lines),
    }
}

fn valgrind_frames<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut frames = Vec::new();

    for line in lines {
        let line = line.as_ref().trim_end();
        if let Some(caps) = VALGRIND_FRAME.captures(line) {
            frames.push(caps[1].trim().to_string());
        } else if !frames.is_empty() && is_blank(line) {
            // a blank line ends the trace once it has started
            break;
        }
    }

    frames
}

fn tsan_frames<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| TSAN_FRAME.captures(line.as_ref().trim_end()))
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// A line is blank when nothing but an optional valgrind `==pid==` prefix
/// and whitespace remain.
fn is_blank(line: &str) -> bool {
    VALGRIND_PREFIX.replace(line, "").trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locations_from_mixed_shapes() {
        let lines = ["    by 0x1: worker (foo.c:42)", "  at bar.h:7"];
        let locations = extract_file_locations(&lines);
        let expected: BTreeSet<String> = ["foo.c:42", "bar.h:7"].iter().map(|s| s.to_string()).collect();
        assert_eq!(locations, expected);
    }

    #[test]
    fn test_locations_skip_zero_line_and_non_source() {
        let lines = ["see notes.txt:12 and foo.c:0", "main.cpp:15:3 (app+0x10)"];
        let locations = extract_file_locations(&lines);
        assert_eq!(locations.len(), 1);
        assert!(locations.contains("main.cpp:15"));
    }

    #[test]
    fn test_locations_with_directories() {
        let lines = ["#0 Engine::run() /src/core/socket_engine.cpp:88:5 (app+0x1)"];
        let locations = extract_file_locations(&lines);
        assert!(locations.contains("/src/core/socket_engine.cpp:88"));
        assert_eq!(locations.len(), 1);
    }

    #[test]
    fn test_valgrind_trace_stops_at_blank_after_frames() {
        let lines = [
            "",
            "Lock order violated",
            "   at 0x1: lock_a (a.c:1)",
            "   by 0x2: main (a.c:9)",
            "",
            "   by 0x3: later (a.c:20)",
        ];
        let frames = extract_stack_trace(&lines, Tool::Helgrind);
        assert_eq!(frames, vec!["0x1: lock_a (a.c:1)", "0x2: main (a.c:9)"]);
    }

    #[test]
    fn test_valgrind_trace_with_pid_prefix() {
        let lines = [
            "==12== Conflicting load by thread 2 at 0x5 size 4",
            "==12==    at 0x1: reader (r.c:3)",
            "==12==    by 0x2: start_thread (pthread.c:7)",
            "==12== ",
            "==12==    at 0x9: unrelated (u.c:1)",
        ];
        let frames = extract_stack_trace(&lines, Tool::Drd);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], "0x1: reader (r.c:3)");
    }

    #[test]
    fn test_tsan_trace_collects_all_numbered_frames() {
        let lines = [
            "WARNING: ThreadSanitizer: data race (pid=1)",
            "    #0 writer w.cpp:3 (app+0x1)",
            "",
            "    #1 main m.cpp:9 (app+0x2)",
        ];
        let frames = extract_stack_trace(&lines, Tool::Tsan);
        assert_eq!(frames, vec!["writer w.cpp:3 (app+0x1)", "main m.cpp:9 (app+0x2)"]);
    }
}
