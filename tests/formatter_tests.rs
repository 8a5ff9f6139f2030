use std::collections::BTreeSet;
use threadsift::analyzer::ToolIssueSet;
use threadsift::config::ReportOptions;
use threadsift::formatter::{load_json, render_json, render_text, render_text_to_string};
use threadsift::{Category, Issue, Tool};

fn issue(tool: Tool, category: Category, description: &str, frames: &[&str], locations: &[&str]) -> Issue {
    Issue::new(
        tool,
        category,
        description.to_string(),
        frames.iter().map(|s| s.to_string()).collect(),
        locations.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        "run1".to_string(),
        vec![description.to_string(), "   raw line".to_string()],
    )
}

fn sample_set() -> ToolIssueSet {
    let mut set = ToolIssueSet::new();
    set.insert(Tool::Helgrind, Vec::new());
    set.insert(
        Tool::Drd,
        vec![
            issue(Tool::Drd, Category::LockOrderViolation, "Mutex lock order violation", &["lock (m.c:3)"], &["m.c:3"]),
            issue(Tool::Drd, Category::DataRace, "Conflicting store", &["push (buffer.h:10)", "run (engine.h:4)", "main (main.cc:1)", "start"], &["buffer.h:10", "engine.h:4"]),
            issue(Tool::Drd, Category::LockOrderViolation, "Second lock order", &["other (o.c:1)"], &["buffer.h:22"]),
        ],
    );
    set
}

#[test]
fn test_summary_counts_by_category_in_first_seen_order() {
    let text = render_text_to_string(&sample_set(), &ReportOptions::default()).unwrap();

    assert!(text.starts_with("Thread Analysis Summary\n"));
    assert!(text.contains("Total unique issues found: 3"));
    assert!(text.contains("HELGRIND: No issues found"));
    assert!(text.contains("DRD: 3 issues found\n  - Lock Order Violation: 2\n  - Data Race: 1\n"));
}

#[test]
fn test_details_sorted_by_category_with_stable_ties() {
    let text = render_text_to_string(&sample_set(), &ReportOptions::default()).unwrap();

    assert!(text.contains("Detailed Issues"));
    assert!(!text.contains("HELGRIND Issues:"));
    let race = text.find("Issue #1: Data Race").unwrap();
    let first_lock = text.find("Description: Mutex lock order violation").unwrap();
    let second_lock = text.find("Description: Second lock order").unwrap();
    assert!(race < first_lock && first_lock < second_lock);

    // Only the first three frames are shown
    assert!(text.contains("  - main (main.cc:1)"));
    assert!(!text.contains("  - start\n"));
    assert!(!text.contains("Raw report"));
}

#[test]
fn test_summary_only_stops_after_counts() {
    let options = ReportOptions {
        summary_only: true,
        ..ReportOptions::default()
    };
    let text = render_text_to_string(&sample_set(), &options).unwrap();
    assert!(text.contains("DRD: 3 issues found"));
    assert!(!text.contains("Detailed Issues"));
}

#[test]
fn test_max_issues_truncates_details_only() {
    let mut set = ToolIssueSet::new();
    let issues = (0..12)
        .map(|i| {
            let frame = format!("worker_{} (w.c:{})", i, i + 1);
            issue(Tool::Drd, Category::DataRace, &format!("race {}", i), &[&frame], &[])
        })
        .collect();
    set.insert(Tool::Drd, issues);

    let text = render_text_to_string(&set, &ReportOptions::default()).unwrap();
    assert!(text.contains("DRD: 12 issues found"));
    assert!(text.contains("  - Data Race: 12"));
    assert!(text.contains("Issue #10: Data Race"));
    assert!(!text.contains("Issue #11"));
    assert!(text.contains("...and 2 more DRD issues"));
}

#[test]
fn test_file_locations_are_sorted_and_capped() {
    let locations = ["z.c:1", "a.c:9", "m.h:3", "b.c:2", "k.cc:4", "c.h:5", "d.h:6"];
    let mut set = ToolIssueSet::new();
    set.insert(Tool::Tsan, vec![issue(Tool::Tsan, Category::DataRace, "race", &[], &locations)]);

    let text = render_text_to_string(&set, &ReportOptions::default()).unwrap();
    assert!(text.contains("File locations:\n  - a.c:9\n  - b.c:2\n  - c.h:5\n  - d.h:6\n  - k.cc:4\n  - ...and 2 more locations\n"));
    assert!(!text.contains("Stack trace"));
}

#[test]
fn test_raw_blocks_and_file_counts() {
    let options = ReportOptions {
        count_by_file: true,
        show_raw: true,
        ..ReportOptions::default()
    };
    let mut out = Vec::new();
    render_text(&sample_set(), &options, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Issues by file"));
    assert!(text.contains("  buffer.h: 2 issues (lines 10, 22)"));
    assert!(text.contains("  m.c: 1 issue (lines 3)"));
    assert!(text.find("  buffer.h:").unwrap() < text.find("  engine.h:").unwrap());
    assert!(text.contains("Raw report (run run1):\n    Conflicting store\n       raw line\n"));
}

#[test]
fn test_json_export_fields() {
    let json = render_json(&sample_set()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["helgrind"].as_array().unwrap().len(), 0);
    let drd = value["drd"].as_array().unwrap();
    assert_eq!(drd.len(), 3);

    let race = &drd[1];
    let mut keys: Vec<&str> = race.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["description", "file_locations", "issue_type", "run_id", "stack_trace", "tool"]);
    assert_eq!(race["tool"], "drd");
    assert_eq!(race["issue_type"], "Data Race");
    assert_eq!(race["stack_trace"].as_array().unwrap().len(), 4);
    assert_eq!(race["file_locations"].as_array().unwrap().len(), 2);
}

#[test]
fn test_json_export_can_be_reloaded() {
    let original = sample_set();
    let reloaded = load_json(&render_json(&original).unwrap()).unwrap();

    let drd = reloaded.get(Tool::Drd).unwrap();
    assert_eq!(drd.len(), 3);
    for (before, after) in original.get(Tool::Drd).unwrap().iter().zip(drd) {
        assert_eq!(before.signature(), after.signature());
        assert_eq!(before.file_locations(), after.file_locations());
        assert!(after.raw_block().is_empty());
    }
    assert!(reloaded.get(Tool::Helgrind).unwrap().is_empty());
}

#[test]
fn test_load_json_skips_unknown_tools() {
    let json = r#"{"asan": [], "tsan": [{"tool": "tsan", "issue_type": "SUMMARY", "description": "d", "stack_trace": [], "file_locations": ["a.c:1"], "run_id": "1"}]}"#;
    let set = load_json(json).unwrap();
    assert_eq!(set.tools(), vec![Tool::Tsan]);
    assert_eq!(set.get(Tool::Tsan).unwrap()[0].category(), &Category::Other("SUMMARY".to_string()));
}

#[test]
fn test_issue_display() {
    let shown = issue(Tool::Tsan, Category::ThreadLeak, "leak", &["a", "b", "c", "d"], &[]).to_string();
    assert!(shown.starts_with("[TSAN] Thread Leak\nDescription: leak\nFile locations:\n    Unknown\n"));
    assert!(shown.ends_with("    c"));
}
