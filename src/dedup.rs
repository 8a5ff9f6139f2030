use crate::issue::Issue;
use rustc_hash::FxHashSet;

/// Keep the first issue for every signature, preserving input order.
///
/// Run this over a tool's complete issue list: duplicates usually come from
/// different runs, so deduplicating file by file would miss them.
pub fn dedupe(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen: FxHashSet<String> =
        FxHashSet::with_capacity_and_hasher(issues.len(), Default::default());

    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.signature().to_string()))
        .collect()
}
