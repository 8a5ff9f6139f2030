use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Number of leading stack frames that take part in the dedup signature.
pub const SIGNATURE_FRAMES: usize = 3;

/// The thread-safety analyzers whose logs can be normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Valgrind's Helgrind
    Helgrind,
    /// Valgrind's DRD
    Drd,
    /// Compiler-instrumented ThreadSanitizer
    Tsan,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Helgrind, Tool::Drd, Tool::Tsan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Helgrind => "helgrind",
            Tool::Drd => "drd",
            Tool::Tsan => "tsan",
        }
    }

    /// Literal prefix of this tool's log file names (`helgrind_1.log`)
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Tool::Helgrind => "helgrind_",
            Tool::Drd => "drd_",
            Tool::Tsan => "tsan_",
        }
    }

    pub fn display_name(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTool(pub String);

impl fmt::Display for UnknownTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tool '{}'", self.0)
    }
}

impl std::error::Error for UnknownTool {}

impl FromStr for Tool {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "helgrind" => Ok(Tool::Helgrind),
            "drd" => Ok(Tool::Drd),
            "tsan" => Ok(Tool::Tsan),
            other => Err(UnknownTool(other.to_string())),
        }
    }
}

/// Classified kind of a threading issue
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    DataRace,
    LockOrderViolation,
    DataAccessViolation,
    ThreadLeak,
    UseAfterFree,
    Unknown,
    /// Free-text label taken from the analyzer's own report header
    Other(String),
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Category::DataRace => "Data Race",
            Category::LockOrderViolation => "Lock Order Violation",
            Category::DataAccessViolation => "Data Access Violation",
            Category::ThreadLeak => "Thread Leak",
            Category::UseAfterFree => "Use After Free",
            Category::Unknown => "Unknown",
            Category::Other(label) => label,
        }
    }

    /// Inverse of [`Category::label`]; anything unrecognized becomes `Other`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Data Race" => Category::DataRace,
            "Lock Order Violation" => Category::LockOrderViolation,
            "Data Access Violation" => Category::DataAccessViolation,
            "Thread Leak" => Category::ThreadLeak,
            "Use After Free" => Category::UseAfterFree,
            "Unknown" | "" => Category::Unknown,
            other => Category::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One normalized diagnostic extracted from a single analyzer report block.
///
/// Fields are only readable after construction; the dedup signature is
/// derived once in [`Issue::new`] from the tool, category and leading frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    tool: Tool,
    category: Category,
    description: String,
    stack_frames: Vec<String>,
    file_locations: BTreeSet<String>,
    run_id: String,
    raw_block: Vec<String>,
    signature: String,
}

impl Issue {
    pub fn new(
        tool: Tool,
        category: Category,
        description: String,
        stack_frames: Vec<String>,
        file_locations: BTreeSet<String>,
        run_id: String,
        raw_block: Vec<String>,
    ) -> Self {
        let signature = compute_signature(tool, &category, &stack_frames);
        Issue {
            tool,
            category,
            description,
            stack_frames,
            file_locations,
            run_id,
            raw_block,
            signature,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn stack_frames(&self) -> &[String] {
        &self.stack_frames
    }

    pub fn file_locations(&self) -> &BTreeSet<String> {
        &self.file_locations
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn raw_block(&self) -> &[String] {
        &self.raw_block
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn to_record(&self) -> IssueRecord {
        IssueRecord {
            tool: self.tool,
            issue_type: self.category.label().to_string(),
            description: self.description.clone(),
            stack_trace: self.stack_frames.clone(),
            file_locations: self.file_locations.iter().cloned().collect(),
            run_id: self.run_id.clone(),
        }
    }
}

fn compute_signature(tool: Tool, category: &Category, frames: &[String]) -> String {
    let leading = &frames[..frames.len().min(SIGNATURE_FRAMES)];
    format!("{}:{}:{}", tool, category.label(), leading.join("|"))
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.tool.display_name(), self.category)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "File locations:")?;
        if self.file_locations.is_empty() {
            writeln!(f, "    Unknown")?;
        }
        for loc in &self.file_locations {
            writeln!(f, "    {}", loc)?;
        }
        write!(f, "Stack trace (first {} frames):", SIGNATURE_FRAMES)?;
        for frame in self.stack_frames.iter().take(SIGNATURE_FRAMES) {
            write!(f, "\n    {}", frame)?;
        }
        Ok(())
    }
}

/// Serialized form of an [`Issue`] used by the JSON export.
///
/// The raw block is not part of the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub tool: Tool,
    pub issue_type: String,
    pub description: String,
    pub stack_trace: Vec<String>,
    pub file_locations: Vec<String>,
    pub run_id: String,
}

impl From<IssueRecord> for Issue {
    fn from(record: IssueRecord) -> Self {
        Issue::new(
            record.tool,
            Category::from_label(&record.issue_type),
            record.description,
            record.stack_trace,
            record.file_locations.into_iter().collect(),
            record.run_id,
            Vec::new(),
        )
    }
}
