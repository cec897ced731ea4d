use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed canonical category set. Arbitrary input strings are mapped
/// onto this set at the boundary; `Other` is the reserved fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryCategory {
    CodeSolution,
    BugFix,
    Architecture,
    Learning,
    ToolUsage,
    Debugging,
    Performance,
    Security,
    Other,
}

impl MemoryCategory {
    /// All canonical categories, `Other` last.
    pub const ALL: [MemoryCategory; 9] = [
        MemoryCategory::CodeSolution,
        MemoryCategory::BugFix,
        MemoryCategory::Architecture,
        MemoryCategory::Learning,
        MemoryCategory::ToolUsage,
        MemoryCategory::Debugging,
        MemoryCategory::Performance,
        MemoryCategory::Security,
        MemoryCategory::Other,
    ];

    /// Canonical kebab-case form, as persisted in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::CodeSolution => "code-solution",
            MemoryCategory::BugFix => "bug-fix",
            MemoryCategory::Architecture => "architecture",
            MemoryCategory::Learning => "learning",
            MemoryCategory::ToolUsage => "tool-usage",
            MemoryCategory::Debugging => "debugging",
            MemoryCategory::Performance => "performance",
            MemoryCategory::Security => "security",
            MemoryCategory::Other => "other",
        }
    }

    /// Exact-match parse of the canonical kebab-case form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Human-readable phrase embedded in place of the bare category name.
    /// Embedded once per process and reused for every classification.
    pub fn embedding_label(&self) -> &'static str {
        match self {
            MemoryCategory::CodeSolution => "code solution implementation",
            MemoryCategory::BugFix => "bug fix error correction",
            MemoryCategory::Architecture => "architecture design structure",
            MemoryCategory::Learning => "learning knowledge discovery",
            MemoryCategory::ToolUsage => "tool usage utility",
            MemoryCategory::Debugging => "debugging troubleshooting diagnosis",
            MemoryCategory::Performance => "performance optimization speed",
            MemoryCategory::Security => "security vulnerability protection",
            MemoryCategory::Other => "other miscellaneous general",
        }
    }

    /// Fixed alias table for short tokens (< 5 chars), where embeddings
    /// are unreliable.
    pub fn short_alias(s: &str) -> Option<Self> {
        match s {
            "bug" | "fix" => Some(MemoryCategory::BugFix),
            "auth" | "sec" => Some(MemoryCategory::Security),
            "perf" | "opt" => Some(MemoryCategory::Performance),
            "debug" => Some(MemoryCategory::Debugging),
            "arch" | "design" => Some(MemoryCategory::Architecture),
            "impl" | "sol" => Some(MemoryCategory::CodeSolution),
            "learn" => Some(MemoryCategory::Learning),
            "tool" => Some(MemoryCategory::ToolUsage),
            _ => None,
        }
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_all_variants() {
        for cat in MemoryCategory::ALL {
            assert_eq!(MemoryCategory::parse(cat.as_str()), Some(cat));
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(MemoryCategory::parse("zzz"), None);
        assert_eq!(MemoryCategory::parse("Bug-Fix"), None);
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(
            MemoryCategory::short_alias("perf"),
            Some(MemoryCategory::Performance)
        );
        assert_eq!(
            MemoryCategory::short_alias("auth"),
            Some(MemoryCategory::Security)
        );
        assert_eq!(MemoryCategory::short_alias("nope"), None);
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&MemoryCategory::BugFix).unwrap();
        assert_eq!(json, "\"bug-fix\"");
        let back: MemoryCategory = serde_json::from_str("\"tool-usage\"").unwrap();
        assert_eq!(back, MemoryCategory::ToolUsage);
    }
}
