//! Markdown changelog built from the commits since a tag

use crate::domain::{CommitClassification, CommitParser};
use crate::error::Result;
use crate::git::CommitInfo;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const HEADER: &str = "# Changelog";

/// Types listed under "Changed"
const CHANGED_TYPES: &[&str] = &[
    "refactor", "ci", "build", "docs", "test", "style", "perf", "chore",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Breaking,
    Added,
    Fixed,
    Changed,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Breaking => "Breaking Changes",
            Section::Added => "Added",
            Section::Fixed => "Fixed",
            Section::Changed => "Changed",
        }
    }

    /// Section a classified commit belongs to, if any
    pub fn of(classification: &CommitClassification) -> Option<Section> {
        if classification.is_breaking() {
            return Some(Section::Breaking);
        }
        let commit_type = classification.commit_type()?.to_ascii_lowercase();
        match commit_type.as_str() {
            "feat" => Some(Section::Added),
            "fix" => Some(Section::Fixed),
            t if CHANGED_TYPES.contains(&t) => Some(Section::Changed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub scope: Option<String>,
    pub description: String,
    pub hash: String,
}

/// Release notes grouped by section
#[derive(Debug, Clone, Default)]
pub struct Changelog {
    sections: BTreeMap<Section, Vec<Entry>>,
}

impl Changelog {
    /// Classify commits into sections; commits outside every section are dropped
    pub fn build(commits: &[CommitInfo], parser: &CommitParser) -> Self {
        let mut changelog = Changelog::default();
        for commit in commits {
            let classification = match parser.parse(&commit.message) {
                Ok(c) => c,
                Err(e) => {
                    debug!(commit = commit.short_hash(), error = %e, "skipping commit");
                    continue;
                }
            };
            let Some(section) = Section::of(&classification) else {
                continue;
            };
            changelog.sections.entry(section).or_default().push(Entry {
                scope: classification.title.scope.clone(),
                description: classification.title.description.clone(),
                hash: commit.short_hash().to_string(),
            });
        }
        changelog
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn entries(&self, section: Section) -> &[Entry] {
        self.sections
            .get(&section)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Render one release block
    pub fn render(&self, version: &str, date: NaiveDate) -> String {
        let mut out = format!("## {} ({})\n", version, date.format("%Y-%m-%d"));
        if self.is_empty() {
            out.push_str("\nNo notable changes.\n");
            return out;
        }

        for (section, entries) in &self.sections {
            out.push_str(&format!("\n### {}\n\n", section.title()));

            let mut scoped: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
            for entry in entries {
                match &entry.scope {
                    Some(scope) => scoped.entry(scope.as_str()).or_default().push(entry),
                    None => out.push_str(&bullet(entry)),
                }
            }
            for (scope, entries) in scoped {
                out.push_str(&format!("\n#### {}\n\n", scope));
                for entry in entries {
                    out.push_str(&bullet(entry));
                }
            }
        }
        out
    }
}

fn bullet(entry: &Entry) -> String {
    format!("- {} ({})\n", entry.description, entry.hash)
}

/// Insert a release block below the changelog header, creating the file if needed
pub fn write(path: &Path, block: &str) -> Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let body = existing
        .strip_prefix(HEADER)
        .unwrap_or(&existing)
        .trim_start_matches('\n');

    let mut content = format!("{}\n\n{}", HEADER, block);
    if !body.is_empty() {
        content.push('\n');
        content.push_str(body);
    }
    fs::write(path, content)?;
    info!(path = %path.display(), "wrote changelog");
    Ok(())
}
