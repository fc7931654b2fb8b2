//! Conventional commit grammar
//!
//! ```text
//! message  = title [ "\n\n" body ] [ "\n\n" footer ]
//! title    = [ gitmoji ] type [ "(" scope ")" ] [ "!" ] ":" ws description
//!          | text
//! footer   = 1*( breaking | trailer | issue | note | continuation )
//! breaking = "BREAKING CHANGE" | "BREAKING-CHANGE" ":" text
//! trailer  = token ":" ws name ws "<" email ">"
//! issue    = token [ ":" ] ws "#" digits
//! note     = token ":" ws text
//! ```

use crate::config::ParserConfig;
use crate::error::{Result, VersioningError};
use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::debug;

/// Types that drive an in-phase bump when no override is configured
pub const DEFAULT_RELEASE_TYPES: &[&str] = &[
    "build", "ci", "docs", "perf", "refactor", "style", "test", "chore",
];

/// Types every parser accepts in strict mode
const BUILTIN_TYPES: &[&str] = &["feat", "fix", "release"];

const TYPED_TITLE: &str = r"^(?P<type>[A-Za-z][A-Za-z0-9_-]*)(?:\((?P<scope>[^()\r\n]+)\))?(?P<breaking>!)?:[ \t]+(?P<description>\S.*)$";
const GITMOJI_CODE: &str = r"^:(?P<code>[A-Za-z0-9_+-]+):(?P<rest>.*)$";
const BREAKING_FOOTER: &str = r"^BREAKING[ -]CHANGE:[ \t]*(?P<text>.*)$";
const TRAILER_FOOTER: &str = r"^(?P<token>[A-Za-z][A-Za-z0-9-]*):[ \t]+(?P<name>[^<>\r\n]+?)[ \t]+<(?P<email>[^<>\s]+)>$";
const ISSUE_FOOTER: &str = r"^(?P<tag>[A-Za-z][A-Za-z0-9-]*):?[ \t]+#(?P<id>[0-9]+)$";
const NOTE_FOOTER: &str = r"^(?P<token>[A-Za-z][A-Za-z0-9-]*):[ \t]+(?P<value>\S.*)$";

/// Title line of a commit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Title {
    /// Leading `:code:` or emoji marker, when followed by a typed title or text
    pub gitmoji: Option<String>,
    pub r#type: Option<String>,
    pub scope: Option<String>,
    pub breaking: bool,
    pub description: String,
}

/// `Token: Name <email>` footer line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub token: String,
    pub name: String,
    pub email: String,
}

/// `Tag #id` footer line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub tag: String,
    pub id: String,
}

/// Any other `Token: value` footer line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterNote {
    pub token: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Footer {
    pub trailers: Vec<Trailer>,
    pub issues: Vec<IssueRef>,
    pub notes: Vec<FooterNote>,
    pub breaking_change: Option<String>,
}

impl Footer {
    /// First trailer of the footer
    pub fn trailer(&self) -> Option<&Trailer> {
        self.trailers.first()
    }

    pub fn is_empty(&self) -> bool {
        self.trailers.is_empty()
            && self.issues.is_empty()
            && self.notes.is_empty()
            && self.breaking_change.is_none()
    }
}

/// Structured form of one commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitClassification {
    pub title: Title,
    /// Non-blank body lines in order
    pub body: Vec<String>,
    pub footer: Footer,
}

impl CommitClassification {
    /// Breaking marker in the title or a breaking-change footer note
    pub fn is_breaking(&self) -> bool {
        self.title.breaking || self.footer.breaking_change.is_some()
    }

    pub fn commit_type(&self) -> Option<&str> {
        self.title.r#type.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.title.scope.as_deref()
    }
}

/// Which footer production was last seen, for continuation lines
enum LastEntry {
    None,
    Breaking,
    Note,
    Other,
}

/// Parser for conventional commit messages
#[derive(Debug, Clone)]
pub struct CommitParser {
    types: Vec<String>,
    scopes: Vec<String>,
    strict: bool,
}

impl Default for CommitParser {
    fn default() -> Self {
        CommitParser::new(
            DEFAULT_RELEASE_TYPES.iter().map(|t| t.to_string()).collect(),
            Vec::new(),
        )
    }
}

impl CommitParser {
    /// Lenient parser over the given type and scope vocabularies
    pub fn new(types: Vec<String>, scopes: Vec<String>) -> Self {
        CommitParser {
            types,
            scopes,
            strict: false,
        }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        CommitParser {
            types: config.types.clone(),
            scopes: config.scopes.clone(),
            strict: config.strict,
        }
    }

    /// Enable or disable strict validation
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a commit message
    ///
    /// Lines starting with `#` are dropped. A title that does not match the
    /// typed production falls back to `type = None` unless the parser is
    /// strict.
    pub fn parse(&self, message: &str) -> Result<CommitClassification> {
        let lines: Vec<&str> = message
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(|line| line.trim_end())
            .collect();

        let paragraphs = split_paragraphs(&lines);
        let Some((first, rest)) = paragraphs.split_first() else {
            return Err(VersioningError::grammar("commit message is empty"));
        };

        let title_line = first[0].trim();
        let title = self.parse_title(title_line)?;
        self.validate(&title)?;

        let mut body: Vec<String> = first[1..].iter().map(|l| l.to_string()).collect();
        let mut footer = Footer::default();

        let footer_regexes = FooterRegexes::new()?;
        let footer_start = footer_regexes.footer_start(rest);
        for paragraph in &rest[..footer_start] {
            body.extend(paragraph.iter().map(|l| l.to_string()));
        }
        for paragraph in &rest[footer_start..] {
            footer_regexes.parse_into(&mut footer, paragraph);
        }

        debug!(
            commit_type = ?title.r#type,
            scope = ?title.scope,
            breaking = title.breaking || footer.breaking_change.is_some(),
            "parsed commit message"
        );

        Ok(CommitClassification {
            title,
            body,
            footer,
        })
    }

    fn parse_title(&self, line: &str) -> Result<Title> {
        let typed = compiled(&TYPED_TITLE_RE, TYPED_TITLE)?;
        let code = compiled(&GITMOJI_CODE_RE, GITMOJI_CODE)?;

        let (gitmoji, remainder) = match code.captures(line) {
            // `:sparkles:: text` uses the code itself as the type
            Some(caps) if starts_typed_suffix(&caps["rest"]) => {
                (None, format!("{}{}", &caps["code"], &caps["rest"]))
            }
            Some(caps) => (
                Some(caps["code"].to_string()),
                caps["rest"].trim_start().to_string(),
            ),
            None => match split_emoji(line) {
                Some((emoji, rest)) => (Some(emoji.to_string()), rest.to_string()),
                None => (None, line.to_string()),
            },
        };

        if let Some(caps) = typed.captures(&remainder) {
            return Ok(Title {
                gitmoji,
                r#type: Some(caps["type"].to_string()),
                scope: caps.name("scope").map(|m| m.as_str().trim().to_string()),
                breaking: caps.name("breaking").is_some(),
                description: caps["description"].trim().to_string(),
            });
        }

        if self.strict {
            return Err(VersioningError::grammar(format!(
                "title '{}' does not match 'type(scope)!: description'",
                line
            )));
        }

        Ok(Title {
            gitmoji,
            r#type: None,
            scope: None,
            breaking: false,
            description: if remainder.is_empty() {
                line.to_string()
            } else {
                remainder
            },
        })
    }

    fn validate(&self, title: &Title) -> Result<()> {
        if !self.strict {
            return Ok(());
        }
        if let Some(t) = &title.r#type {
            let known = BUILTIN_TYPES
                .iter()
                .any(|b| b.eq_ignore_ascii_case(t))
                || self.types.iter().any(|k| k.eq_ignore_ascii_case(t));
            if !known {
                return Err(VersioningError::UnrecognizedType(t.clone()));
            }
        }
        if let Some(scope) = &title.scope {
            if !self.scopes.is_empty() && !self.scopes.iter().any(|s| s == scope) {
                return Err(VersioningError::UnrecognizedScope(scope.clone()));
            }
        }
        Ok(())
    }
}

fn starts_typed_suffix(rest: &str) -> bool {
    rest.starts_with(':') || rest.starts_with('(') || rest.starts_with("!:")
}

/// Split a leading non-ASCII symbol token (a unicode gitmoji) from the title
fn split_emoji(line: &str) -> Option<(&str, &str)> {
    let (head, tail) = line.split_once(char::is_whitespace)?;
    let is_symbol = !head.is_empty() && head.chars().all(|c| !c.is_ascii() && !c.is_alphanumeric());
    is_symbol.then(|| (head, tail.trim_start()))
}

fn split_paragraphs<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(*line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

static TYPED_TITLE_RE: OnceCell<Regex> = OnceCell::new();
static GITMOJI_CODE_RE: OnceCell<Regex> = OnceCell::new();
static BREAKING_FOOTER_RE: OnceCell<Regex> = OnceCell::new();
static TRAILER_FOOTER_RE: OnceCell<Regex> = OnceCell::new();
static ISSUE_FOOTER_RE: OnceCell<Regex> = OnceCell::new();
static NOTE_FOOTER_RE: OnceCell<Regex> = OnceCell::new();

fn compiled(cell: &'static OnceCell<Regex>, pattern: &str) -> Result<&'static Regex> {
    Ok(cell.get_or_try_init(|| Regex::new(pattern))?)
}

struct FooterRegexes {
    breaking: &'static Regex,
    trailer: &'static Regex,
    issue: &'static Regex,
    note: &'static Regex,
}

impl FooterRegexes {
    fn new() -> Result<Self> {
        Ok(FooterRegexes {
            breaking: compiled(&BREAKING_FOOTER_RE, BREAKING_FOOTER)?,
            trailer: compiled(&TRAILER_FOOTER_RE, TRAILER_FOOTER)?,
            issue: compiled(&ISSUE_FOOTER_RE, ISSUE_FOOTER)?,
            note: compiled(&NOTE_FOOTER_RE, NOTE_FOOTER)?,
        })
    }

    fn is_production(&self, line: &str) -> bool {
        self.breaking.is_match(line)
            || self.trailer.is_match(line)
            || self.issue.is_match(line)
            || self.note.is_match(line)
    }

    /// Index of the first paragraph in the trailing run of footer paragraphs
    fn footer_start(&self, paragraphs: &[Vec<&str>]) -> usize {
        let mut start = paragraphs.len();
        while start > 0 && self.is_footer(&paragraphs[start - 1]) {
            start -= 1;
        }
        start
    }

    /// A footer paragraph holds only productions and their continuations,
    /// and at least one line that cannot be prose: a breaking change, a
    /// trailer, an issue reference, or a note with a hyphenated token.
    fn is_footer(&self, paragraph: &[&str]) -> bool {
        match paragraph.first() {
            Some(first) if self.is_production(first) => {}
            _ => return false,
        }

        let mut anchored = false;
        let mut in_breaking = false;
        for line in paragraph {
            if self.breaking.is_match(line) {
                anchored = true;
                in_breaking = true;
            } else if self.trailer.is_match(line) || self.issue.is_match(line) {
                anchored = true;
                in_breaking = false;
            } else if let Some(caps) = self.note.captures(line) {
                anchored |= caps["token"].contains('-');
                in_breaking = false;
            } else if !in_breaking && !line.starts_with([' ', '\t']) {
                return false;
            }
        }
        anchored
    }

    fn parse_into(&self, footer: &mut Footer, lines: &[&str]) {
        let mut last = LastEntry::None;

        for line in lines {
            if let Some(caps) = self.breaking.captures(line) {
                footer.breaking_change = Some(caps["text"].trim().to_string());
                last = LastEntry::Breaking;
            } else if let Some(caps) = self.trailer.captures(line) {
                footer.trailers.push(Trailer {
                    token: caps["token"].to_string(),
                    name: caps["name"].trim().to_string(),
                    email: caps["email"].to_string(),
                });
                last = LastEntry::Other;
            } else if let Some(caps) = self.issue.captures(line) {
                footer.issues.push(IssueRef {
                    tag: caps["tag"].to_string(),
                    id: caps["id"].to_string(),
                });
                last = LastEntry::Other;
            } else if let Some(caps) = self.note.captures(line) {
                footer.notes.push(FooterNote {
                    token: caps["token"].to_string(),
                    value: caps["value"].trim().to_string(),
                });
                last = LastEntry::Note;
            } else {
                let text = line.trim();
                match last {
                    LastEntry::Breaking => {
                        if let Some(note) = footer.breaking_change.as_mut() {
                            if !note.is_empty() {
                                note.push('\n');
                            }
                            note.push_str(text);
                        }
                    }
                    LastEntry::Note => {
                        if let Some(note) = footer.notes.last_mut() {
                            note.value.push('\n');
                            note.value.push_str(text);
                        }
                    }
                    LastEntry::None | LastEntry::Other => {
                        debug!(line = text, "ignoring stray footer line");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_MESSAGE: &str = "fix(example): test a message

I believe that life is basically a process of growth - that we go through many
lives, choosing situations and problems that we will learn through.

Reviewed-by: Jim H. Henson Jr. <jim.henson1@email.com>
Refs #123
Fix #124
BREAKING CHANGE: This could change things
";

    fn parse(message: &str) -> CommitClassification {
        CommitParser::default().parse(message).unwrap()
    }

    #[test]
    fn test_title_description_only() {
        let c = parse("test");
        assert_eq!(c.title.r#type, None);
        assert_eq!(c.title.description, "test");
    }

    #[test]
    fn test_title_with_type() {
        let c = parse("fix: test");
        assert_eq!(c.commit_type(), Some("fix"));
        assert_eq!(c.title.description, "test");
        assert!(!c.is_breaking());
    }

    #[test]
    fn test_title_with_scope() {
        let c = parse("feat(ui): test");
        assert_eq!(c.commit_type(), Some("feat"));
        assert_eq!(c.scope(), Some("ui"));
    }

    #[test]
    fn test_title_breaking_marker() {
        let c = parse("refactor!: test");
        assert_eq!(c.commit_type(), Some("refactor"));
        assert!(c.title.breaking);
        assert!(c.is_breaking());

        let c = parse("feat(api)!: drop v1 endpoints");
        assert_eq!(c.scope(), Some("api"));
        assert!(c.title.breaking);
    }

    #[test]
    fn test_title_gitmoji_code_as_type() {
        let c = parse(":sparkles:: this is a feature");
        assert_eq!(c.commit_type(), Some("sparkles"));
        assert_eq!(c.title.gitmoji, None);
        assert_eq!(c.scope(), None);
        assert_eq!(c.title.description, "this is a feature");
    }

    #[test]
    fn test_title_gitmoji_prefix() {
        let c = parse(":bug: fix(core): stop the crash");
        assert_eq!(c.title.gitmoji.as_deref(), Some("bug"));
        assert_eq!(c.commit_type(), Some("fix"));
        assert_eq!(c.scope(), Some("core"));

        let c = parse("\u{2728} feat: unicode marker");
        assert_eq!(c.title.gitmoji.as_deref(), Some("\u{2728}"));
        assert_eq!(c.commit_type(), Some("feat"));
    }

    #[test]
    fn test_title_merge_message_falls_back() {
        let c = parse("Merge branch 'master' of https://example.com");
        assert_eq!(c.title.r#type, None);
        assert_eq!(c.title.scope, None);
        assert_eq!(
            c.title.description,
            "Merge branch 'master' of https://example.com"
        );
    }

    #[test]
    fn test_footer_trailer() {
        let c = parse(FULL_MESSAGE);
        let trailer = c.footer.trailer().unwrap();
        assert_eq!(trailer.token, "Reviewed-by");
        assert_eq!(trailer.name, "Jim H. Henson Jr.");
        assert_eq!(trailer.email, "jim.henson1@email.com");
    }

    #[test]
    fn test_footer_issues() {
        let c = parse(FULL_MESSAGE);
        assert_eq!(
            c.footer.issues,
            vec![
                IssueRef {
                    tag: "Refs".to_string(),
                    id: "123".to_string()
                },
                IssueRef {
                    tag: "Fix".to_string(),
                    id: "124".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_footer_breaking_change() {
        let c = parse(FULL_MESSAGE);
        assert_eq!(
            c.footer.breaking_change.as_deref(),
            Some("This could change things")
        );
        assert!(c.is_breaking());
        assert!(!c.title.breaking);
    }

    #[test]
    fn test_body_lines() {
        let c = parse(FULL_MESSAGE);
        assert_eq!(c.body.len(), 2);
        assert!(c.body[0].starts_with("I believe"));
    }

    #[test]
    fn test_footer_notes_and_continuation() {
        let c = parse(
            "feat: rework config\n\nSigned-off-by: A Dev <a@dev.io>\nBREAKING-CHANGE: the `files` key\n  is now a table array\nAcked: yes",
        );
        assert_eq!(
            c.footer.breaking_change.as_deref(),
            Some("the `files` key\nis now a table array")
        );
        assert_eq!(c.footer.trailers.len(), 1);
        assert_eq!(
            c.footer.notes,
            vec![FooterNote {
                token: "Acked".to_string(),
                value: "yes".to_string()
            }]
        );
    }

    #[test]
    fn test_body_only_message_has_empty_footer() {
        let c = parse("docs: readme\n\nJust some prose here.");
        assert!(c.footer.is_empty());
        assert_eq!(c.body, vec!["Just some prose here.".to_string()]);
    }

    #[test]
    fn test_footer_spans_trailing_paragraphs() {
        let c = parse(
            "feat: drop v1 api\n\nThe old handlers are gone.\n\nBREAKING CHANGE: api gone\n\nSigned-off-by: A Dev <a@dev.io>\nRefs #9",
        );
        assert_eq!(c.footer.breaking_change.as_deref(), Some("api gone"));
        assert_eq!(c.footer.trailers.len(), 1);
        assert_eq!(c.footer.trailers[0].token, "Signed-off-by");
        assert_eq!(c.footer.issues.len(), 1);
        assert_eq!(c.body, vec!["The old handlers are gone.".to_string()]);
        assert!(c.is_breaking());
    }

    #[test]
    fn test_prose_paragraph_with_colon_stays_in_body() {
        let c = parse("fix: retry on timeout\n\nNote: this paragraph is prose about the fix");
        assert!(c.footer.is_empty());
        assert_eq!(
            c.body,
            vec!["Note: this paragraph is prose about the fix".to_string()]
        );
    }

    #[test]
    fn test_paragraph_after_footer_ends_the_footer_run() {
        let c = parse("fix: crash\n\nRefs #12\n\nThanks to everyone who reported it.");
        assert!(c.footer.is_empty());
        assert_eq!(c.body.len(), 2);
    }

    #[test]
    fn test_footer_patterns_are_shared() {
        let first = FooterRegexes::new().unwrap();
        parse(FULL_MESSAGE);
        let second = FooterRegexes::new().unwrap();
        assert!(std::ptr::eq(first.breaking, second.breaking));
        assert!(std::ptr::eq(first.note, second.note));
    }

    #[test]
    fn test_comment_lines_ignored() {
        let c = parse("# Please enter the commit message\nfix: real title\n# trailing comment");
        assert_eq!(c.commit_type(), Some("fix"));
    }

    #[test]
    fn test_empty_message_is_grammar_error() {
        let err = CommitParser::default().parse("\n\n# only comments\n").unwrap_err();
        assert!(matches!(err, VersioningError::Grammar(_)));
    }

    #[test]
    fn test_strict_rejects_free_form() {
        let parser = CommitParser::default().strict(true);
        let err = parser.parse("Merge branch 'main'").unwrap_err();
        assert!(matches!(err, VersioningError::Grammar(_)));
    }

    #[test]
    fn test_strict_rejects_unknown_type() {
        let parser = CommitParser::default().strict(true);
        let err = parser.parse("wip: half done").unwrap_err();
        assert!(matches!(err, VersioningError::UnrecognizedType(t) if t == "wip"));
        assert!(parser.parse("feat: ok").is_ok());
        assert!(parser.parse("ci: ok").is_ok());
    }

    #[test]
    fn test_strict_rejects_unknown_scope() {
        let parser = CommitParser::new(vec!["docs".to_string()], vec!["cli".to_string()]).strict(true);
        assert!(parser.parse("docs(cli): usage").is_ok());
        let err = parser.parse("docs(core): usage").unwrap_err();
        assert!(matches!(err, VersioningError::UnrecognizedScope(s) if s == "core"));
    }

    #[test]
    fn test_lenient_accepts_unknown_type() {
        let c = parse("wip: half done");
        assert_eq!(c.commit_type(), Some("wip"));
    }
}
