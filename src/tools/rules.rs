// Session rule store
//
// Remembered allow/deny decisions of the shape `kind(pattern)`, where kind is
// `shell` or `write`. Lives for one interactive session; passed explicitly
// into the permission engine and the orchestration loop.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::ToolError;

/// Kind of action a session rule covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Shell,
    Write,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Shell => "shell",
            RuleKind::Write => "write",
        }
    }
}

/// A parsed `kind(pattern)` rule
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionRule {
    pub kind: RuleKind,
    pub pattern: String,
}

impl SessionRule {
    pub fn shell(pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Shell,
            pattern: pattern.into(),
        }
    }

    pub fn write(pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Write,
            pattern: pattern.into(),
        }
    }

    /// Does this rule cover `subject` (a command line or a path)?
    pub fn matches(&self, kind: RuleKind, subject: &str) -> bool {
        self.kind == kind && wildcard_match(&self.pattern, subject)
    }
}

impl fmt::Display for SessionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.pattern)
    }
}

impl FromStr for SessionRule {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, rest) = s
            .split_once('(')
            .ok_or_else(|| ToolError::Validation(format!("Malformed rule: {}", s)))?;
        let pattern = rest
            .strip_suffix(')')
            .ok_or_else(|| ToolError::Validation(format!("Malformed rule: {}", s)))?;

        let kind = match kind {
            "shell" => RuleKind::Shell,
            "write" => RuleKind::Write,
            other => {
                return Err(ToolError::Validation(format!(
                    "Unknown rule kind '{}' (expected shell or write)",
                    other
                )))
            }
        };

        Ok(Self {
            kind,
            pattern: pattern.to_string(),
        })
    }
}

/// Allow and deny sets for the current session
#[derive(Debug, Clone, Default)]
pub struct SessionRules {
    allow: BTreeSet<SessionRule>,
    deny: BTreeSet<SessionRule>,
}

impl SessionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember_allow(&mut self, rule: SessionRule) {
        self.allow.insert(rule);
    }

    pub fn remember_deny(&mut self, rule: SessionRule) {
        self.deny.insert(rule);
    }

    pub fn is_allowed(&self, kind: RuleKind, subject: &str) -> bool {
        self.allow.iter().any(|r| r.matches(kind, subject))
    }

    pub fn is_denied(&self, kind: RuleKind, subject: &str) -> bool {
        self.deny.iter().any(|r| r.matches(kind, subject))
    }

    pub fn allow_rules(&self) -> impl Iterator<Item = &SessionRule> {
        self.allow.iter()
    }

    pub fn deny_rules(&self) -> impl Iterator<Item = &SessionRule> {
        self.deny.iter()
    }

    pub fn len(&self) -> usize {
        self.allow.len() + self.deny.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Match `text` against a pattern where `*` is any run of characters and
/// `?` is exactly one character. Anchored at both ends; nothing else is
/// special.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    // Position of the last `*` seen and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, tried)) = backtrack {
            pi = star + 1;
            ti = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}
