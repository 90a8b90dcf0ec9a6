// Project context for the system prompt
//
// Finds the project root, loads SEEKCODE.md from it, and notes the git
// branch. The assembled prompt is the first message of every conversation.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::constants::PROJECT_CONTEXT_FILE;

/// Files or directories whose presence marks a project root, in priority order.
const ROOT_MARKERS: &[&str] = &[
    ".git",
    PROJECT_CONTEXT_FILE,
    "pyproject.toml",
    "package.json",
    "Cargo.toml",
];

const BASE_INSTRUCTIONS: &str = "\
You are SeekCode, an AI coding assistant that helps with software development tasks.

You have access to tools that let you read files, write files, edit files, run commands, and search the codebase.

## Guidelines

### Before making changes:
1. Understand the task fully before acting
2. Read relevant files to understand context
3. Plan your approach

### When editing code:
1. Use edit_file for small changes - it's more precise
2. Use write_file only for new files or complete rewrites
3. Run tests after changes when possible
4. If tests fail, analyze the error and iterate

### General principles:
- Be concise but thorough
- Explain your reasoning briefly
- Ask for clarification if the task is ambiguous
- If you're stuck, say so instead of guessing
- Don't make unnecessary changes to files
- Preserve existing code style and conventions";

/// Template written by `seekcode init`
pub const INIT_TEMPLATE: &str = "\
# SEEKCODE.md

## Project Overview
Describe your project here.

## Key Commands
- `make test`: Run tests
- `make lint`: Run linting
- `npm run dev`: Start development server

## Architecture
- `src/`: Source code
- `tests/`: Test files
- `docs/`: Documentation

## Conventions
- List your coding conventions here
- Style guides, patterns to follow

## Known Issues
- Document any known issues or gotchas
";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    pub root: PathBuf,
    /// Contents of SEEKCODE.md, if present and non-empty
    pub notes: Option<String>,
    pub git_branch: Option<String>,
    pub is_git_repo: bool,
}

impl ProjectContext {
    /// Gather context starting at `start`. With `load_notes == false` the
    /// notes file is skipped.
    pub fn discover(start: &Path, load_notes: bool) -> Self {
        let root = find_project_root(start);
        let is_git_repo = root.join(".git").exists();
        let notes = if load_notes { load_notes_file(&root) } else { None };
        let git_branch = if is_git_repo { git_branch(&root) } else { None };

        info!(
            root = %root.display(),
            notes = notes.is_some(),
            branch = git_branch.as_deref().unwrap_or("-"),
            "Project context"
        );

        Self {
            root,
            notes,
            git_branch,
            is_git_repo,
        }
    }

    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }

    pub fn system_prompt(&self) -> String {
        let mut parts = vec![BASE_INSTRUCTIONS.to_string()];

        parts.push(format!("\n## Working Directory\n{}", self.root.display()));

        if self.is_git_repo {
            let branch = self
                .git_branch
                .as_deref()
                .map(|b| format!(" (branch: {})", b))
                .unwrap_or_default();
            parts.push(format!("\n## Git Repository\nThis is a git repository{}.", branch));
        }

        if let Some(notes) = &self.notes {
            parts.push(format!(
                "\n## Project Context (from {})\n\n{}",
                PROJECT_CONTEXT_FILE, notes
            ));
        }

        parts.join("\n")
    }
}

/// Walk up from `start` to the first directory holding a root marker.
/// Falls back to `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
        .unwrap_or(start)
}

fn load_notes_file(root: &Path) -> Option<String> {
    let path = root.join(PROJECT_CONTEXT_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => Some(content),
        Ok(_) => None,
        Err(e) => {
            debug!("No {} at {}: {}", PROJECT_CONTEXT_FILE, path.display(), e);
            None
        }
    }
}

fn git_branch(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!branch.is_empty()).then_some(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_root_from_nested_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[package]").unwrap();
        let nested = tmp.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let root = find_project_root(&nested);
        assert_eq!(root, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn loads_notes_into_prompt() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PROJECT_CONTEXT_FILE), "Run `make check`.").unwrap();

        let ctx = ProjectContext::discover(tmp.path(), true);
        assert!(ctx.has_notes());
        let prompt = ctx.system_prompt();
        assert!(prompt.contains("## Project Context (from SEEKCODE.md)"));
        assert!(prompt.contains("Run `make check`."));
        assert!(prompt.contains("## Working Directory"));
    }

    #[test]
    fn no_context_flag_skips_notes() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PROJECT_CONTEXT_FILE), "secret notes").unwrap();

        let ctx = ProjectContext::discover(tmp.path(), false);
        assert!(!ctx.has_notes());
        assert!(!ctx.system_prompt().contains("secret notes"));
    }

    #[test]
    fn empty_notes_are_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PROJECT_CONTEXT_FILE), "  \n").unwrap();
        assert!(!ProjectContext::discover(tmp.path(), true).has_notes());
    }

    #[test]
    fn git_section_mentions_branch() {
        let ctx = ProjectContext {
            root: PathBuf::from("/repo"),
            notes: None,
            git_branch: Some("main".into()),
            is_git_repo: true,
        };
        assert!(ctx
            .system_prompt()
            .contains("This is a git repository (branch: main)."));
    }
}
