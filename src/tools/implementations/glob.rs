// Glob tool - find files by pattern
//
// Walks the base directory, skipping noise directories, and returns matching
// files relative to the base, most recently modified first.

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use super::args::{optional_str, optional_usize, required_str};
use crate::config::constants::is_noise_dir;
use crate::tools::error::ToolError;
use crate::tools::paths::resolve_path;
use crate::tools::registry::Tool;
use crate::tools::types::{Disposition, ToolContext, ToolInputSchema};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

pub struct GlobTool;

#[async_trait]
impl Tool for GlobTool {
    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "Find files matching a glob pattern. Supports ** for recursive matching \
         (e.g., '**/*.rs' finds all Rust files). Results are sorted by modification \
         time, most recent first."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required(
                "pattern",
                "string",
                "Glob pattern to match (e.g., '**/*.py', 'src/**/*.ts')",
            )
            .optional(
                "path",
                "string",
                "Base directory to search in (default: current directory)",
            )
            .optional(
                "limit",
                "integer",
                "Maximum number of results to return (default: 100)",
            )
    }

    fn disposition(&self) -> Disposition {
        Disposition::Auto
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError> {
        let pattern_str = required_str(input, "pattern")?;
        let raw_base = optional_str(input, "path").unwrap_or(".");
        let limit = optional_usize(input, "limit")?
            .filter(|&l| l > 0)
            .unwrap_or(context.glob_limit);

        let patterns = compile_patterns(pattern_str)?;

        let base = resolve_path(raw_base, &context.working_dir);
        if !base.exists() {
            return Err(ToolError::Resource(format!("Path not found: {}", raw_base)));
        }
        if !base.is_dir() {
            return Err(ToolError::Validation(format!(
                "Not a directory: {}",
                raw_base
            )));
        }

        let walk_base = base.clone();
        let mut matches = tokio::task::spawn_blocking(move || find_matches(&walk_base, &patterns))
            .await
            .map_err(|e| ToolError::Resource(format!("Glob search failed: {}", e)))?;

        if matches.is_empty() {
            return Ok(format!(
                "No files found matching '{}' in {}",
                pattern_str, raw_base
            ));
        }

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total = matches.len();
        matches.truncate(limit);

        let mut output = format!("Found {} file(s) matching '{}':\n", total, pattern_str);
        output.push_str(
            &matches
                .iter()
                .map(|(rel, _)| format!("  {}", rel))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        if total > limit {
            output.push_str(&format!(
                "\n  ... (showing {} of {} results)",
                limit, total
            ));
        }

        Ok(output)
    }
}

/// The pattern itself plus, for a leading `**/`, its zero-directory form
fn compile_patterns(pattern: &str) -> Result<Vec<Pattern>, ToolError> {
    let mut sources = vec![pattern];
    if let Some(rest) = pattern.strip_prefix("**/") {
        sources.push(rest);
    }
    sources
        .into_iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| ToolError::Validation(format!("Invalid glob pattern '{}': {}", p, e)))
        })
        .collect()
}

fn find_matches(base: &Path, patterns: &[Pattern]) -> Vec<(String, SystemTime)> {
    WalkDir::new(base)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && is_noise_dir(&entry.file_name().to_string_lossy()))
        })
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let rel = relative_slash_path(base, entry.path())?;
            if !patterns.iter().any(|p| p.matches_with(&rel, MATCH_OPTIONS)) {
                return None;
            }
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some((rel, modified))
        })
        .collect()
}

fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel: PathBuf = path.strip_prefix(base).ok()?.to_path_buf();
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
