// Grep tool - searches for regex patterns in files

use async_trait::async_trait;
use glob::Pattern;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::args::{optional_bool, optional_str, optional_usize, required_str};
use crate::config::constants::{is_noise_dir, GREP_LINE_MAX_CHARS};
use crate::tools::error::ToolError;
use crate::tools::paths::{display_relative, resolve_path};
use crate::tools::registry::Tool;
use crate::tools::types::{Disposition, ToolContext, ToolInputSchema};

/// Extensions never opened by grep
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "webp", "pdf", "doc", "docx", "xls", "xlsx", "zip",
    "tar", "gz", "rar", "7z", "exe", "dll", "so", "dylib", "pyc", "pyo", "class", "woff",
    "woff2", "ttf", "eot", "mp3", "mp4", "wav", "avi", "mov", "rlib", "o", "a", "wasm",
];

pub struct GrepTool;

struct GrepMatch {
    file: String,
    line: usize,
    content: String,
}

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern in files. Returns matching lines with file paths and \
         line numbers."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required("pattern", "string", "Regex pattern to search for")
            .optional(
                "path",
                "string",
                "File or directory to search in (default: current directory)",
            )
            .optional(
                "include",
                "string",
                "Glob pattern for file names to include (e.g., '*.rs')",
            )
            .optional(
                "ignore_case",
                "boolean",
                "Case-insensitive search (default: false)",
            )
            .optional(
                "limit",
                "integer",
                "Maximum number of matches to return (default: 50)",
            )
    }

    fn disposition(&self) -> Disposition {
        Disposition::Auto
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError> {
        let pattern = required_str(input, "pattern")?;
        let raw_base = optional_str(input, "path").unwrap_or(".");
        let ignore_case = optional_bool(input, "ignore_case");
        let limit = optional_usize(input, "limit")?
            .filter(|&l| l > 0)
            .unwrap_or(context.grep_limit);

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| ToolError::Validation(format!("Invalid regex pattern: {}", e)))?;

        let include = optional_str(input, "include")
            .filter(|s| !s.is_empty() && *s != "*")
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    ToolError::Validation(format!("Invalid include pattern '{}': {}", s, e))
                })
            })
            .transpose()?;

        let base = resolve_path(raw_base, &context.working_dir);
        if !base.exists() {
            return Err(ToolError::Resource(format!("Path not found: {}", raw_base)));
        }

        let (matches, truncated) =
            tokio::task::spawn_blocking(move || search(&base, &regex, include.as_ref(), limit))
                .await
                .map_err(|e| ToolError::Resource(format!("Search failed: {}", e)))?;

        if matches.is_empty() {
            return Ok(format!("No matches found for '{}' in {}", pattern, raw_base));
        }

        let mut output = format!("Found {} match(es) for '{}':\n\n", matches.len(), pattern);
        for m in &matches {
            output.push_str(&format!("{}:{}: {}\n", m.file, m.line, m.content));
        }
        if truncated {
            output.push_str(&format!("\n... (limited to {} results)", limit));
        }

        Ok(output)
    }
}

/// Walk `base`, returning up to `limit` matches and whether more were cut off
fn search(
    base: &Path,
    regex: &Regex,
    include: Option<&Pattern>,
    limit: usize,
) -> (Vec<GrepMatch>, bool) {
    let files: Vec<PathBuf> = if base.is_file() {
        vec![base.to_path_buf()]
    } else {
        WalkDir::new(base)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && is_noise_dir(&entry.file_name().to_string_lossy()))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    };

    let display_base = if base.is_file() {
        base.parent().unwrap_or(base)
    } else {
        base
    };

    let mut matches = Vec::new();
    for path in files {
        if is_binary(&path) {
            continue;
        }
        if let Some(pattern) = include {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !pattern.matches(&name) {
                continue;
            }
        }

        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        let contents = String::from_utf8_lossy(&bytes);

        for (index, line) in contents.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            if matches.len() >= limit {
                return (matches, true);
            }
            matches.push(GrepMatch {
                file: display_relative(&path, display_base),
                line: index + 1,
                content: truncate_chars(line.trim_end(), GREP_LINE_MAX_CHARS),
            });
        }
    }

    (matches, false)
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map_or(false, |ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

fn truncate_chars(line: &str, max: usize) -> String {
    match line.char_indices().nth(max) {
        Some((idx, _)) => line[..idx].to_string(),
        None => line.to_string(),
    }
}
