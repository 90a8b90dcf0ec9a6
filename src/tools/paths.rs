// Path resolution shared by the filesystem tools
//
// Expands `~`, anchors relative paths at the working directory and folds
// `.`/`..` segments lexically. No containment is enforced.

use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied path to an absolute, normalized path
pub fn resolve_path(raw: &str, working_dir: &Path) -> PathBuf {
    let expanded = expand_home(raw);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        working_dir.join(expanded)
    };
    normalize(&absolute)
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Display form of `path` relative to `base` when possible
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_joins_working_dir() {
        let resolved = resolve_path("src/main.rs", Path::new("/work/proj"));
        assert_eq!(resolved, PathBuf::from("/work/proj/src/main.rs"));
    }

    #[test]
    fn test_dot_segments_fold() {
        let resolved = resolve_path("./a/../b/./c.txt", Path::new("/work"));
        assert_eq!(resolved, PathBuf::from("/work/b/c.txt"));
    }

    #[test]
    fn test_absolute_is_kept() {
        let resolved = resolve_path("/etc/hosts", Path::new("/work"));
        assert_eq!(resolved, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_home_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolve_path("~/notes.md", Path::new("/work")), home.join("notes.md"));
        }
    }

    #[test]
    fn test_display_relative() {
        assert_eq!(
            display_relative(Path::new("/work/src/a.rs"), Path::new("/work")),
            "src/a.rs"
        );
        assert_eq!(display_relative(Path::new("/other/a.rs"), Path::new("/work")), "/other/a.rs");
    }
}
