//! Path helpers used by register maintenance

use std::path::{Path, PathBuf};

/// Compare two paths by the platform's naming convention
#[cfg(not(windows))]
pub fn paths_equal(a: &str, b: &str) -> bool {
    a == b
}

/// Compare two paths by the platform's naming convention
#[cfg(windows)]
pub fn paths_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Whether `path` lies inside `root` (component-wise, `root` itself excluded)
pub fn is_under(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root)
}

/// Home directory of the current user
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Replace a leading home directory with `~`
pub fn abbreviate_home(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    let Some(home) = home.to_str() else {
        return path.to_string();
    };
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return path.to_string();
    }

    match path.strip_prefix(home) {
        Some("") => "~".to_string(),
        Some(rest) if rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}
