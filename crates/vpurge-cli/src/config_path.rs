use std::path::{Path, PathBuf};
use vpurge_core::config::CONFIG_FILE;

/// Resolve the config file location.
///
/// Priority:
/// 1. `--config` flag / `VPURGE_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `vpurge.yaml`
/// 3. `~/.config/vpurge/vpurge.yaml` if it exists
/// 4. Fall back to `cwd/vpurge.yaml` (where `vpurge init` writes)
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Some(found) = find_upward(&cwd) {
        return found;
    }

    if let Some(home) = home::home_dir() {
        let user = home.join(".config/vpurge").join(CONFIG_FILE);
        if user.is_file() {
            return user;
        }
    }

    cwd.join(CONFIG_FILE)
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        assert_eq!(resolve_config(Some(&path)), path);
    }

    #[test]
    fn finds_config_in_ancestor() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "org_id: x\n").unwrap();
        let deep = dir.path().join("a/b/c");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_upward(&deep), Some(dir.path().join(CONFIG_FILE)));
    }
}
