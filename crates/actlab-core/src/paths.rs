use crate::error::{ActLabError, Result};
use std::path::{Path, PathBuf};

pub const ACTLAB_DIR: &str = ".actlab";
pub const CONFIG_FILE: &str = ".actlab/config.yaml";
/// User-level fallback, relative to the home directory.
pub const GLOBAL_CONFIG_FILE: &str = ".actlab.yaml";

pub const GIT_DIR: &str = ".git";
pub const POST_COMMIT_HOOK: &str = ".git/hooks/post-commit";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn global_config_path() -> Result<PathBuf> {
    home::home_dir()
        .map(|home| home.join(GLOBAL_CONFIG_FILE))
        .ok_or(ActLabError::HomeNotFound)
}

pub fn post_commit_hook_path(root: &Path) -> PathBuf {
    root.join(POST_COMMIT_HOOK)
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let root = Path::new("/repo");
        assert_eq!(config_path(root), PathBuf::from("/repo/.actlab/config.yaml"));
        assert_eq!(
            post_commit_hook_path(root),
            PathBuf::from("/repo/.git/hooks/post-commit")
        );
    }

    #[test]
    fn markdown_by_extension() {
        assert!(is_markdown(Path::new("docs/README.md")));
        assert!(is_markdown(Path::new("NOTES.MD")));
        assert!(!is_markdown(Path::new("notes.txt")));
        assert!(!is_markdown(Path::new("Makefile")));
    }
}
