use std::path::PathBuf;

/// Expand `~` in a user-supplied path and make it absolute against the
/// current directory.
pub fn expand_user_path(path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path).to_string();
    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_pass_through() {
        assert_eq!(expand_user_path("/tmp/work"), PathBuf::from("/tmp/work"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let expanded = expand_user_path("work");
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("work"));
    }

    #[test]
    fn tilde_expands_to_home() {
        if std::env::var_os("HOME").is_none() {
            return;
        }
        let expanded = expand_user_path("~/work");
        assert!(!expanded.to_string_lossy().contains('~'));
    }
}
