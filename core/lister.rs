use crate::error::{AppError, Result};
use crate::process::run_with_timeout;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Source of the candidate universe: the files version control tracks under a root.
pub trait ListTrackedFiles {
    /// Paths relative to `root`, in the tool's native order. Untracked files never appear.
    fn list_tracked_files(&self, root: &Path) -> Result<Vec<String>>;
}

/// Lists the index with `git ls-files -z`.
#[derive(Debug, Clone)]
pub struct GitLister {
    timeout: Duration,
}

impl GitLister {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ListTrackedFiles for GitLister {
    fn list_tracked_files(&self, root: &Path) -> Result<Vec<String>> {
        log::debug!("Listing tracked files in {}", root.display());
        let mut command = Command::new("git");
        command.arg("-C").arg(root).args(["ls-files", "-z"]);

        let output = run_with_timeout(&mut command, self.timeout).map_err(|e| {
            AppError::RepositoryAccess(format!(
                "Failed to run `git ls-files` in '{}': {}",
                root.display(),
                e
            ))
        })?;
        if !output.status.success() {
            return Err(AppError::RepositoryAccess(format!(
                "`git ls-files` failed in '{}': {}",
                root.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let paths = parse_listing(&output.stdout);
        log::info!("Repository tracks {} files.", paths.len());
        Ok(paths)
    }
}

/// Splits NUL-separated `ls-files -z` output. Entries that are not UTF-8 cannot be
/// matched or emitted, and a newline in a path would break the section header line,
/// so both are dropped with a warning.
pub fn parse_listing(raw: &[u8]) -> Vec<String> {
    raw.split(|byte| *byte == 0)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match std::str::from_utf8(entry) {
            Ok(path) if path.contains(['\n', '\r']) => {
                log::warn!("Skipping tracked path containing a line break: {:?}", path);
                None
            }
            Ok(path) => Some(path.to_string()),
            Err(_) => {
                log::warn!(
                    "Skipping tracked path with non-UTF-8 name: {}",
                    String::from_utf8_lossy(entry)
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_nul_separated_listing_in_order() {
        let raw = b"b.rb\0app/models/user.rb\0with space.txt\0";
        assert_eq!(
            parse_listing(raw),
            vec!["b.rb", "app/models/user.rb", "with space.txt"]
        );
    }

    #[test]
    fn drops_empty_and_non_utf8_entries() {
        let raw = b"ok.rb\0\0bad\xff.rb\0last";
        assert_eq!(parse_listing(raw), vec!["ok.rb", "last"]);
    }

    #[test]
    fn drops_paths_with_line_breaks() {
        let raw = b"ok.rb\0bad\nname.rb\0carriage\rreturn.rb\0last.rb\0";
        assert_eq!(parse_listing(raw), vec!["ok.rb", "last.rb"]);
    }

    #[test]
    fn non_repository_is_a_repository_access_error() {
        let dir = TempDir::new().unwrap();
        // Either git is missing or the directory is not a repository; both are fatal.
        let lister = GitLister::new(Duration::from_secs(10));
        let outside = dir.path().join("missing-subdir");
        assert!(matches!(
            lister.list_tracked_files(&outside),
            Err(AppError::RepositoryAccess(_))
        ));
    }
}
