use std::{path::Path, process::Command};

use crate::error::{CommitGenError, Result};

/// Version-control operations the pipeline depends on.
pub trait Repository {
   /// Staged diff text. Fails with `NoStagedChanges` when nothing is staged.
   fn staged_diff(&self) -> Result<String>;

   /// Full messages of the last `count` commits, newest first.
   fn recent_commits(&self, count: usize) -> Result<String>;

   /// Commit the staged changes with the message stored at `path`.
   fn commit_with_file(&self, path: &Path) -> Result<()>;
}

/// `git` CLI in a working directory.
#[derive(Debug, Clone)]
pub struct GitRepository {
   dir: String,
}

impl GitRepository {
   pub fn new(dir: impl Into<String>) -> Self {
      Self { dir: dir.into() }
   }

   pub fn dir(&self) -> &str {
      &self.dir
   }
}

impl Repository for GitRepository {
   fn staged_diff(&self) -> Result<String> {
      let output = Command::new("git")
         .args(["diff", "--cached"])
         .current_dir(&self.dir)
         .output()
         .map_err(|e| CommitGenError::GitError(format!("Failed to run git diff --cached: {e}")))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(CommitGenError::GitError(format!("git diff --cached failed: {stderr}")));
      }

      let diff = String::from_utf8_lossy(&output.stdout).to_string();
      if diff.trim().is_empty() {
         return Err(CommitGenError::NoStagedChanges);
      }

      Ok(diff)
   }

   fn recent_commits(&self, count: usize) -> Result<String> {
      if count == 0 {
         return Ok(String::new());
      }

      let output = Command::new("git")
         .args(["log", &format!("-{count}"), "--pretty=format:%B"])
         .current_dir(&self.dir)
         .output()
         .map_err(|e| CommitGenError::GitError(format!("Failed to run git log: {e}")))?;

      // Fresh repositories have no HEAD yet; git log exits non-zero there
      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         if stderr.contains("does not have any commits") {
            return Ok(String::new());
         }
         return Err(CommitGenError::GitError(format!("git log failed: {stderr}")));
      }

      Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
   }

   fn commit_with_file(&self, path: &Path) -> Result<()> {
      let output = Command::new("git")
         .arg("commit")
         .arg("-F")
         .arg(path)
         .current_dir(&self.dir)
         .output()
         .map_err(|e| CommitGenError::CommitFailure(format!("Failed to run git commit: {e}")))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         let stdout = String::from_utf8_lossy(&output.stdout);
         return Err(CommitGenError::CommitFailure(format!(
            "git commit exited with {}:\nstderr: {}\nstdout: {}",
            output.status,
            stderr.trim(),
            stdout.trim()
         )));
      }

      let stdout = String::from_utf8_lossy(&output.stdout);
      if !stdout.trim().is_empty() {
         println!("\n{}", stdout.trim_end());
      }

      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use std::process::Command;

   use super::*;

   /// Initialise a throwaway repository; `None` when git is unavailable.
   fn init_repo() -> Option<tempfile::TempDir> {
      let dir = tempfile::tempdir().ok()?;
      let run = |args: &[&str]| {
         Command::new("git")
            .args(args)
            .current_dir(dir.path())
            .output()
            .ok()
            .filter(|o| o.status.success())
      };
      run(&["init", "-q"])?;
      run(&["config", "user.email", "dev@example.com"])?;
      run(&["config", "user.name", "Dev"])?;
      run(&["config", "commit.gpgsign", "false"])?;
      Some(dir)
   }

   #[test]
   fn test_empty_index_is_no_staged_changes() {
      let Some(dir) = init_repo() else { return };
      let repo = GitRepository::new(dir.path().to_string_lossy());
      assert!(matches!(repo.staged_diff(), Err(CommitGenError::NoStagedChanges)));
      assert_eq!(repo.recent_commits(3).unwrap(), "");
   }

   #[test]
   fn test_commit_with_file_round_trip() {
      let Some(dir) = init_repo() else { return };
      std::fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
      Command::new("git")
         .args(["add", "a.txt"])
         .current_dir(dir.path())
         .output()
         .unwrap();

      let repo = GitRepository::new(dir.path().to_string_lossy());
      assert!(repo.staged_diff().unwrap().contains("+hello"));

      let msg_file = dir.path().join("msg.txt");
      std::fs::write(&msg_file, "feat \u{2728}: add greeting\n\n- added a.txt").unwrap();
      repo.commit_with_file(&msg_file).unwrap();

      let log = repo.recent_commits(1).unwrap();
      assert!(log.starts_with("feat \u{2728}: add greeting"));
      assert!(log.contains("- added a.txt"));
   }

   #[test]
   fn test_commit_failure_is_distinct() {
      let Some(dir) = init_repo() else { return };
      let repo = GitRepository::new(dir.path().to_string_lossy());
      let msg_file = dir.path().join("msg.txt");
      std::fs::write(&msg_file, "fix \u{1F41B}: nothing staged").unwrap();
      assert!(matches!(
         repo.commit_with_file(&msg_file),
         Err(CommitGenError::CommitFailure(_))
      ));
   }
}
