use std::{path::Path, process::Command};

use crate::{
   error::{CommitGenError, Result},
   interaction::MessageEditor,
};

const FALLBACK_EDITOR: &str = "vi";

/// Pick the editor command: configured value, `$VISUAL`, `$EDITOR`, git's
/// own `core.editor` resolution, then `vi`.
pub fn resolve_editor(configured: Option<&str>) -> String {
   resolve_from(
      configured,
      std::env::var("VISUAL").ok().as_deref(),
      std::env::var("EDITOR").ok().as_deref(),
      git_editor,
   )
}

fn resolve_from(
   configured: Option<&str>,
   visual: Option<&str>,
   editor: Option<&str>,
   git: impl FnOnce() -> Option<String>,
) -> String {
   [configured, visual, editor]
      .into_iter()
      .flatten()
      .map(str::trim)
      .find(|cmd| !cmd.is_empty())
      .map(str::to_string)
      .or_else(git)
      .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// `git var GIT_EDITOR`, if git is available and answers.
fn git_editor() -> Option<String> {
   let output = Command::new("git")
      .args(["var", "GIT_EDITOR"])
      .output()
      .ok()?;
   if !output.status.success() {
      return None;
   }
   let editor = String::from_utf8_lossy(&output.stdout).trim().to_string();
   (!editor.is_empty()).then_some(editor)
}

/// Runs a user editor on the message file and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
   command: String,
}

impl ExternalEditor {
   pub fn new(command: impl Into<String>) -> Self {
      Self { command: command.into() }
   }

   pub fn from_config(configured: Option<&str>) -> Self {
      Self::new(resolve_editor(configured))
   }

   pub fn command(&self) -> &str {
      &self.command
   }
}

impl MessageEditor for ExternalEditor {
   fn edit(&self, path: &Path) -> Result<()> {
      // "code --wait" style commands carry their own arguments
      let mut parts = self.command.split_whitespace();
      let program = parts
         .next()
         .ok_or_else(|| CommitGenError::EditorFailure("editor command is empty".to_string()))?;

      let status = Command::new(program)
         .args(parts)
         .arg(path)
         .status()
         .map_err(|e| CommitGenError::EditorFailure(format!("failed to start '{program}': {e}")))?;

      if !status.success() {
         return Err(CommitGenError::EditorFailure(format!(
            "'{}' exited with {status}",
            self.command
         )));
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_resolution_order() {
      let no_git = || None;
      assert_eq!(resolve_from(Some("nano"), Some("code"), Some("vim"), no_git), "nano");
      assert_eq!(resolve_from(None, Some("code --wait"), Some("vim"), no_git), "code --wait");
      assert_eq!(resolve_from(Some("  "), None, Some("vim"), no_git), "vim");
      assert_eq!(resolve_from(None, None, None, || Some("emacs".to_string())), "emacs");
      assert_eq!(resolve_from(None, None, None, no_git), "vi");
   }

   #[test]
   fn test_empty_command_fails() {
      let editor = ExternalEditor::new("   ");
      assert!(matches!(
         editor.edit(Path::new("/tmp/unused")),
         Err(CommitGenError::EditorFailure(_))
      ));
   }

   #[test]
   fn test_missing_program_fails() {
      let editor = ExternalEditor::new("commit-gen-no-such-editor-binary");
      assert!(matches!(
         editor.edit(Path::new("/tmp/unused")),
         Err(CommitGenError::EditorFailure(_))
      ));
   }

   #[cfg(unix)]
   #[test]
   fn test_exit_status_is_checked() {
      let file = tempfile::NamedTempFile::new().unwrap();
      assert!(ExternalEditor::new("true").edit(file.path()).is_ok());
      assert!(matches!(
         ExternalEditor::new("false").edit(file.path()),
         Err(CommitGenError::EditorFailure(_))
      ));
   }
}
