use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommitGenError {
   #[error("No staged changes to commit (stage files with `git add` first)")]
   NoStagedChanges,

   #[error("Could not generate a commit message: {0}")]
   GenerationFailure(String),

   #[error("Model output has no line starting with a known commit type")]
   NoRecognizedCommitType,

   #[error("Invalid configuration: {0}")]
   InvalidConfiguration(String),

   #[error("Editor failed: {0}")]
   EditorFailure(String),

   #[error("Commit message was approved but git commit failed: {0}")]
   CommitFailure(String),

   #[error("Message breaks format limits: {0}")]
   FormatViolation(String),

   #[error("Git command failed: {0}")]
   GitError(String),

   #[error("API request failed (HTTP {status}): {body}")]
   ApiError { status: u16, body: String },

   #[error("API call failed after {retries} retries: {source}")]
   ApiRetryExhausted {
      retries: u32,
      #[source]
      source:  Box<Self>,
   },

   #[error("Prompt template error: {0}")]
   TemplateError(String),

   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   JsonError(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   HttpError(#[from] reqwest::Error),
}

impl CommitGenError {
   /// Whether the model output (or the call producing it) was unusable.
   pub const fn is_generation_failure(&self) -> bool {
      matches!(
         self,
         Self::GenerationFailure(_)
            | Self::NoRecognizedCommitType
            | Self::ApiError { .. }
            | Self::ApiRetryExhausted { .. }
            | Self::HttpError(_)
      )
   }
}

pub type Result<T> = std::result::Result<T, CommitGenError>;

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_generation_failure_grouping() {
      assert!(CommitGenError::NoRecognizedCommitType.is_generation_failure());
      assert!(CommitGenError::GenerationFailure("empty".into()).is_generation_failure());
      assert!(
         CommitGenError::ApiError { status: 502, body: "bad gateway".into() }
            .is_generation_failure()
      );
      assert!(!CommitGenError::CommitFailure("hook rejected".into()).is_generation_failure());
      assert!(!CommitGenError::NoStagedChanges.is_generation_failure());
   }

   #[test]
   fn test_commit_failure_message_mentions_approval() {
      let err = CommitGenError::CommitFailure("exit status 1".into());
      assert!(err.to_string().contains("approved"));
      assert!(err.to_string().contains("exit status 1"));
   }
}
