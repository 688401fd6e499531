use crate::{
   config::FormatConfig,
   error::{CommitGenError, Result},
   normalization::{collapse_whitespace, parse_type_prefix},
   types::{CommitMessage, DescriptionMode},
};

/// Check a formatted message against the configured limits.
///
/// Limits are reported, never fixed: the caller decides whether to
/// regenerate or let the user edit.
pub fn validate_message(msg: &CommitMessage, config: &FormatConfig) -> Result<()> {
   let Some((_, subject)) = parse_type_prefix(&msg.title) else {
      return Err(CommitGenError::FormatViolation(format!(
         "title '{}' does not start with a known commit type",
         msg.title
      )));
   };
   if subject.trim().is_empty() {
      return Err(CommitGenError::FormatViolation("title has no description text".to_string()));
   }

   let title_len = msg.title.chars().count();
   if title_len > config.max_title_length {
      return Err(CommitGenError::FormatViolation(format!(
         "title is {title_len} chars (max {})",
         config.max_title_length
      )));
   }

   if !msg.has_description() {
      return Ok(());
   }

   match config.description_mode {
      DescriptionMode::Bullets => {
         let bullets: Vec<&str> = msg
            .description
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();

         if bullets.len() > config.max_bullets {
            return Err(CommitGenError::FormatViolation(format!(
               "description has {} bullets (max {})",
               bullets.len(),
               config.max_bullets
            )));
         }

         for bullet in bullets {
            let text = bullet.trim_start_matches("- ");
            let len = text.chars().count();
            if len > config.max_bullet_length {
               return Err(CommitGenError::FormatViolation(format!(
                  "bullet is {len} chars (max {}): '{text}'",
                  config.max_bullet_length
               )));
            }
         }
      },
      DescriptionMode::Paragraph => {
         let len = collapse_whitespace(&msg.description).chars().count();
         if len > config.max_paragraph_length {
            return Err(CommitGenError::FormatViolation(format!(
               "description is {len} chars (max {})",
               config.max_paragraph_length
            )));
         }
      },
   }

   Ok(())
}
