use std::path::PathBuf;

use rust_embed::RustEmbed;
use serde::Serialize;
use tera::{Context, Tera};

use crate::{
   config::{FormatConfig, config_dir},
   error::{CommitGenError, Result},
   types::{CommitType, StyleProfile},
};

/// Embedded prompts folder (compiled into binary)
#[derive(RustEmbed)]
#[folder = "prompts/"]
struct Prompts;

const COMMIT_TEMPLATE: &str = "commit.md";

#[derive(Debug, Serialize)]
struct TypeEntry {
   tag:   &'static str,
   glyph: &'static str,
}

/// Everything the system prompt is rendered from.
#[derive(Debug)]
pub struct PromptContext<'a> {
   pub format:              &'a FormatConfig,
   pub style:               &'a StyleProfile,
   pub description_enabled: bool,
   /// Set on regeneration after the previous output broke a rule
   pub correction:          Option<&'a str>,
}

/// User override (~/.config/commit-gen/prompts/commit.md) if present.
fn user_template_path() -> Option<PathBuf> {
   config_dir().map(|dir| dir.join("prompts").join(COMMIT_TEMPLATE))
}

/// Load template content, preferring the user's copy over the embedded one.
fn load_template() -> Result<String> {
   if let Some(path) = user_template_path()
      && path.is_file()
   {
      return std::fs::read_to_string(&path).map_err(|e| {
         CommitGenError::TemplateError(format!("failed to read {}: {e}", path.display()))
      });
   }

   let embedded = Prompts::get(COMMIT_TEMPLATE).ok_or_else(|| {
      CommitGenError::TemplateError(format!("embedded template {COMMIT_TEMPLATE} missing"))
   })?;
   std::str::from_utf8(embedded.data.as_ref())
      .map(str::to_string)
      .map_err(|e| {
         CommitGenError::TemplateError(format!("embedded template is not valid UTF-8: {e}"))
      })
}

fn build_context(ctx: &PromptContext<'_>) -> Context {
   let commit_types: Vec<TypeEntry> = CommitType::ALL
      .into_iter()
      .map(|t| TypeEntry { tag: t.as_str(), glyph: t.glyph() })
      .collect();

   let mut context = Context::new();
   context.insert("commit_types", &commit_types);
   context.insert("style_instructions", ctx.style.instructions.trim());
   context.insert("description_enabled", &ctx.description_enabled);
   context.insert("description_mode", &ctx.format.description_mode.to_string());
   context.insert("max_title_length", &ctx.format.max_title_length);
   context.insert("max_bullets", &ctx.format.max_bullets);
   context.insert("max_bullet_length", &ctx.format.max_bullet_length);
   context.insert("max_paragraph_length", &ctx.format.max_paragraph_length);
   context.insert("commit_message_language", &ctx.format.commit_message_language);
   context.insert("description_language", &ctx.format.description_language);
   context
}

/// Render a template string against the prompt context.
pub fn render_template(template: &str, ctx: &PromptContext<'_>) -> Result<String> {
   let mut prompt = Tera::one_off(template, &build_context(ctx), false)
      .map_err(|e| CommitGenError::TemplateError(format!("failed to render prompt: {e}")))?;

   if let Some(reason) = ctx.correction {
      prompt.push_str(&format!(
         "\n\nCRITICAL: The previous attempt was rejected because {reason}. Correct this."
      ));
   }
   Ok(prompt)
}

/// Render the system prompt for commit generation.
pub fn render_commit_prompt(ctx: &PromptContext<'_>) -> Result<String> {
   render_template(&load_template()?, ctx)
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::types::{DescriptionMode, find_style};

   fn embedded() -> String {
      let file = Prompts::get(COMMIT_TEMPLATE).unwrap();
      String::from_utf8(file.data.to_vec()).unwrap()
   }

   #[test]
   fn test_prompt_lists_every_type() {
      let format = FormatConfig::default();
      let ctx = PromptContext {
         format:              &format,
         style:               find_style("standard").unwrap(),
         description_enabled: true,
         correction:          None,
      };
      let prompt = render_template(&embedded(), &ctx).unwrap();
      for t in CommitType::ALL {
         assert!(prompt.contains(&format!("- {}: description", t.as_str())));
      }
      assert!(prompt.contains("At most 3 bullets"));
      assert!(prompt.contains("Brazilian Portuguese"));
      assert!(!prompt.contains("TONE:"));
      assert!(!prompt.contains("CRITICAL"));
   }

   #[test]
   fn test_prompt_includes_style_and_paragraph_mode() {
      let format =
         FormatConfig { description_mode: DescriptionMode::Paragraph, ..FormatConfig::default() };
      let ctx = PromptContext {
         format:              &format,
         style:               find_style("epic").unwrap(),
         description_enabled: true,
         correction:          Some("title is 72 chars (max 50)"),
      };
      let prompt = render_template(&embedded(), &ctx).unwrap();
      assert!(prompt.contains("TONE:"));
      assert!(prompt.contains("epic conquest"));
      assert!(prompt.contains("single paragraph"));
      assert!(prompt.contains("At most 400 characters"));
      assert!(prompt.ends_with("title is 72 chars (max 50). Correct this."));
   }

   #[test]
   fn test_prompt_title_only() {
      let format = FormatConfig::default();
      let ctx = PromptContext {
         format:              &format,
         style:               find_style("standard").unwrap(),
         description_enabled: false,
         correction:          None,
      };
      let prompt = render_template(&embedded(), &ctx).unwrap();
      assert!(prompt.contains("title line only"));
      assert!(!prompt.contains("bullets"));
   }
}
