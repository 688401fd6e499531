/// Reshaping raw model output into a tagged, formatted commit message
use unicode_normalization::UnicodeNormalization;
use unicode_width::UnicodeWidthStr;

use crate::{
   config::FormatConfig,
   error::{CommitGenError, Result},
   types::{CommitMessage, CommitType, DescriptionMode},
};

/// Visual column width for paragraph descriptions.
pub const WRAP_WIDTH: usize = 80;

/// Sources whose "Generated by ..." advertisement lines get stripped.
const BANNER_SOURCES: &[&str] =
   &["blackbox.ai", "blackbox ai", "blackboxai", "bing", "g4f", "gpt4free", "you.com"];

/// Canonical composition plus cleanup of invisible characters models like to
/// emit.
pub fn normalize_unicode(text: &str) -> String {
   let composed: String = text.replace("\r\n", "\n").replace('\r', "\n").nfc().collect();

   composed
      .replace(
         [
            '\u{00A0}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}',
            '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{202F}', '\u{205F}',
            '\u{3000}',
         ],
         " ",
      )
      // Zero-width characters (keep U+200D, emoji sequences need it)
      .replace(['\u{200B}', '\u{200C}', '\u{FEFF}'], "")
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
   text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_banner_line(line: &str) -> bool {
   let bare = line
      .trim()
      .trim_matches(|c: char| matches!(c, '*' | '_' | '>' | '`' | '#' | '-') || c.is_whitespace())
      .to_lowercase();

   bare.strip_prefix("generated by ").is_some_and(|source| {
      BANNER_SOURCES.iter().any(|src| {
         // The source name must end at a word boundary: "bing" but not "bingo"
         source.strip_prefix(src).is_some_and(|after| {
            after
               .chars()
               .next()
               .is_none_or(|c| c.is_whitespace() || matches!(c, ',' | '.' | '!' | ':'))
         })
      })
   })
}

/// Remove whole "Generated by X" banner lines and leading blank lines.
/// Banner-like text inside a sentence is left alone.
pub fn strip_provider_boilerplate(text: &str) -> String {
   let kept: Vec<&str> = text
      .lines()
      .filter(|line| !is_banner_line(line))
      .skip_while(|line| line.trim().is_empty())
      .collect();

   let mut out = kept.join("\n");
   if text.ends_with('\n') && !out.is_empty() {
      out.push('\n');
   }
   out
}

/// Drop Markdown code fence lines (```` ``` ```` / ```` ```text ````).
pub fn strip_code_fences(text: &str) -> String {
   text
      .lines()
      .filter(|line| !line.trim_start().starts_with("```"))
      .collect::<Vec<_>>()
      .join("\n")
}

/// Parse a `tag[ glyph...]: text` prefix.
///
/// The tag is the leading ASCII-alphanumeric run, so a glyph glued to it
/// (`feat✨:`) still parses. Anything between the tag and the colon must be
/// non-alphanumeric (stray or wrong glyphs); it is discarded so the caller
/// can write the canonical glyph. Returns the type and the text after the
/// colon, untrimmed.
pub fn parse_type_prefix(line: &str) -> Option<(CommitType, &str)> {
   let trimmed = line.trim_start();
   let (head, rest) = trimmed.split_once(':')?;

   let tag_end = head
      .find(|c: char| !c.is_ascii_alphanumeric())
      .unwrap_or(head.len());
   let (tag, decoration) = head.split_at(tag_end);
   let commit_type = CommitType::from_tag(tag)?;

   decoration
      .chars()
      .all(|c| !c.is_alphanumeric())
      .then_some((commit_type, rest))
}

/// Find the first line starting with a known tag. Returns the lines from that
/// point on and the index of the tagged line in the original text.
pub fn extract_commit_line(raw: &str) -> Result<(Vec<&str>, usize)> {
   let lines: Vec<&str> = raw.lines().collect();
   let start = lines
      .iter()
      .position(|line| parse_type_prefix(line).is_some())
      .ok_or(CommitGenError::NoRecognizedCommitType)?;

   Ok((lines[start..].to_vec(), start))
}

/// Rewrite `tag: text` to `tag glyph: text`. Lines that already carry the
/// glyph come out unchanged; lines without a known tag are returned as-is.
pub fn apply_type_emoji(line: &str) -> String {
   match parse_type_prefix(line) {
      Some((commit_type, rest)) => {
         let text = rest.trim_start();
         if text.is_empty() {
            commit_type.prefix()
         } else {
            format!("{} {text}", commit_type.prefix())
         }
      },
      None => line.to_string(),
   }
}

/// Title line only when the description is disabled, otherwise the title and
/// every following line.
pub fn select_body(lines: &[&str], description_enabled: bool) -> String {
   if description_enabled {
      lines.join("\n")
   } else {
      lines.first().copied().unwrap_or_default().to_string()
   }
}

/// Terminal columns `s` occupies: wide CJK and emoji take two, combining
/// marks none.
pub fn display_width(s: &str) -> usize {
   UnicodeWidthStr::width(s)
}

/// Greedy word wrap by display width. A word wider than `width` sits alone
/// on its line.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
   let mut lines = Vec::new();
   let mut current = String::new();
   let mut current_len = 0;

   for word in text.split_whitespace() {
      let word_len = display_width(word);

      if current.is_empty() {
         current.push_str(word);
         current_len = word_len;
      } else if current_len + 1 + word_len <= width {
         current.push(' ');
         current.push_str(word);
         current_len += 1 + word_len;
      } else {
         lines.push(std::mem::take(&mut current));
         current.push_str(word);
         current_len = word_len;
      }
   }

   if !current.is_empty() {
      lines.push(current);
   }

   lines
}

fn format_title(title: &str) -> String {
   match parse_type_prefix(title) {
      Some((commit_type, rest)) => {
         let text = rest.trim();
         if text.is_empty() {
            commit_type.prefix()
         } else {
            format!("{} {text}", commit_type.prefix())
         }
      },
      None => title.trim().to_string(),
   }
}

/// Rewrite list markers other than `-` so they survive whitespace collapsing.
fn unify_bullet_markers(rest: &str) -> String {
   rest
      .lines()
      .map(|line| {
         let trimmed = line.trim_start();
         for marker in ["* ", "+ ", "\u{2022} ", "\u{2023} "] {
            if let Some(item) = trimmed.strip_prefix(marker) {
               return format!("- {item}");
            }
         }
         trimmed.to_string()
      })
      .collect::<Vec<_>>()
      .join("\n")
}

fn format_bullets(rest: &str) -> String {
   let collapsed = collapse_whitespace(&unify_bullet_markers(rest));
   if collapsed.is_empty() {
      return String::new();
   }

   let split = collapsed.replace(" - ", "\n- ");
   if split.starts_with("- ") {
      split
   } else if let Some(item) = split.strip_prefix('-') {
      // "-item" with no space after the marker
      format!("- {}", item.trim_start())
   } else {
      format!("- {split}")
   }
}

fn format_paragraph(rest: &str) -> String {
   wrap_words(&collapse_whitespace(rest), WRAP_WIDTH).join("\n")
}

/// Shape a title+description blob according to the format configuration.
///
/// Length limits are not applied here; see
/// [`crate::validation::validate_message`].
pub fn format_message(blob: &str, config: &FormatConfig) -> Result<CommitMessage> {
   config.validate()?;

   let (title, rest) = blob.split_once('\n').unwrap_or((blob, ""));
   let title = format_title(title);

   let description = match config.description_mode {
      DescriptionMode::Bullets => format_bullets(rest),
      DescriptionMode::Paragraph => format_paragraph(rest),
   };

   Ok(CommitMessage::new(title, description.trim()))
}

/// Full pipeline from raw model text to a formatted message.
pub fn normalize(
   raw: &str,
   config: &FormatConfig,
   description_enabled: bool,
) -> Result<CommitMessage> {
   let cleaned = strip_code_fences(&strip_provider_boilerplate(&normalize_unicode(raw)));
   let (lines, _) = extract_commit_line(&cleaned)?;

   let mut lines: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
   lines[0] = apply_type_emoji(lines[0].trim());
   let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();

   format_message(&select_body(&borrowed, description_enabled), config)
}
