use std::{fmt, path::PathBuf};

use clap::{ArgGroup, Parser};
use serde::{Deserialize, Serialize};

// === Commit types ===

/// Conventional commit category. Each tag carries exactly one glyph that is
/// placed between the tag and the colon of the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
   Feat,
   Fix,
   Docs,
   Style,
   Refactor,
   Perf,
   Test,
   Build,
   Ci,
   Chore,
}

impl CommitType {
   /// Table order is also the order shown to the model.
   pub const ALL: [Self; 10] = [
      Self::Feat,
      Self::Fix,
      Self::Docs,
      Self::Style,
      Self::Refactor,
      Self::Perf,
      Self::Test,
      Self::Build,
      Self::Ci,
      Self::Chore,
   ];

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Feat => "feat",
         Self::Fix => "fix",
         Self::Docs => "docs",
         Self::Style => "style",
         Self::Refactor => "refactor",
         Self::Perf => "perf",
         Self::Test => "test",
         Self::Build => "build",
         Self::Ci => "ci",
         Self::Chore => "chore",
      }
   }

   pub const fn glyph(self) -> &'static str {
      match self {
         Self::Feat => "\u{2728}",      // sparkles
         Self::Fix => "\u{1F41B}",      // bug
         Self::Docs => "\u{1F4DA}",     // books
         Self::Style => "\u{1F48E}",    // gem
         Self::Refactor => "\u{1F528}", // hammer
         Self::Perf => "\u{1F680}",     // rocket
         Self::Test => "\u{1F6A8}",     // rotating light
         Self::Build => "\u{1F4E6}",    // package
         Self::Ci => "\u{1F477}",       // construction worker
         Self::Chore => "\u{1F527}",    // wrench
      }
   }

   /// Exact, case-sensitive tag lookup.
   pub fn from_tag(tag: &str) -> Option<Self> {
      Self::ALL.into_iter().find(|t| t.as_str() == tag)
   }

   /// Title prefix without the trailing space: `feat ✨:`.
   pub fn prefix(self) -> String {
      format!("{} {}:", self.as_str(), self.glyph())
   }
}

impl fmt::Display for CommitType {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

// === Style profiles ===

/// Tone preset. Only changes the generation instructions, never the message
/// structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleProfile {
   pub name:         &'static str,
   pub description:  &'static str,
   pub instructions: &'static str,
}

pub const DEFAULT_STYLE: &str = "standard";

pub const STYLE_PROFILES: &[StyleProfile] = &[
   StyleProfile {
      name:         "standard",
      description:  "Professional and direct",
      instructions: "",
   },
   StyleProfile {
      name:         "ironic",
      description:  "A touch of irony and humor",
      instructions: "Add a touch of irony and humor while keeping the professional format.\nLight \
                     puns and playful references are welcome, but the message must stay \
                     understandable.\nExample tone: \"fix: remove bug that was more lost than a \
                     tourist without GPS\"",
   },
   StyleProfile {
      name:         "epic",
      description:  "Epic and dramatic, like a grand saga",
      instructions: "Write the message as if it were an epic conquest or a grand saga.\nUse \
                     references to adventure or fantasy films, but keep the professional \
                     format.\nExample tone: \"feat: forge the mighty user authentication system\"",
   },
   StyleProfile {
      name:         "nerd",
      description:  "Geek culture and tech references",
      instructions: "Use references to geek culture, technology, games, sci-fi and \
                     programming.\nExample tone: \"feat: implement Order 66 in user permissions\"",
   },
   StyleProfile {
      name:         "poetic",
      description:  "Poetic and lyrical, yet clear",
      instructions: "Write with a poetic, lyrical touch while staying clear.\nUse gentle \
                     metaphors and elegant language.\nExample tone: \"feat: let the database \
                     whisper its secrets through new API endpoints\"",
   },
];

/// Look up a style preset by name (case-insensitive).
pub fn find_style(name: &str) -> Option<&'static StyleProfile> {
   STYLE_PROFILES
      .iter()
      .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
}

// === Description formatting ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionMode {
   #[default]
   Bullets,
   Paragraph,
}

impl fmt::Display for DescriptionMode {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Self::Bullets => "bullets",
         Self::Paragraph => "paragraph",
      })
   }
}

// === Commit message ===

/// Normalized message: a tagged title plus an optional description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CommitMessage {
   pub title:       String,
   pub description: String,
}

impl CommitMessage {
   pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
      Self { title: title.into(), description: description.into() }
   }

   /// Split serialized text on the first blank line.
   pub fn parse(text: &str) -> Self {
      let text = text.trim();
      match text.split_once("\n\n") {
         Some((title, description)) => Self::new(title.trim(), description.trim()),
         None => Self::new(text, ""),
      }
   }

   pub fn has_description(&self) -> bool {
      !self.description.trim().is_empty()
   }
}

impl fmt::Display for CommitMessage {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      if self.has_description() {
         write!(f, "{}\n\n{}", self.title, self.description)
      } else {
         f.write_str(&self.title)
      }
   }
}

// === CLI ===

#[derive(Parser, Debug, Default)]
#[command(
   name = "cgit",
   version,
   about = "Generate an emoji-tagged conventional commit message from staged changes"
)]
#[command(group(ArgGroup::new("style_flag").multiple(false)))]
pub struct Args {
   /// Messages with a touch of irony and humor
   #[arg(long, group = "style_flag")]
   pub ironic: bool,

   /// Messages in an epic, dramatic style
   #[arg(long, group = "style_flag")]
   pub epic: bool,

   /// Messages with geek and tech references
   #[arg(long, group = "style_flag")]
   pub nerd: bool,

   /// Messages in a poetic, lyrical style
   #[arg(long, group = "style_flag")]
   pub poetic: bool,

   /// List available styles and exit
   #[arg(long)]
   pub list: bool,

   /// Commit with the generated message without asking
   #[arg(long, short = 'y')]
   pub accept: bool,

   /// Title only, no description body
   #[arg(long = "no-desc")]
   pub no_desc: bool,

   /// Print the message without committing
   #[arg(long)]
   pub dry_run: bool,

   /// Path to config file (default: ~/.config/commit-gen/config.json)
   #[arg(long)]
   pub config: Option<PathBuf>,

   /// Model to use instead of the configured one
   #[arg(long, short = 'm')]
   pub model: Option<String>,

   /// Directory to run git commands in
   #[arg(long, default_value = ".")]
   pub dir: String,
}

impl Args {
   /// Style chosen by flag, if any.
   pub const fn style_flag(&self) -> Option<&'static str> {
      if self.ironic {
         Some("ironic")
      } else if self.epic {
         Some("epic")
      } else if self.nerd {
         Some("nerd")
      } else if self.poetic {
         Some("poetic")
      } else {
         None
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_commit_type_table_is_complete() {
      for t in CommitType::ALL {
         assert_eq!(CommitType::from_tag(t.as_str()), Some(t));
         assert!(!t.glyph().is_empty());
      }
      assert_eq!(CommitType::Feat.prefix(), "feat \u{2728}:");
   }

   #[test]
   fn test_from_tag_is_exact() {
      assert_eq!(CommitType::from_tag("Feat"), None);
      assert_eq!(CommitType::from_tag("feature"), None);
      assert_eq!(CommitType::from_tag("ci"), Some(CommitType::Ci));
   }

   #[test]
   fn test_find_style() {
      assert_eq!(find_style("standard").map(|s| s.instructions), Some(""));
      assert_eq!(find_style("EPIC").map(|s| s.name), Some("epic"));
      assert!(find_style("haiku").is_none());
      assert!(find_style(DEFAULT_STYLE).is_some());
   }

   #[test]
   fn test_message_display_and_parse() {
      let msg = CommitMessage::new("fix \u{1F41B}: handle empty input", "- guarded parser");
      let text = msg.to_string();
      assert_eq!(text, "fix \u{1F41B}: handle empty input\n\n- guarded parser");
      assert_eq!(CommitMessage::parse(&text), msg);
   }

   #[test]
   fn test_message_without_description_round_trips() {
      let msg = CommitMessage::new("docs \u{1F4DA}: update readme", "   ");
      let text = msg.to_string();
      assert_eq!(text, "docs \u{1F4DA}: update readme");
      let reparsed = CommitMessage::parse(&text);
      assert_eq!(reparsed.description, "");
      assert_eq!(reparsed.title, msg.title);
   }

   #[test]
   fn test_style_flags_are_exclusive() {
      let err = Args::try_parse_from(["cgit", "--epic", "--nerd"]);
      assert!(err.is_err());

      let args = Args::try_parse_from(["cgit", "--poetic", "-y"]).unwrap();
      assert_eq!(args.style_flag(), Some("poetic"));
      assert!(args.accept);

      let args = Args::try_parse_from(["cgit"]).unwrap();
      assert_eq!(args.style_flag(), None);
      assert_eq!(args.dir, ".");
   }
}
