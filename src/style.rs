//! Terminal styling for status lines, warnings and the message preview.
//!
//! Respects `NO_COLOR` environment variable and terminal capabilities.

use std::{
   io::{self, Write},
   sync::{
      OnceLock,
      atomic::{AtomicBool, Ordering},
   },
   thread,
   time::Duration,
};

use owo_colors::OwoColorize;

use crate::normalization::{display_width, wrap_words};

/// Whether color output is enabled (cached on first call).
static COLOR_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if colors should be used.
pub fn colors_enabled() -> bool {
   *COLOR_ENABLED.get_or_init(|| {
      // NO_COLOR takes precedence (https://no-color.org/)
      if std::env::var("NO_COLOR").is_ok() {
         return false;
      }
      supports_color::on(supports_color::Stream::Stdout).is_some_and(|level| level.has_basic)
   })
}

/// Whether `COMMIT_GEN_VERBOSE` asks for prompt/response dumps.
pub fn verbose() -> bool {
   std::env::var("COMMIT_GEN_VERBOSE").is_ok()
}

// === Color Palette ===

/// Apply `paint` only when colors are on.
fn paint(s: &str, apply: impl FnOnce(&str) -> String) -> String {
   if colors_enabled() { apply(s) } else { s.to_string() }
}

/// Committed, accepted (green + bold).
pub fn success(s: &str) -> String {
   paint(s, |s| s.green().bold().to_string())
}

/// Limit violations and other non-fatal problems (yellow).
pub fn warning(s: &str) -> String {
   paint(s, |s| s.yellow().to_string())
}

/// Fatal errors (red + bold).
pub fn error(s: &str) -> String {
   paint(s, |s| s.red().bold().to_string())
}

pub fn dim(s: &str) -> String {
   paint(s, |s| s.dimmed().to_string())
}

pub fn bold(s: &str) -> String {
   paint(s, |s| s.bold().to_string())
}

/// Print warning message, clearing any active spinner line first.
pub fn warn(msg: &str) {
   print!("\r\x1b[K");
   io::stdout().flush().ok();
   eprintln!("{} {}", warning(icons::WARNING), warning(msg));
}

/// Print an info message that clears any spinner line first.
pub fn print_info(msg: &str) {
   use std::io::IsTerminal;
   if std::io::stderr().is_terminal() && colors_enabled() {
      eprintln!("\r\x1b[K{} {msg}", icons::INFO.cyan());
   } else {
      eprintln!("{} {msg}", icons::INFO);
   }
}

/// Print a failure line to stderr.
pub fn print_error(msg: &str) {
   eprintln!("{} {}", error(icons::ERROR), error(msg));
}

/// Get terminal width, capped at 100 columns.
pub fn term_width() -> usize {
   terminal_size::terminal_size()
      .map_or(80, |(w, _)| w.0 as usize)
      .min(100)
}

// === Unicode Box Drawing ===

pub mod box_chars {
   pub const TOP_LEFT: char = '\u{256D}';
   pub const TOP_RIGHT: char = '\u{256E}';
   pub const BOTTOM_LEFT: char = '\u{2570}';
   pub const BOTTOM_RIGHT: char = '\u{256F}';
   pub const HORIZONTAL: char = '\u{2500}';
   pub const VERTICAL: char = '\u{2502}';
}

/// Render a box-framed message with word wrapping. Padding is measured in
/// display columns, so wide glyphs keep the right border aligned.
pub fn boxed_message(title: &str, content: &str, width: usize) -> String {
   use box_chars::*;

   let mut out = String::new();
   let inner_width = width.saturating_sub(4); // "│ " and " │"

   let title_len = display_width(title);
   let border_width = width.saturating_sub(2);
   let padding = border_width.saturating_sub(title_len + 2);
   let left_pad = padding / 2;
   let right_pad = padding - left_pad;

   out.push(TOP_LEFT);
   out.push_str(&HORIZONTAL.to_string().repeat(left_pad));
   out.push(' ');
   out.push_str(&bold(title));
   out.push(' ');
   out.push_str(&HORIZONTAL.to_string().repeat(right_pad));
   out.push(TOP_RIGHT);
   out.push('\n');

   for line in content.lines() {
      let wrapped = if line.trim().is_empty() {
         vec![String::new()]
      } else {
         wrap_words(line, inner_width)
      };
      for wrapped_line in wrapped {
         out.push(VERTICAL);
         out.push(' ');
         let line_width = display_width(&wrapped_line);
         out.push_str(&wrapped_line);
         out.push_str(&" ".repeat(inner_width.saturating_sub(line_width)));
         out.push(' ');
         out.push(VERTICAL);
         out.push('\n');
      }
   }

   out.push(BOTTOM_LEFT);
   out.push_str(&HORIZONTAL.to_string().repeat(border_width));
   out.push(BOTTOM_RIGHT);

   out
}

// === Status Icons ===

pub mod icons {
   pub const SUCCESS: &str = "\u{2713}";
   pub const WARNING: &str = "\u{26A0}";
   pub const ERROR: &str = "\u{2717}";
   pub const INFO: &str = "\u{2139}";
   pub const THINKING: &str = "\u{1F4AD}";
   pub const PALETTE: &str = "\u{1F3A8}";
}

// === Spinner ===

const SPINNER_FRAMES: &[char] = &[
   '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
   '\u{2807}', '\u{280F}',
];

/// Run `f` while a spinner animates next to `message`, then replace the
/// spinner with a check or cross. Without colors it prints the message once.
pub fn with_spinner_result<F, T, E>(message: &str, f: F) -> Result<T, E>
where
   F: FnOnce() -> Result<T, E>,
{
   if !colors_enabled() {
      println!("{message}");
      return f();
   }

   let done = AtomicBool::new(false);
   let result = thread::scope(|scope| {
      scope.spawn(|| {
         for frame in SPINNER_FRAMES.iter().cycle() {
            if done.load(Ordering::Relaxed) {
               break;
            }
            print!("\r{} {message}", frame.cyan());
            io::stdout().flush().ok();
            thread::sleep(Duration::from_millis(80));
         }
      });

      let result = f();
      done.store(true, Ordering::Relaxed);
      result
   });

   let icon = if result.is_ok() {
      icons::SUCCESS.green().to_string()
   } else {
      icons::ERROR.red().to_string()
   };
   println!("\r\x1b[K{icon} {message}");
   result
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_boxed_message_frames_every_line() {
      let boxed = boxed_message("Suggested message", "feat: add login\n\n- added token", 40);
      let lines: Vec<&str> = boxed.lines().collect();
      assert_eq!(lines.len(), 5);
      assert!(lines[0].starts_with(box_chars::TOP_LEFT));
      assert!(lines[4].starts_with(box_chars::BOTTOM_LEFT));
      for line in &lines[1..4] {
         assert!(line.starts_with(box_chars::VERTICAL));
         assert!(line.ends_with(box_chars::VERTICAL));
      }
   }

   #[test]
   fn test_boxed_message_wraps_long_lines() {
      let content = "word ".repeat(30);
      let boxed = boxed_message("t", content.trim(), 30);
      assert!(boxed.lines().count() > 3);
   }

   #[test]
   fn test_boxed_message_aligns_wide_glyphs() {
      let boxed = boxed_message("t", "feat \u{2728}: add login\n\n- \u{6F22}\u{5B57}", 40);
      // Title row may carry color codes
      for line in boxed.lines().skip(1) {
         assert_eq!(display_width(line), 40, "{line}");
      }
   }
}
