//! Confirm / edit / commit loop.
//!
//! ```text
//! AWAITING_DECISION ──y──▶ COMMITTING ──▶ DONE
//!        │  ▲
//!        e  └── editor returns
//!        ▼
//!     EDITING
//!        │
//! AWAITING_DECISION ──n / EOF──▶ CANCELLED ──▶ DONE
//! ```
//!
//! Message text reaches the editor and `git commit -F` through a temporary
//! file that is removed before the session returns, whatever the outcome.

use std::{
   fmt,
   io::{self, BufRead, Write},
   path::Path,
};

use tempfile::TempPath;

use crate::{
   error::{CommitGenError, Result},
   git::Repository,
   interrupt::{self, Phase},
   normalization::parse_type_prefix,
   style,
   types::CommitMessage,
};

const DECISION_PROMPT: &str = "Commit with this message? [Y/n/e] ";
const DECISION_HINT: &str = "Please answer y (commit), n (cancel) or e (edit).";

/// Terminal (or scripted) user I/O.
pub trait Console {
   fn show_message(&mut self, message: &str);
   fn notice(&mut self, text: &str);
   /// One line of input. `Ok(None)` on end of input.
   fn read_decision(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Edits the message file in place.
pub trait MessageEditor {
   fn edit(&self, path: &Path) -> Result<()>;
}

/// Records a commit whose message is stored in a file.
pub trait CommitSink {
   fn commit_from_file(&self, path: &Path) -> Result<()>;
}

impl<R: Repository> CommitSink for R {
   fn commit_from_file(&self, path: &Path) -> Result<()> {
      self.commit_with_file(path)
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
   Commit,
   Edit,
   Cancel,
   Invalid,
}

impl Decision {
   pub fn parse(input: &str) -> Self {
      match input.trim().to_lowercase().as_str() {
         "" | "y" | "yes" => Self::Commit,
         "e" => Self::Edit,
         "n" | "no" => Self::Cancel,
         _ => Self::Invalid,
      }
   }
}

/// The message currently on offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
   Generated(CommitMessage),
   /// Human-edited text, committed exactly as written.
   Edited(String),
}

impl fmt::Display for Draft {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::Generated(msg) => write!(f, "{msg}"),
         Self::Edited(text) => f.write_str(text),
      }
   }
}

#[derive(Debug, Clone)]
pub struct SessionState {
   pub current_message: Draft,
   /// Generations it took to produce the first draft
   pub attempt_count:   u32,
   pub terminal:        bool,
}

impl SessionState {
   pub fn new(message: CommitMessage, attempt_count: u32) -> Self {
      Self { current_message: Draft::Generated(message), attempt_count, terminal: false }
   }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
   Committed(String),
   Cancelled,
   /// Shown only (`--dry-run`)
   Previewed(String),
}

/// Drive the decision loop until the message is committed or the user backs
/// out. With `auto_accept` the first decision is taken as "commit" without
/// asking.
pub fn run_session(
   mut state: SessionState,
   auto_accept: bool,
   console: &mut impl Console,
   editor: &impl MessageEditor,
   sink: &impl CommitSink,
) -> Result<SessionOutcome> {
   if state.attempt_count > 1 {
      console.notice(&format!("Generated after {} attempts", state.attempt_count));
   }

   if auto_accept {
      console.show_message(&state.current_message.to_string());
      return commit_draft(&mut state, console, sink);
   }

   let mut outcome = SessionOutcome::Cancelled;
   while !state.terminal {
      console.show_message(&state.current_message.to_string());

      let input = {
         let _phase = interrupt::enter(Phase::AwaitingDecision);
         console.read_decision(DECISION_PROMPT)?
      };

      // End of input counts as "no"
      match input.as_deref().map_or(Decision::Cancel, Decision::parse) {
         Decision::Commit => outcome = commit_draft(&mut state, console, sink)?,
         Decision::Edit => {
            let edited = edit_draft(&state.current_message, console, editor)?;
            state.current_message = Draft::Edited(edited);
         },
         Decision::Cancel => {
            console.notice("Cancelled.");
            state.terminal = true;
         },
         Decision::Invalid => console.notice(DECISION_HINT),
      }
   }
   Ok(outcome)
}

/// Write `text` to a fresh temporary file and close the handle, so the
/// editor and git see the complete contents.
fn write_temp(text: &str) -> Result<TempPath> {
   let mut file = tempfile::Builder::new()
      .prefix("COMMIT_EDITMSG-")
      .suffix(".txt")
      .tempfile()?;
   file.write_all(text.as_bytes())?;
   file.flush()?;
   Ok(file.into_temp_path())
}

/// Remove the temp file, reporting (not failing on) a cleanup error.
fn discard(path: TempPath, console: &mut impl Console) {
   let display = path.display().to_string();
   if let Err(e) = path.close() {
      console.notice(&format!("Could not remove temporary file {display}: {e}"));
   }
}

fn edit_draft(
   draft: &Draft,
   console: &mut impl Console,
   editor: &impl MessageEditor,
) -> Result<String> {
   let path = write_temp(&draft.to_string())
      .map_err(|e| CommitGenError::EditorFailure(format!("could not create message file: {e}")))?;

   let edited = {
      let _phase = interrupt::enter(Phase::ChildProcess);
      editor.edit(&path)
   }
   .and_then(|()| {
      std::fs::read_to_string(&path).map_err(|e| {
         CommitGenError::EditorFailure(format!("could not read edited message: {e}"))
      })
   });

   discard(path, console);

   let edited = edited.map_err(|e| match e {
      CommitGenError::EditorFailure(_) => e,
      other => CommitGenError::EditorFailure(other.to_string()),
   })?;

   if edited.trim().is_empty() {
      return Err(CommitGenError::EditorFailure("edited message is empty".to_string()));
   }
   if parse_type_prefix(&CommitMessage::parse(&edited).title).is_none() {
      console.notice("Edited title has no commit type tag; it will be committed as written.");
   }
   Ok(edited)
}

fn commit_draft(
   state: &mut SessionState,
   console: &mut impl Console,
   sink: &impl CommitSink,
) -> Result<SessionOutcome> {
   state.terminal = true;
   let text = state.current_message.to_string();

   let path = write_temp(&text)
      .map_err(|e| CommitGenError::CommitFailure(format!("could not write message file: {e}")))?;

   let result = {
      let _phase = interrupt::enter(Phase::ChildProcess);
      sink.commit_from_file(&path)
   };

   discard(path, console);

   result.map_err(|e| match e {
      CommitGenError::CommitFailure(_) => e,
      other => CommitGenError::CommitFailure(other.to_string()),
   })?;

   Ok(SessionOutcome::Committed(text))
}

/// Interactive console on stdin/stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
   fn show_message(&mut self, message: &str) {
      println!();
      println!("{}", style::boxed_message("Commit message", message, style::term_width()));
   }

   fn notice(&mut self, text: &str) {
      println!("{}", style::dim(text));
   }

   fn read_decision(&mut self, prompt: &str) -> Result<Option<String>> {
      print!("{}", style::bold(prompt));
      io::stdout().flush()?;

      let mut line = String::new();
      match io::stdin().lock().read_line(&mut line)? {
         0 => {
            println!();
            Ok(None)
         },
         _ => Ok(Some(line)),
      }
   }
}
