//! End-to-end pipeline: staged diff → prompt → generation → normalization →
//! interaction.

use crate::{
   api::{GenerationRequest, Generator},
   config::AppConfig,
   diff::truncate_diff,
   error::{CommitGenError, Result},
   git::Repository,
   interaction::{Console, MessageEditor, SessionOutcome, SessionState, run_session},
   normalization::normalize,
   style::{self, icons},
   templates::{PromptContext, render_commit_prompt},
   tokens::TokenCounter,
   types::{Args, CommitMessage, DEFAULT_STYLE, STYLE_PROFILES, StyleProfile, find_style},
   validation::validate_message,
};

/// Correction fed back when the output had no tagged line at all.
const MISSING_TYPE_CORRECTION: &str =
   "no line started with one of the allowed commit types followed by a colon";

/// Flag first, then the configured default.
pub fn resolve_style(args: &Args, config: &AppConfig) -> Result<&'static StyleProfile> {
   let name = args.style_flag().unwrap_or(config.style.as_str());
   find_style(name).ok_or_else(|| {
      CommitGenError::InvalidConfiguration(format!("unknown style '{name}' (see --list)"))
   })
}

/// Table printed by `--list`.
pub fn list_styles() -> String {
   let width = STYLE_PROFILES
      .iter()
      .map(|s| s.name.len())
      .max()
      .unwrap_or(0);

   let mut out = String::from("Available styles:\n");
   for profile in STYLE_PROFILES {
      let default_marker = if profile.name == DEFAULT_STYLE { " (default)" } else { "" };
      out.push_str(&format!(
         "  {:<width$}  {}{default_marker}\n",
         profile.name, profile.description
      ));
   }
   out
}

/// Result of the generation loop.
#[derive(Debug, Clone)]
pub struct GeneratedMessage {
   pub message:   CommitMessage,
   pub attempts:  u32,
   /// Last limit the message still breaks, if regeneration did not fix it
   pub violation: Option<String>,
}

/// Inputs that stay fixed across regeneration attempts.
#[derive(Debug)]
pub struct GenerationInput<'a> {
   pub config:              &'a AppConfig,
   pub style:               &'a StyleProfile,
   pub description_enabled: bool,
   pub recent_commits:      &'a str,
   pub diff:                &'a str,
}

/// Generate until the normalized message passes validation or the attempt
/// budget runs out. Every retry tells the model why the previous output was
/// rejected.
pub fn generate_message(
   input: &GenerationInput<'_>,
   generator: &impl Generator,
) -> Result<GeneratedMessage> {
   let config = input.config;
   let max_attempts = config.max_generation_attempts.max(1);

   let mut correction: Option<String> = None;
   let mut best: Option<(CommitMessage, String)> = None;

   for attempt in 1..=max_attempts {
      let prompt = render_commit_prompt(&PromptContext {
         format:              &config.format,
         style:               input.style,
         description_enabled: input.description_enabled,
         correction:          correction.as_deref(),
      })?;

      if style::verbose() {
         eprintln!("{}\n{prompt}", style::dim("--- system prompt ---"));
      }

      let request = GenerationRequest {
         system_prompt:  &prompt,
         recent_commits: input.recent_commits,
         diff:           input.diff,
      };

      let spinner_label = if attempt == 1 {
         format!("{} Generating commit message...", icons::THINKING)
      } else {
         format!("{} Regenerating (attempt {attempt}/{max_attempts})...", icons::THINKING)
      };
      let raw = style::with_spinner_result(&spinner_label, || generator.generate(&request))?;

      if style::verbose() {
         eprintln!("{}\n{raw}", style::dim("--- raw model output ---"));
      }

      let message = match normalize(&raw, &config.format, input.description_enabled) {
         Ok(message) => message,
         Err(CommitGenError::NoRecognizedCommitType) => {
            style::warn("Model output has no commit type line");
            correction = Some(MISSING_TYPE_CORRECTION.to_string());
            continue;
         },
         Err(e) => return Err(e),
      };

      match validate_message(&message, &config.format) {
         Ok(()) => return Ok(GeneratedMessage { message, attempts: attempt, violation: None }),
         Err(CommitGenError::FormatViolation(reason)) => {
            style::warn(&format!("Generated message rejected: {reason}"));
            correction = Some(reason.clone());
            best = Some((message, reason));
         },
         Err(e) => return Err(e),
      }
   }

   match best {
      Some((message, reason)) => {
         Ok(GeneratedMessage { message, attempts: max_attempts, violation: Some(reason) })
      },
      // Every attempt came back without a tagged line
      None => Err(CommitGenError::NoRecognizedCommitType),
   }
}

/// Run one invocation against the given collaborators.
pub fn run<R, G, C, E>(
   args: &Args,
   config: &AppConfig,
   repo: &R,
   generator: &G,
   console: &mut C,
   editor: &E,
) -> Result<SessionOutcome>
where
   R: Repository,
   G: Generator,
   C: Console,
   E: MessageEditor,
{
   let style_profile = resolve_style(args, config)?;

   // Nothing staged means nothing to describe; no generation call is made.
   let diff = repo.staged_diff()?;

   let recent_commits = match repo.recent_commits(config.recent_commits) {
      Ok(log) => log,
      Err(e) => {
         style::warn(&format!("Could not read recent commits: {e}"));
         String::new()
      },
   };

   let counter = TokenCounter::new(&config.provider.model);
   let diff_tokens = counter.count(&diff);
   let diff = if diff_tokens > config.max_diff_tokens {
      style::warn(&format!(
         "Diff is ~{diff_tokens} tokens, truncating to {}",
         config.max_diff_tokens
      ));
      truncate_diff(&diff, config.max_diff_tokens, &counter)
   } else {
      diff
   };

   println!(
      "{} Style: {} {}",
      icons::PALETTE,
      style::bold(style_profile.name),
      style::dim(&format!("({})", style_profile.description))
   );

   let generated = generate_message(
      &GenerationInput {
         config,
         style: style_profile,
         description_enabled: config.description_enabled && !args.no_desc,
         recent_commits: &recent_commits,
         diff: &diff,
      },
      generator,
   )?;

   if let Some(ref reason) = generated.violation {
      if args.accept {
         return Err(CommitGenError::GenerationFailure(format!(
            "message still breaks format limits after {} attempts: {reason}",
            generated.attempts
         )));
      }
      style::warn(&format!(
         "Message still breaks format limits after {} attempts ({reason}); edit it or decide \
          yourself",
         generated.attempts
      ));
   }

   if args.dry_run {
      let text = generated.message.to_string();
      console.show_message(&text);
      return Ok(SessionOutcome::Previewed(text));
   }

   let state = SessionState::new(generated.message, generated.attempts);
   let outcome = run_session(state, args.accept, console, editor, repo)?;

   if matches!(outcome, SessionOutcome::Committed(_)) {
      println!("{} {}", style::success(icons::SUCCESS), style::success("Committed"));
   }
   Ok(outcome)
}
