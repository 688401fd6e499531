//! Ctrl-C handling.
//!
//! What an interrupt means depends on where the process is: while waiting
//! for the user's decision it is a cancellation, while an editor or `git`
//! child runs the child owns the terminal and receives the signal itself.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{
   error::{CommitGenError, Result},
   style,
};

/// Exit status for an interrupt outside the decision prompt (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
   Idle             = 0,
   AwaitingDecision = 1,
   ChildProcess     = 2,
}

impl Phase {
   const fn from_u8(value: u8) -> Self {
      match value {
         1 => Self::AwaitingDecision,
         2 => Self::ChildProcess,
         _ => Self::Idle,
      }
   }
}

static PHASE: AtomicU8 = AtomicU8::new(Phase::Idle as u8);

pub fn current_phase() -> Phase {
   Phase::from_u8(PHASE.load(Ordering::SeqCst))
}

/// Switch phase, returning the previous one.
pub fn set_phase(phase: Phase) -> Phase {
   Phase::from_u8(PHASE.swap(phase as u8, Ordering::SeqCst))
}

/// Restores the previous phase when dropped.
#[derive(Debug)]
#[must_use = "the phase is restored as soon as the guard is dropped"]
pub struct PhaseGuard {
   previous: Phase,
}

pub fn enter(phase: Phase) -> PhaseGuard {
   PhaseGuard { previous: set_phase(phase) }
}

impl Drop for PhaseGuard {
   fn drop(&mut self) {
      set_phase(self.previous);
   }
}

/// Install the process-wide handler. Call once, from `main`.
pub fn install() -> Result<()> {
   ctrlc::set_handler(|| match current_phase() {
      Phase::AwaitingDecision => {
         println!();
         println!("{}", style::dim("Cancelled."));
         std::process::exit(0);
      },
      // The editor or git got the same signal and reports through its exit
      // status; temp files are removed on the normal return path.
      Phase::ChildProcess => {},
      Phase::Idle => {
         eprintln!();
         style::warn("Interrupted");
         std::process::exit(INTERRUPTED_EXIT_CODE);
      },
   })
   .map_err(|e| {
      CommitGenError::IoError(std::io::Error::other(format!("failed to set Ctrl-C handler: {e}")))
   })
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_phase_round_trips_through_u8() {
      for phase in [Phase::Idle, Phase::AwaitingDecision, Phase::ChildProcess] {
         assert_eq!(Phase::from_u8(phase as u8), phase);
      }
      assert_eq!(Phase::from_u8(42), Phase::Idle);
   }
}
