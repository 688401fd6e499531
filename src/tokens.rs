//! Token counting for the diff budget.
//!
//! Uses tiktoken when an encoder is available for the model (falling back to
//! `cl100k_base`), otherwise a 4 chars ≈ 1 token estimate.

use std::fmt;

use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model};

pub struct TokenCounter {
   model:    String,
   tiktoken: Option<CoreBPE>,
}

impl fmt::Debug for TokenCounter {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("TokenCounter")
         .field("model", &self.model)
         .field("has_tiktoken", &self.tiktoken.is_some())
         .finish_non_exhaustive()
   }
}

impl TokenCounter {
   pub fn new(model: &str) -> Self {
      Self {
         model:    model.to_string(),
         tiktoken: get_bpe_from_model(model).or_else(|_| cl100k_base()).ok(),
      }
   }

   /// Character estimate only, no encoder.
   pub fn estimate_only() -> Self {
      Self { model: String::new(), tiktoken: None }
   }

   pub fn count(&self, text: &str) -> usize {
      if let Some(ref encoder) = self.tiktoken {
         encoder.encode_with_special_tokens(text).len()
      } else {
         text.len().div_ceil(4)
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_estimate_rounds_up() {
      let counter = TokenCounter::estimate_only();
      assert_eq!(counter.count(""), 0);
      assert_eq!(counter.count("abc"), 1);
      assert_eq!(counter.count("abcdefgh"), 2);
      assert_eq!(counter.count("abcdefghi"), 3);
   }
}
