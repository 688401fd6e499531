/// Diff splitting and budget-based truncation
use crate::tokens::TokenCounter;

const LOCK_FILES: &[&str] = &[
   "Cargo.lock",
   "package-lock.json",
   "yarn.lock",
   "pnpm-lock.yaml",
   "composer.lock",
   "Gemfile.lock",
   "poetry.lock",
   "flake.lock",
   "go.sum",
];

const LOW_PRIORITY_EXTENSIONS: &[&str] =
   &["lock", "sum", "toml", "yaml", "yml", "json", "md", "txt", "svg", "csv"];

#[derive(Debug, Clone)]
pub struct FileDiff {
   pub filename: String,
   pub text:     String,
}

impl FileDiff {
   /// Higher number = kept first.
   pub fn priority(&self) -> i32 {
      if self.text.contains("\nBinary files ") {
         return -100;
      }

      let basename = self.filename.rsplit('/').next().unwrap_or(&self.filename);
      if LOCK_FILES.contains(&basename) {
         return -50;
      }

      let ext = basename.rsplit_once('.').map_or("", |(_, ext)| ext);
      if LOW_PRIORITY_EXTENSIONS.contains(&ext) {
         return 20;
      }

      if self.filename.contains("/test") || basename.contains("_test.") || basename.contains(".test.")
      {
         return 40;
      }

      100
   }
}

/// Split a unified diff into per-file sections.
pub fn split_diff(diff: &str) -> Vec<FileDiff> {
   let mut files: Vec<FileDiff> = Vec::new();

   for line in diff.split_inclusive('\n') {
      if let Some(header) = line.strip_prefix("diff --git ") {
         let filename = header
            .trim_end()
            .rsplit_once(" b/")
            .map_or_else(|| header.trim_end().to_string(), |(_, b)| b.to_string());
         files.push(FileDiff { filename, text: String::new() });
      }

      match files.last_mut() {
         Some(file) => file.text.push_str(line),
         // Preamble before the first header
         None => files.push(FileDiff { filename: String::new(), text: line.to_string() }),
      }
   }

   files
}

/// Cut a line-aligned prefix of `text` that fits in `max_tokens`.
fn truncate_to_budget(text: &str, max_tokens: usize, counter: &TokenCounter) -> String {
   let mut out = String::new();
   let mut used = 0;
   for line in text.split_inclusive('\n') {
      let cost = counter.count(line);
      if used + cost > max_tokens {
         break;
      }
      used += cost;
      out.push_str(line);
   }
   out
}

/// Fit the diff into `max_tokens`, keeping high-priority files whole and
/// noting what was dropped. Files keep their original order in the output.
pub fn truncate_diff(diff: &str, max_tokens: usize, counter: &TokenCounter) -> String {
   if counter.count(diff) <= max_tokens {
      return diff.to_string();
   }

   let files = split_diff(diff);
   let mut order: Vec<usize> = (0..files.len()).collect();
   order.sort_by_key(|&i| std::cmp::Reverse(files[i].priority()));

   // Reserve room for the omission note
   let mut budget = max_tokens.saturating_sub(64);
   let mut kept: Vec<Option<String>> = vec![None; files.len()];
   let mut truncated_one = false;

   for idx in order {
      let cost = counter.count(&files[idx].text);
      if cost <= budget {
         budget -= cost;
         kept[idx] = Some(files[idx].text.clone());
      } else if !truncated_one && budget > 0 {
         let partial = truncate_to_budget(&files[idx].text, budget, counter);
         if !partial.is_empty() {
            budget = budget.saturating_sub(counter.count(&partial));
            kept[idx] = Some(format!("{partial}... (truncated)\n"));
            truncated_one = true;
         }
      }
   }

   let omitted: Vec<&str> = files
      .iter()
      .zip(&kept)
      .filter(|(file, text)| text.is_none() && !file.filename.is_empty())
      .map(|(file, _)| file.filename.as_str())
      .collect();

   let mut out: String = kept.into_iter().flatten().collect();
   if !omitted.is_empty() {
      if !out.ends_with('\n') && !out.is_empty() {
         out.push('\n');
      }
      out.push_str(&format!(
         "... ({} files omitted: {})\n",
         omitted.len(),
         omitted.join(", ")
      ));
   }
   out
}
