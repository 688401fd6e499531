use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
   error::{CommitGenError, Result},
   style,
   types::{DEFAULT_STYLE, DescriptionMode, find_style},
};

/// Resolved settings that shape the description and bound its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
   pub description_mode:        DescriptionMode,
   pub max_title_length:        usize,
   pub max_bullets:             usize,
   pub max_bullet_length:       usize,
   pub max_paragraph_length:    usize,
   pub commit_message_language: String,
   pub description_language:    String,
}

impl Default for FormatConfig {
   fn default() -> Self {
      Self {
         description_mode:        DescriptionMode::Bullets,
         max_title_length:        50,
         max_bullets:             3,
         max_bullet_length:       100,
         max_paragraph_length:    400,
         commit_message_language: "English".to_string(),
         description_language:    "Brazilian Portuguese".to_string(),
      }
   }
}

impl FormatConfig {
   pub fn validate(&self) -> Result<()> {
      let positive = [
         ("commit_message.max_length", self.max_title_length),
         ("description.max_bullet_length", self.max_bullet_length),
         ("description.max_paragraph_length", self.max_paragraph_length),
      ];
      for (key, value) in positive {
         if value == 0 {
            return Err(CommitGenError::InvalidConfiguration(format!(
               "{key} must be greater than zero"
            )));
         }
      }
      Ok(())
   }
}

/// OpenAI-compatible endpoint and failover chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
   pub api_base_url: String,

   /// Optional API key (overridden by `COMMIT_GEN_API_KEY`)
   pub api_key: Option<String>,

   /// Primary model
   pub model: String,

   /// Tried in order when the primary model fails
   pub fallback_models: Vec<String>,

   pub temperature:          f32,
   pub max_tokens:           u32,
   pub request_timeout_secs: u64,
   pub connect_timeout_secs: u64,
   pub max_retries:          u32,
   pub initial_backoff_ms:   u64,
}

impl Default for ProviderConfig {
   fn default() -> Self {
      Self {
         api_base_url:         "http://localhost:4000".to_string(),
         api_key:              None,
         model:                "claude-3.5-sonnet".to_string(),
         fallback_models:      vec!["gpt-4o".to_string()],
         temperature:          0.3,
         max_tokens:           600,
         request_timeout_secs: 120,
         connect_timeout_secs: 30,
         max_retries:          3,
         initial_backoff_ms:   1000,
      }
   }
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
   pub format:                  FormatConfig,
   pub description_enabled:     bool,
   /// Default style profile when no style flag is given
   pub style:                   String,
   pub editor:                  Option<String>,
   pub recent_commits:          usize,
   pub max_generation_attempts: u32,
   pub max_diff_tokens:         usize,
   pub provider:                ProviderConfig,
   /// Top-level keys this version does not know about
   pub extensions:              Map<String, Value>,
   /// The merged document as read, unknown nested keys included
   pub document:                Value,
   /// File the user overrides came from
   pub source:                  Option<PathBuf>,
}

impl Default for AppConfig {
   fn default() -> Self {
      // The built-in document always resolves.
      Self::from_value(default_document(), None).unwrap_or_else(|_| Self {
         format:                  FormatConfig::default(),
         description_enabled:     true,
         style:                   DEFAULT_STYLE.to_string(),
         editor:                  None,
         recent_commits:          3,
         max_generation_attempts: 2,
         max_diff_tokens:         12_000,
         provider:                ProviderConfig::default(),
         extensions:              Map::new(),
         document:                default_document(),
         source:                  None,
      })
   }
}

// === File schema ===

#[derive(Debug, Deserialize)]
struct CommitMessageSection {
   max_length: usize,
   language:   String,
}

#[derive(Debug, Deserialize)]
struct DescriptionSection {
   enabled:              bool,
   format:               DescriptionMode,
   max_bullets:          usize,
   max_bullet_length:    usize,
   max_paragraph_length: usize,
   language:             String,
}

#[derive(Debug, Deserialize)]
struct HistorySection {
   recent_commits: usize,
}

#[derive(Debug, Deserialize)]
struct GenerationSection {
   max_attempts:    u32,
   max_diff_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
   commit_message: CommitMessageSection,
   description:    DescriptionSection,
   style:          String,
   editor:         Option<String>,
   history:        HistorySection,
   generation:     GenerationSection,
   provider:       ProviderConfig,
   #[serde(flatten)]
   extensions:     Map<String, Value>,
}

/// Built-in defaults as a JSON document (the base every user file is merged
/// onto).
pub fn default_document() -> Value {
   let provider = ProviderConfig::default();
   let format = FormatConfig::default();
   json!({
      "commit_message": {
         "max_length": format.max_title_length,
         "language": format.commit_message_language,
      },
      "description": {
         "enabled": true,
         "format": format.description_mode,
         "max_bullets": format.max_bullets,
         "max_bullet_length": format.max_bullet_length,
         "max_paragraph_length": format.max_paragraph_length,
         "language": format.description_language,
      },
      "style": DEFAULT_STYLE,
      "editor": null,
      "history": { "recent_commits": 3 },
      "generation": { "max_attempts": 2, "max_diff_tokens": 12_000 },
      "provider": {
         "api_base_url": provider.api_base_url,
         "api_key": null,
         "model": provider.model,
         "fallback_models": provider.fallback_models,
         "temperature": provider.temperature,
         "max_tokens": provider.max_tokens,
         "request_timeout_secs": provider.request_timeout_secs,
         "connect_timeout_secs": provider.connect_timeout_secs,
         "max_retries": provider.max_retries,
         "initial_backoff_ms": provider.initial_backoff_ms,
      },
   })
}

/// Recursive key-wise override: objects merge, every other overlay value
/// replaces the base value at that path.
pub fn merge_values(base: &mut Value, overlay: Value) {
   match (base, overlay) {
      (Value::Object(base_map), Value::Object(overlay_map)) => {
         for (key, value) in overlay_map {
            match base_map.get_mut(&key) {
               Some(existing) => merge_values(existing, value),
               None => {
                  base_map.insert(key, value);
               },
            }
         }
      },
      (slot, value) => *slot = value,
   }
}

impl AppConfig {
   /// Resolve from a merged document. Shape errors here are fatal.
   pub fn from_value(document: Value, source: Option<PathBuf>) -> Result<Self> {
      let file: ConfigFile = serde_json::from_value(document.clone())
         .map_err(|e| CommitGenError::InvalidConfiguration(e.to_string()))?;

      let format = FormatConfig {
         description_mode:        file.description.format,
         max_title_length:        file.commit_message.max_length,
         max_bullets:             file.description.max_bullets,
         max_bullet_length:       file.description.max_bullet_length,
         max_paragraph_length:    file.description.max_paragraph_length,
         commit_message_language: file.commit_message.language,
         description_language:    file.description.language,
      };
      format.validate()?;

      if find_style(&file.style).is_none() {
         return Err(CommitGenError::InvalidConfiguration(format!(
            "unknown style '{}' (see --list)",
            file.style
         )));
      }
      if file.generation.max_attempts == 0 {
         return Err(CommitGenError::InvalidConfiguration(
            "generation.max_attempts must be at least 1".to_string(),
         ));
      }

      Ok(Self {
         format,
         description_enabled: file.description.enabled,
         style: file.style,
         editor: file.editor.filter(|e| !e.trim().is_empty()),
         recent_commits: file.history.recent_commits,
         max_generation_attempts: file.generation.max_attempts,
         max_diff_tokens: file.generation.max_diff_tokens,
         provider: file.provider,
         extensions: file.extensions,
         document,
         source,
      })
   }

   /// Look up any merged value by JSON pointer, e.g. `/description/emoji`.
   pub fn raw(&self, pointer: &str) -> Option<&Value> {
      self.document.pointer(pointer)
   }

   /// Load defaults merged with the first override file found on the search
   /// path, then apply environment overrides.
   ///
   /// A file that cannot be read or parsed is reported and ignored; a file
   /// that parses but holds invalid values is an error.
   pub fn load(explicit: Option<&Path>) -> Result<Self> {
      let mut document = default_document();
      let mut source = None;

      if let Some(path) = Self::search_path(explicit)
         .into_iter()
         .find(|p| p.is_file())
      {
         match read_document(&path) {
            Ok(overlay) => {
               merge_values(&mut document, overlay);
               source = Some(path);
            },
            Err(reason) => {
               style::warn(&format!(
                  "Ignoring config {}: {reason}; using defaults",
                  path.display()
               ));
            },
         }
      } else if let Some(path) = explicit {
         style::warn(&format!("Config file {} not found; using defaults", path.display()));
      }

      let mut config = Self::from_value(document, source)?;
      config.apply_env_overrides();
      Ok(config)
   }

   /// Candidate override files, highest priority first.
   pub fn search_path(explicit: Option<&Path>) -> Vec<PathBuf> {
      let mut paths = Vec::new();
      if let Some(path) = explicit {
         paths.push(path.to_path_buf());
      }
      if let Ok(custom) = std::env::var("COMMIT_GEN_CONFIG") {
         paths.push(PathBuf::from(custom));
      }
      if let Some(dir) = config_dir() {
         paths.push(dir.join("config.json"));
         paths.push(dir.join("config.toml"));
      }
      paths
   }

   fn apply_env_overrides(&mut self) {
      if let Ok(api_url) = std::env::var("COMMIT_GEN_API_URL") {
         self.provider.api_base_url = api_url;
      }
      if let Ok(api_key) = std::env::var("COMMIT_GEN_API_KEY") {
         self.provider.api_key = Some(api_key);
      }
      if let Ok(model) = std::env::var("COMMIT_GEN_MODEL") {
         self.provider.model = model;
      }
   }
}

/// `~/.config/commit-gen`, trying HOME then USERPROFILE.
pub fn config_dir() -> Option<PathBuf> {
   std::env::var("HOME")
      .or_else(|_| std::env::var("USERPROFILE"))
      .ok()
      .map(|home| PathBuf::from(home).join(".config").join("commit-gen"))
}

/// Read one override file into the JSON value model. TOML files are accepted
/// by extension.
fn read_document(path: &Path) -> std::result::Result<Value, String> {
   let contents =
      std::fs::read_to_string(path).map_err(|e| format!("failed to read file: {e}"))?;

   let value: Value = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
      toml::from_str(&contents).map_err(|e| format!("malformed TOML: {e}"))?
   } else {
      serde_json::from_str(&contents).map_err(|e| format!("malformed JSON: {e}"))?
   };

   if value.is_object() {
      Ok(value)
   } else {
      Err("top level must be an object".to_string())
   }
}

#[cfg(test)]
mod tests {
   use std::io::Write;

   use super::*;

   fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
      let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
      file.write_all(contents.as_bytes()).unwrap();
      file
   }

   #[test]
   fn test_defaults_resolve() {
      let config = AppConfig::default();
      assert_eq!(config.format, FormatConfig::default());
      assert!(config.description_enabled);
      assert_eq!(config.style, "standard");
      assert_eq!(config.recent_commits, 3);
      assert!(config.extensions.is_empty());
   }

   #[test]
   fn test_merge_overrides_only_leaf() {
      let mut doc = default_document();
      merge_values(&mut doc, json!({ "description": { "format": "paragraph" } }));
      let config = AppConfig::from_value(doc, None).unwrap();

      assert_eq!(config.format.description_mode, DescriptionMode::Paragraph);
      assert_eq!(config.format.max_title_length, 50);
      assert_eq!(config.format.max_bullets, 3);
      assert_eq!(config.format.description_language, "Brazilian Portuguese");
      assert_eq!(config.provider.model, "claude-3.5-sonnet");
   }

   #[test]
   fn test_merge_replaces_arrays_and_scalars() {
      let mut base = json!({ "a": [1, 2], "b": { "c": 1, "d": 2 } });
      merge_values(&mut base, json!({ "a": [3], "b": { "d": 5 } }));
      assert_eq!(base, json!({ "a": [3], "b": { "c": 1, "d": 5 } }));
   }

   #[test]
   fn test_unknown_keys_are_kept() {
      let mut doc = default_document();
      merge_values(&mut doc, json!({ "telemetry": { "enabled": false } }));
      let config = AppConfig::from_value(doc, None).unwrap();
      assert_eq!(config.extensions.get("telemetry"), Some(&json!({ "enabled": false })));
   }

   #[test]
   fn test_nested_unknown_keys_are_kept() {
      let mut doc = default_document();
      merge_values(&mut doc, json!({ "description": { "foo": "bar" }, "provider": { "org": 7 } }));
      let config = AppConfig::from_value(doc, None).unwrap();
      assert_eq!(config.raw("/description/foo"), Some(&json!("bar")));
      assert_eq!(config.raw("/provider/org"), Some(&json!(7)));
      assert_eq!(config.raw("/description/max_bullets"), Some(&json!(3)));
      assert!(config.extensions.is_empty());
   }

   #[test]
   fn test_unknown_description_format_is_fatal() {
      let mut doc = default_document();
      merge_values(&mut doc, json!({ "description": { "format": "prose" } }));
      let err = AppConfig::from_value(doc, None).unwrap_err();
      assert!(matches!(err, CommitGenError::InvalidConfiguration(_)));
   }

   #[test]
   fn test_zero_limits_are_fatal() {
      let mut doc = default_document();
      merge_values(&mut doc, json!({ "commit_message": { "max_length": 0 } }));
      assert!(matches!(
         AppConfig::from_value(doc, None),
         Err(CommitGenError::InvalidConfiguration(_))
      ));
   }

   #[test]
   fn test_unknown_style_is_fatal() {
      let mut doc = default_document();
      merge_values(&mut doc, json!({ "style": "haiku" }));
      assert!(AppConfig::from_value(doc, None).is_err());
   }

   #[test]
   fn test_load_explicit_json_file() {
      let file = write_temp(".json", r#"{ "description": { "max_bullets": 5 }, "editor": "nano" }"#);
      let config = AppConfig::load(Some(file.path())).unwrap();
      assert_eq!(config.format.max_bullets, 5);
      assert_eq!(config.format.max_title_length, 50);
      assert_eq!(config.editor.as_deref(), Some("nano"));
      assert_eq!(config.source.as_deref(), Some(file.path()));
   }

   #[test]
   fn test_load_explicit_toml_file() {
      let file = write_temp(".toml", "[description]\nformat = \"paragraph\"\n");
      let config = AppConfig::load(Some(file.path())).unwrap();
      assert_eq!(config.format.description_mode, DescriptionMode::Paragraph);
   }

   #[test]
   fn test_malformed_file_falls_back_to_defaults() {
      let file = write_temp(".json", "{ not json");
      let config = AppConfig::load(Some(file.path())).unwrap();
      assert_eq!(config.format, FormatConfig::default());
      assert!(config.source.is_none());
   }

   #[test]
   fn test_non_object_file_falls_back_to_defaults() {
      let file = write_temp(".json", "[1, 2, 3]");
      let config = AppConfig::load(Some(file.path())).unwrap();
      assert!(config.source.is_none());
   }

   #[test]
   fn test_explicit_path_comes_first() {
      let explicit = PathBuf::from("/tmp/explicit.json");
      let paths = AppConfig::search_path(Some(&explicit));
      assert_eq!(paths.first(), Some(&explicit));
   }
}
