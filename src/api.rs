use std::{thread, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
   config::ProviderConfig,
   error::{CommitGenError, Result},
   style,
};

/// What one generation call needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
   pub system_prompt:  &'a str,
   pub recent_commits: &'a str,
   pub diff:           &'a str,
}

/// Produces raw commit message text. May try several backends before
/// failing.
pub trait Generator {
   fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct Message {
   role:    String,
   content: String,
}

#[derive(Debug, Serialize)]
struct ApiRequest {
   model:       String,
   max_tokens:  u32,
   temperature: f32,
   messages:    Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Choice {
   message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
   #[serde(default)]
   content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
   choices: Vec<Choice>,
}

/// Layout of the conversation sent to the model.
fn build_messages(request: &GenerationRequest<'_>) -> Vec<Message> {
   vec![
      Message { role: "system".to_string(), content: request.system_prompt.to_string() },
      Message {
         role:    "user".to_string(),
         content: format!("Recent commits:\n{}", request.recent_commits),
      },
      Message { role: "user".to_string(), content: format!("Changes:\n{}", request.diff) },
   ]
}

/// Retry an API call with exponential backoff.
///
/// The closure returns `(retry, result)`: `retry` asks for another attempt
/// (5xx), otherwise `result` is final.
pub fn retry_api_call<F, T>(config: &ProviderConfig, mut f: F) -> Result<T>
where
   F: FnMut() -> Result<(bool, Option<T>)>,
{
   let mut attempt = 0;

   loop {
      attempt += 1;

      match f() {
         Ok((false, Some(result))) => return Ok(result),
         Ok((false, None)) => {
            return Err(CommitGenError::GenerationFailure(
               "API call failed without result".to_string(),
            ));
         },
         Ok((true, _)) if attempt < config.max_retries => {
            let backoff_ms = config.initial_backoff_ms * (1 << (attempt - 1));
            eprintln!("Retry {}/{} after {}ms...", attempt, config.max_retries, backoff_ms);
            thread::sleep(Duration::from_millis(backoff_ms));
         },
         Ok((true, _)) => {
            return Err(CommitGenError::ApiRetryExhausted {
               retries: config.max_retries,
               source:  Box::new(CommitGenError::GenerationFailure(
                  "server kept failing".to_string(),
               )),
            });
         },
         Err(e) => {
            let transient = matches!(e, CommitGenError::HttpError(_));
            if transient && attempt < config.max_retries {
               let backoff_ms = config.initial_backoff_ms * (1 << (attempt - 1));
               eprintln!(
                  "Error: {} - Retry {}/{} after {}ms...",
                  e, attempt, config.max_retries, backoff_ms
               );
               thread::sleep(Duration::from_millis(backoff_ms));
               continue;
            }
            return Err(e);
         },
      }
   }
}

/// OpenAI-compatible chat completions client with a model failover chain.
#[derive(Debug)]
pub struct ProviderClient {
   config: ProviderConfig,
   client: reqwest::blocking::Client,
}

impl ProviderClient {
   pub fn new(config: ProviderConfig) -> Result<Self> {
      let client = reqwest::blocking::Client::builder()
         .timeout(Duration::from_secs(config.request_timeout_secs))
         .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
         .build()?;
      Ok(Self { config, client })
   }

   /// Primary model followed by the fallbacks, without duplicates.
   pub fn model_chain(&self) -> Vec<&str> {
      let mut chain: Vec<&str> = vec![self.config.model.as_str()];
      for model in &self.config.fallback_models {
         if !chain.contains(&model.as_str()) {
            chain.push(model.as_str());
         }
      }
      chain
   }

   fn complete(&self, model: &str, request: &GenerationRequest<'_>) -> Result<String> {
      retry_api_call(&self.config, || {
         let body = ApiRequest {
            model:       model.to_string(),
            max_tokens:  self.config.max_tokens,
            temperature: self.config.temperature,
            messages:    build_messages(request),
         };

         let mut request_builder = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base_url.trim_end_matches('/')))
            .header("content-type", "application/json");

         if let Some(ref api_key) = self.config.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {api_key}"));
         }

         let response = request_builder.json(&body).send()?;
         let status = response.status();

         // Retry on 5xx errors
         if status.is_server_error() {
            let error_text = response
               .text()
               .unwrap_or_else(|_| "Unknown error".to_string());
            eprintln!("Server error {status}: {error_text}");
            return Ok((true, None));
         }

         if !status.is_success() {
            let error_text = response
               .text()
               .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CommitGenError::ApiError { status: status.as_u16(), body: error_text });
         }

         let api_response: ApiResponse = response.json()?;
         let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
               CommitGenError::GenerationFailure(format!("{model} returned an empty response"))
            })?;

         Ok((false, Some(content)))
      })
   }
}

impl Generator for ProviderClient {
   fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
      let mut last_error = None;

      for (idx, model) in self.model_chain().into_iter().enumerate() {
         if idx > 0 {
            style::print_info(&format!("Trying fallback model {}...", style::bold(model)));
         }
         match self.complete(model, request) {
            Ok(text) => return Ok(text),
            Err(e) => {
               style::warn(&format!("Model {model} failed: {e}"));
               last_error = Some(e);
            },
         }
      }

      Err(CommitGenError::GenerationFailure(last_error.map_or_else(
         || "no model configured".to_string(),
         |e| format!("every backend failed, last error: {e}"),
      )))
   }
}

#[cfg(test)]
mod tests {
   use std::cell::Cell;

   use super::*;

   fn fast_config() -> ProviderConfig {
      ProviderConfig { max_retries: 3, initial_backoff_ms: 0, ..ProviderConfig::default() }
   }

   #[test]
   fn test_build_messages_layout() {
      let req = GenerationRequest { system_prompt: "sys", recent_commits: "fix: a", diff: "+x" };
      let messages = build_messages(&req);
      assert_eq!(messages.len(), 3);
      assert_eq!(messages[0].role, "system");
      assert_eq!(messages[1].content, "Recent commits:\nfix: a");
      assert_eq!(messages[2].content, "Changes:\n+x");
   }

   #[test]
   fn test_retry_until_success() {
      let calls = Cell::new(0);
      let result = retry_api_call(&fast_config(), || {
         calls.set(calls.get() + 1);
         if calls.get() < 3 { Ok((true, None)) } else { Ok((false, Some("ok"))) }
      });
      assert_eq!(result.unwrap(), "ok");
      assert_eq!(calls.get(), 3);
   }

   #[test]
   fn test_retry_exhausted() {
      let calls = Cell::new(0);
      let result: Result<&str> = retry_api_call(&fast_config(), || {
         calls.set(calls.get() + 1);
         Ok((true, None))
      });
      assert!(matches!(result, Err(CommitGenError::ApiRetryExhausted { retries: 3, .. })));
      assert_eq!(calls.get(), 3);
   }

   #[test]
   fn test_client_errors_are_not_retried() {
      let calls = Cell::new(0);
      let result: Result<&str> = retry_api_call(&fast_config(), || {
         calls.set(calls.get() + 1);
         Err(CommitGenError::ApiError { status: 401, body: "unauthorized".into() })
      });
      assert!(result.is_err());
      assert_eq!(calls.get(), 1);
   }

   #[test]
   fn test_model_chain_dedupes() {
      let config = ProviderConfig {
         model: "a".into(),
         fallback_models: vec!["b".into(), "a".into(), "c".into()],
         ..ProviderConfig::default()
      };
      let client = ProviderClient::new(config).unwrap();
      assert_eq!(client.model_chain(), vec!["a", "b", "c"]);
   }
}
