use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, trace};
use serde::Serialize;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::providers::{Backend, BackendReply};
use crate::request::CanonicalRequest;

// ===== Wire Types =====

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaGenerateRequest
{   pub model: String
  , pub prompt: String
  , pub stream: bool
  , pub options: OllamaOptions
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaOptions
{   pub temperature: f32
  , pub top_p: f32
  , pub top_k: u32
  , pub num_predict: u32
}

impl From<&CanonicalRequest> for OllamaGenerateRequest
{   fn from(request: &CanonicalRequest) -> Self
    {   OllamaGenerateRequest
        {   model: request.model.clone()
          , prompt: request.prompt.clone()
          , stream: false
          , options: OllamaOptions
            {   temperature: request.temperature
              , top_p: request.top_p
              , top_k: request.top_k
              , num_predict: request.max_tokens
            }
        }
    }
}

// ===== Ollama Client =====

/// HTTP client for Ollama's `/api/generate`
#[derive(Debug, Clone)]
pub struct OllamaClient
{   base_url: String
  , http_client: reqwest::Client
}

impl OllamaClient
{   /// Create a client with the configured base URL and timeout
    pub fn new(config: &BackendConfig)
      -> Result<Self, crate::error::Error>
    {   debug!(
          "Creating OllamaClient for {} (timeout {}s)",
          config.base_url, config.timeout_secs
        );
        let http_client = reqwest::Client::builder()
          .timeout(Duration::from_secs(config.timeout_secs))
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            crate::error::Error::InvalidArgument(
              format!("Invalid backend configuration: {}", e)
            )
          })?;

        Ok(OllamaClient
        {   base_url: config.base_url.trim_end_matches('/').to_string()
          , http_client
        })
    }

    pub fn base_url(&self) -> &str
    {   &self.base_url
    }

    fn generate_url(&self) -> String
    {   format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl Backend for OllamaClient
{   async fn generate(
      &self
    , request: &CanonicalRequest
    ) -> Result<BackendReply, BackendError>
    {   debug!("Handling generate for: {}", request.model);

        let body = OllamaGenerateRequest::from(request);
        trace!("Ollama request: {:?}", body);

        let response = self.http_client
          .post(self.generate_url())
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            match e.status()
            {   Some(status) => BackendError::with_status(
                  status.as_u16(), e.to_string()
                )
              , None => BackendError::transport(e.to_string())
            }
          })?;

        let status = response.status();
        trace!("Ollama response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            // Body is logged, not returned to callers.
            error!("Ollama API error {}: {}", status, error_text);
            return Err(BackendError::with_status(
              status.as_u16(),
              format!("Request failed with status code {}", status.as_u16())
            ));
        }

        let reply: BackendReply = response.json().await
          .map_err(|e| {
            error!("Parse error: {}", e);
            BackendError::transport(
              format!("Failed to decode response: {}", e)
            )
          })?;

        debug!(
          "Ollama replied with {} chars (done: {})",
          reply.response.len(), reply.done
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn wire_request_maps_max_tokens_to_num_predict()
    {   let request = CanonicalRequest
        {   model: "llama3:32b".to_string()
          , prompt: "<system>s</system>\n\nhi".to_string()
          , temperature: 0.5
          , top_p: 0.25
          , top_k: 40
          , max_tokens: 256
        };
        let wire = serde_json::to_value(
          OllamaGenerateRequest::from(&request)
        ).unwrap();

        assert_eq!(wire, json!({
          "model": "llama3:32b",
          "prompt": "<system>s</system>\n\nhi",
          "stream": false,
          "options": {
            "temperature": 0.5,
            "top_p": 0.25,
            "top_k": 40,
            "num_predict": 256
          }
        }));
    }

    #[test]
    fn trailing_slash_is_trimmed()
    {   let config = BackendConfig
        {   base_url: "http://localhost:11434/".to_string()
          , ..BackendConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.generate_url(), "http://localhost:11434/api/generate");
    }
}
