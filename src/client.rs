use std::sync::Arc;

use log::{debug, error, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::extract::{self, ExtractionResult};
use crate::providers::Backend;
use crate::request::{GenerationOptions, RequestComposer};

/// Plain completion plus the model that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextCompletion
{   pub text: String
  , pub model: String
}

/// Generation pipeline: compose, call the backend, extract
///
/// Holds no per-call state, so one instance is shared by every request.
#[derive(Clone)]
pub struct Gateway
{   composer: RequestComposer
  , backend: Arc<dyn Backend>
}

impl Gateway
{   pub fn new(
      composer: RequestComposer
    , backend: Arc<dyn Backend>
    ) -> Self
    {   debug!(
          "Creating Gateway with default model: {}",
          composer.default_model()
        );
        Gateway
        {   composer
          , backend
        }
    }

    pub fn default_model(&self) -> &str
    {   self.composer.default_model()
    }

    /// Generate free text; the backend's reply is returned verbatim
    pub async fn generate_text(
      &self
    , prompt: &str
    , options: &GenerationOptions
    ) -> Result<TextCompletion, Error>
    {   let request = self.composer.compose(prompt, options);
        debug!("generate_text using model: {}", request.model);

        let reply = self.backend
          .generate(&request)
          .await
          .map_err(|e| {
            error!("Backend call failed: {}", e);
            Error::from_backend(e)
          })?;

        Ok(TextCompletion
        {   text: reply.response
          , model: request.model
        })
    }

    /// Generate a reply and recover the JSON value embedded in it
    pub async fn generate_structured(
      &self
    , prompt: &str
    , options: &GenerationOptions
    ) -> Result<Value, Error>
    {   let request = self.composer
          .compose_for_structured_output(prompt, options);
        debug!("generate_structured using model: {}", request.model);

        let reply = self.backend
          .generate(&request)
          .await
          .map_err(|e| {
            error!("Backend call failed: {}", e);
            Error::from_backend(e)
          })?;

        extract::extract_from_free_text(&reply.response)
          .into_result()
          .map_err(|reason| {
            warn!("Backend reply held no usable JSON: {}", reason);
            Error::UnprocessableOutput(reason)
          })
    }

    /// Validate caller-supplied JSON text
    pub fn validate_json(&self, text: &str) -> ExtractionResult
    {   extract::validate(text)
    }
}
