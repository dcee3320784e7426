//! Request composition: caller input to canonical backend request

use log::trace;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const STRUCTURED_TEMPERATURE: f32 = 0.2;

pub const DEFAULT_SYSTEM_PROMPT: &str
  = "You are a helpful AI assistant. Your responses should be accurate, \
     helpful, and safe. When asked to generate content, please format it \
     as valid JSON.";

pub const JSON_ONLY_INSTRUCTION: &str
  = "\nYou must respond with valid JSON only. \
     No other text before or after the JSON.";

/// Optional generation parameters supplied by a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions
{   /// Model name; the configured default is used when absent
    #[serde(default)]
    pub model: Option<String>
  , #[serde(default)]
    pub temperature: Option<f32>
  , /// Nucleus sampling probability
    #[serde(default)]
    pub top_p: Option<f32>
  , #[serde(default)]
    pub top_k: Option<u32>
  , /// Maximum output length, sent as `num_predict`
    #[serde(default)]
    pub max_tokens: Option<u32>
  , #[serde(default)]
    pub system_prompt: Option<String>
}

/// Fully defaulted request, ready for the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRequest
{   pub model: String
  , /// System segment followed by the user prompt
    pub prompt: String
  , pub temperature: f32
  , pub top_p: f32
  , pub top_k: u32
  , pub max_tokens: u32
}

/// Turns caller input into canonical requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestComposer
{   default_model: String
}

impl RequestComposer
{   pub fn new(default_model: impl Into<String>) -> Self
    {   RequestComposer
        {   default_model: default_model.into()
        }
    }

    pub fn default_model(&self) -> &str
    {   &self.default_model
    }

    /// Compose a plain text-generation request
    pub fn compose(
      &self
    , prompt: &str
    , options: &GenerationOptions
    ) -> CanonicalRequest
    {   let system = non_empty(options.system_prompt.as_deref())
          .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        self.build(prompt, system, options, DEFAULT_TEMPERATURE)
    }

    /// Compose a request whose reply must be JSON only
    ///
    /// The caller's system prompt (possibly empty) gets the JSON-only
    /// instruction appended, and temperature defaults to 0.2.
    pub fn compose_for_structured_output(
      &self
    , prompt: &str
    , options: &GenerationOptions
    ) -> CanonicalRequest
    {   let system = format!(
          "{}{}",
          options.system_prompt.as_deref().unwrap_or(""),
          JSON_ONLY_INSTRUCTION
        );
        self.build(prompt, &system, options, STRUCTURED_TEMPERATURE)
    }

    fn build(
      &self
    , prompt: &str
    , system: &str
    , options: &GenerationOptions
    , default_temperature: f32
    ) -> CanonicalRequest
    {   let model = non_empty(options.model.as_deref())
          .unwrap_or(&self.default_model)
          .to_string();

        // Zero means "not supplied" for every sampling parameter.
        let request = CanonicalRequest
        {   model
          , prompt: wrap_with_system_prompt(prompt, system)
          , temperature: non_zero_f32(options.temperature)
              .unwrap_or(default_temperature)
          , top_p: non_zero_f32(options.top_p)
              .unwrap_or(DEFAULT_TOP_P)
          , top_k: options.top_k
              .filter(|k| *k != 0)
              .unwrap_or(DEFAULT_TOP_K)
          , max_tokens: options.max_tokens
              .filter(|n| *n != 0)
              .unwrap_or(DEFAULT_MAX_TOKENS)
        };

        trace!("Composed request: {:?}", request);
        request
    }
}

/// Prefix the user prompt with a delimited system segment
pub fn wrap_with_system_prompt(prompt: &str, system: &str) -> String
{   format!("<system>{}</system>\n\n{}", system, prompt)
}

fn non_empty(value: Option<&str>) -> Option<&str>
{   value.filter(|v| !v.is_empty())
}

fn non_zero_f32(value: Option<f32>) -> Option<f32>
{   value.filter(|v| *v != 0.0 && !v.is_nan())
}
