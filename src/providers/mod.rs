//! Text-generation backends

pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::request::CanonicalRequest;

// Re-export for convenience
pub use ollama::OllamaClient;

/// Raw reply from a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendReply
{   pub model: String
  , #[serde(default)]
    pub created_at: String
  , /// Generated text, opaque to the gateway
    pub response: String
  , #[serde(default)]
    pub done: bool
}

/// A remote text-generation endpoint
#[async_trait]
pub trait Backend: Send + Sync
{   /// Run one non-streaming generation
    async fn generate(
      &self
    , request: &CanonicalRequest
    ) -> Result<BackendReply, BackendError>;
}
