pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod extract;
pub mod client;
pub mod server;

/*

llmgate: an HTTP gateway in front of an Ollama server. Callers send
loosely-typed generation requests; the gateway fills in every sampling
parameter, wraps the prompt with a system segment, calls the backend
and, for structured requests, digs the JSON object out of the reply.

llmgate/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and crate layout
│   ├── main.rs         # Binary: env, logging, listener
│   ├── error.rs        # Error taxonomy and backend errors
│   ├── config.rs       # Server and backend configuration
│   ├── request.rs      # Caller options and request composition
│   ├── extract.rs      # JSON validation and extraction
│   ├── client.rs       # Gateway: compose -> backend -> extract
│   ├── server.rs       # axum routes, validation, error mapping
│   └── providers/
│       ├── mod.rs      # Backend trait and reply type
│       └── ollama.rs   # Ollama /api/generate client
└── tests/              # Integration tests

*/

pub use client::{Gateway, TextCompletion};
pub use config::{BackendConfig, GatewayConfig, ServerConfig};
pub use error::{BackendError, Error};
pub use extract::ExtractionResult;
pub use providers::{Backend, BackendReply, OllamaClient};
pub use request::{CanonicalRequest, GenerationOptions, RequestComposer};

use std::sync::Arc;

/// Wire a gateway to an Ollama backend from configuration
pub fn build_gateway(config: &GatewayConfig) -> Result<Gateway, Error>
{   let backend = OllamaClient::new(&config.backend)?;
    log::info!(
      "Using Ollama backend at {} (default model: {})",
      backend.base_url(),
      config.backend.default_model
    );
    Ok(Gateway::new(
      RequestComposer::new(config.backend.default_model.clone()),
      Arc::new(backend)
    ))
}
