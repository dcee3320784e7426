//! Error taxonomy for the generation pipeline

use thiserror::Error;

/// Status reported when the backend failure carries no HTTP status
pub const GENERIC_SERVER_ERROR: u16 = 500;

/// Terminal failures of a gateway call
/// None of these are retried; they travel to the HTTP boundary as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error
{   /// Caller input failed a precondition (missing prompt, bad config)
    #[error("{0}")]
    InvalidArgument(String)
  , /// The backend call failed or returned a non-2xx status
    #[error("{message}")]
    BackendUnavailable
    {   status: u16
      , message: String
    }
  , /// The backend answered but no valid JSON could be recovered
    #[error("Failed to generate valid JSON: {0}")]
    UnprocessableOutput(String)
}

impl Error
{   /// HTTP status the boundary should answer with
    pub fn status_code(&self) -> u16
    {   match self
        {   Error::InvalidArgument(_) => 400
          , Error::BackendUnavailable { status, .. } => *status
          , Error::UnprocessableOutput(_) => 422
        }
    }

    /// Build a `BackendUnavailable` from a backend-contract failure
    pub fn from_backend(err: BackendError) -> Self
    {   Error::BackendUnavailable
        {   status: err.status.unwrap_or(GENERIC_SERVER_ERROR)
          , message: format!("Ollama API error: {}", err.message)
        }
    }
}

impl From<BackendError> for Error
{   fn from(err: BackendError) -> Self
    {   Error::from_backend(err)
    }
}

/// Failure surfaced by a `Backend` implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError
{   /// HTTP status, when the backend answered at all
    pub status: Option<u16>
  , pub message: String
}

impl BackendError
{   pub fn with_status(status: u16, message: impl Into<String>) -> Self
    {   BackendError
        {   status: Some(status)
          , message: message.into()
        }
    }

    pub fn transport(message: impl Into<String>) -> Self
    {   BackendError
        {   status: None
          , message: message.into()
        }
    }
}
