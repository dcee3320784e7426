//! Configuration for the gateway server and its Ollama backend

use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://ollama:11434";
pub const DEFAULT_MODEL: &str = "llama3:32b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig
{   /// Interface to bind
    pub host: String
  , /// TCP port to listen on
    pub port: u16
}

impl Default for ServerConfig
{   fn default() -> Self
    {   ServerConfig
        {   host: DEFAULT_HOST.to_string()
          , port: DEFAULT_PORT
        }
    }
}

/// Backend (Ollama) configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig
{   /// Base URL of the Ollama server, without the `/api` suffix
    pub base_url: String
  , /// Model used when a caller does not pick one
    pub default_model: String
  , /// Request timeout in seconds
    pub timeout_secs: u64
}

impl Default for BackendConfig
{   fn default() -> Self
    {   BackendConfig
        {   base_url: DEFAULT_BACKEND_URL.to_string()
          , default_model: DEFAULT_MODEL.to_string()
          , timeout_secs: DEFAULT_TIMEOUT_SECS
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig
{   pub server: ServerConfig
  , pub backend: BackendConfig
}

impl GatewayConfig
{   /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   GatewayConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    /// Unset or empty values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::error::Error>
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| {
          lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        };

        let defaults = GatewayConfig::default();

        let config = GatewayConfig
        {   server: ServerConfig
            {   host: get("HOST")
                  .unwrap_or(defaults.server.host)
              , port: parse_var("PORT", get("PORT"))?
                  .unwrap_or(defaults.server.port)
            }
          , backend: BackendConfig
            {   base_url: get("OLLAMA_URL")
                  .map(|url| url.trim_end_matches('/').to_string())
                  .unwrap_or(defaults.backend.base_url)
              , default_model: get("OLLAMA_MODEL")
                  .unwrap_or(defaults.backend.default_model)
              , timeout_secs: parse_var(
                    "OLLAMA_TIMEOUT_SECS",
                    get("OLLAMA_TIMEOUT_SECS")
                  )?
                  .unwrap_or(defaults.backend.timeout_secs)
            }
        };

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}

fn parse_var<T>(key: &str, value: Option<String>)
  -> Result<Option<T>, crate::error::Error>
where
  T: std::str::FromStr
, T::Err: std::fmt::Display
{   value
      .map(|raw| {
        raw.parse::<T>().map_err(|e| {
          crate::error::Error::InvalidArgument(
            format!("Invalid value for {}: {} ({})", key, raw, e)
          )
        })
      })
      .transpose()
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)])
      -> impl Fn(&str) -> Option<String>
    {   let map: HashMap<String, String> = pairs
          .iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults()
    {   let config = GatewayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.backend.default_model, "llama3:32b");
        assert_eq!(config.backend.base_url, "http://ollama:11434");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn values_override_defaults()
    {   let config = GatewayConfig::from_lookup(lookup_from(&[
          ("OLLAMA_URL", "http://localhost:11434/")
        , ("OLLAMA_MODEL", "mistral")
        , ("PORT", "8080")
        , ("OLLAMA_TIMEOUT_SECS", "5")
        ])).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:11434");
        assert_eq!(config.backend.default_model, "mistral");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn blank_values_count_as_unset()
    {   let config = GatewayConfig::from_lookup(lookup_from(&[
          ("OLLAMA_MODEL", "   ")
        ])).unwrap();
        assert_eq!(config.backend.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn bad_port_is_rejected()
    {   let err = GatewayConfig::from_lookup(lookup_from(&[
          ("PORT", "not-a-port")
        ])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
