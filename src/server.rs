//! HTTP boundary: routing, input validation and error mapping
//!
//! Every response uses the `{status, data}` envelope on success and
//! `{status, statusCode, message}` on failure.

use std::any::Any;
use std::future::Future;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::client::Gateway;
use crate::error::Error;
use crate::request::GenerationOptions;

pub const API_PREFIX: &str = "/api/v1/llm";

const PROMPT_REQUIRED: &str = "Prompt is required and must be a string";
const TEXT_REQUIRED: &str = "Text is required and must be a string";

/// Hardening headers added to every response unless a handler set them
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
  ( "content-security-policy"
  , "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
     form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
     object-src 'none';script-src 'self';script-src-attr 'none';\
     style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests"
  )
, ("cross-origin-opener-policy", "same-origin")
, ("cross-origin-resource-policy", "same-origin")
, ("origin-agent-cluster", "?1")
, ("referrer-policy", "no-referrer")
, ("strict-transport-security", "max-age=31536000; includeSubDomains")
, ("x-content-type-options", "nosniff")
, ("x-dns-prefetch-control", "off")
, ("x-download-options", "noopen")
, ("x-frame-options", "SAMEORIGIN")
, ("x-permitted-cross-domain-policies", "none")
, ("x-xss-protection", "0")
];

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState
{   pub gateway: Gateway
}

/// Success envelope
#[derive(Debug, Serialize)]
struct Envelope<T>
{   status: &'static str
  , data: T
}

fn success<T: Serialize>(data: T) -> Json<Envelope<T>>
{   Json(Envelope
    {   status: "success"
      , data
    })
}

/// Error envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody
{   status: &'static str
  , status_code: u16
  , message: String
}

fn error_response(status: StatusCode, message: String) -> Response
{   let body = ErrorBody
    {   status: "error"
      , status_code: status.as_u16()
      , message
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for Error
{   fn into_response(self) -> Response
    {   let status = StatusCode::from_u16(self.status_code())
          .ok()
          .filter(|s| s.is_client_error() || s.is_server_error())
          .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        warn!("Request failed ({}): {}", status.as_u16(), self);
        error_response(status, self.to_string())
    }
}

/// Build the gateway router with its middleware stack
pub fn create_router(gateway: Gateway) -> Router
{   let api = Router::new()
      .route("/completions", post(completions))
      .route("/json", post(json_completion))
      .route("/validate-json", post(validate_json))
      .route("/models", get(list_models));

    let router = Router::new()
      .route("/health", get(health_check))
      .nest(API_PREFIX, api)
      .with_state(AppState { gateway })
      .layer(CatchPanicLayer::custom(handle_panic));

    with_security_headers(router)
      .layer(middleware::from_fn(log_requests))
      .layer(CorsLayer::permissive())
}

fn with_security_headers(router: Router) -> Router
{   SECURITY_HEADERS
      .iter()
      .fold(router, |router, &(name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
          HeaderName::from_static(name),
          HeaderValue::from_static(value)
        ))
      })
}

/// Serve the router on a pre-bound listener until `shutdown` resolves
pub async fn serve<F>(
  listener: TcpListener
, gateway: Gateway
, shutdown: F
) -> std::io::Result<()>
where
  F: Future<Output = ()> + Send + 'static
{   let addr = listener.local_addr()?;
    info!("Gateway listening on http://{}", addr);

    axum::serve(listener, create_router(gateway))
      .with_graceful_shutdown(shutdown)
      .await?;

    info!("Gateway shut down");
    Ok(())
}

// ===== Handlers =====

async fn health_check() -> impl IntoResponse
{   Json(json!({ "status": "ok" }))
}

async fn completions(
  State(state): State<AppState>
, body: Result<Json<Value>, JsonRejection>
) -> Result<Response, Error>
{   let (prompt, options) = parse_completion(body)?;
    debug!("POST {}/completions", API_PREFIX);

    let completion = state.gateway
      .generate_text(&prompt, &options)
      .await?;
    Ok(success(completion).into_response())
}

async fn json_completion(
  State(state): State<AppState>
, body: Result<Json<Value>, JsonRejection>
) -> Result<Response, Error>
{   let (prompt, options) = parse_completion(body)?;
    debug!("POST {}/json", API_PREFIX);

    let data = state.gateway
      .generate_structured(&prompt, &options)
      .await?;
    Ok(success(data).into_response())
}

async fn validate_json(
  State(state): State<AppState>
, body: Result<Json<Value>, JsonRejection>
) -> Result<Response, Error>
{   let Json(body) = body.map_err(rejection_to_error)?;
    let text = required_text(&body, "text", TEXT_REQUIRED)?;
    debug!("POST {}/validate-json ({} chars)", API_PREFIX, text.len());

    let result = state.gateway.validate_json(&text);
    Ok(success(result).into_response())
}

async fn list_models(State(state): State<AppState>) -> impl IntoResponse
{   let model = state.gateway.default_model();
    success(json!({
      "models": [
        {
          "id": model,
          "name": model,
          "description": "Default model served by the configured Ollama backend"
        }
      ]
    }))
}

// ===== Input validation =====

fn parse_completion(
  body: Result<Json<Value>, JsonRejection>
) -> Result<(String, GenerationOptions), Error>
{   let Json(body) = body.map_err(rejection_to_error)?;
    let prompt = required_text(&body, "prompt", PROMPT_REQUIRED)?;
    let options: GenerationOptions = serde_json::from_value(body)
      .map_err(|e| {
        Error::InvalidArgument(
          format!("Invalid generation options: {}", e)
        )
      })?;
    Ok((prompt, options))
}

fn required_text(body: &Value, field: &str, message: &str)
  -> Result<String, Error>
{   body.get(field)
      .and_then(Value::as_str)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .ok_or_else(|| Error::InvalidArgument(message.to_string()))
}

fn rejection_to_error(rejection: JsonRejection) -> Error
{   Error::InvalidArgument(rejection.body_text())
}

// ===== Middleware =====

async fn log_requests(request: Request, next: Next) -> Response
{   let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
      "{} {} {} {}ms",
      method,
      path,
      response.status().as_u16(),
      start.elapsed().as_millis()
    );
    response
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response
{   let detail = err.downcast_ref::<String>()
      .map(String::as_str)
      .or_else(|| err.downcast_ref::<&str>().copied())
      .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    error_response(
      StatusCode::INTERNAL_SERVER_ERROR,
      "Internal Server Error".to_string()
    )
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn required_text_rejects_missing_empty_and_non_string()
    {   for body in [
          json!({})
        , json!({ "prompt": "" })
        , json!({ "prompt": 42 })
        , json!({ "prompt": null })
        ]
        {   assert_eq!(
              required_text(&body, "prompt", PROMPT_REQUIRED),
              Err(Error::InvalidArgument(PROMPT_REQUIRED.to_string()))
            );
        }
    }

    #[test]
    fn options_are_read_from_the_same_body()
    {   let body = json!({
          "prompt": "hi",
          "model": "mistral",
          "temperature": 1,
          "top_k": 12,
          "unknown": "ignored"
        });
        let (prompt, options) = parse_completion(Ok(Json(body))).unwrap();
        assert_eq!(prompt, "hi");
        assert_eq!(options.model.as_deref(), Some("mistral"));
        assert_eq!(options.temperature, Some(1.0));
        assert_eq!(options.top_k, Some(12));
        assert_eq!(options.max_tokens, None);
    }

    #[test]
    fn wrongly_typed_option_is_invalid_argument()
    {   let body = json!({ "prompt": "hi", "top_k": "many" });
        assert!(matches!(
          parse_completion(Ok(Json(body))),
          Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn panic_handler_hides_details()
    {   let response = handle_panic(Box::new("secret detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
