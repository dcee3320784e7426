use anyhow::Context;
use log::{info, warn};
use tokio::net::TcpListener;

use llmgate::config::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()>
{   // A missing .env is fine; the environment may be set directly.
    if let Err(e) = dotenvy::dotenv()
    {   if !e.not_found()
        {   eprintln!("Failed to load .env: {}", e);
        }
    }

    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    info!("llmgate starting");

    let config = GatewayConfig::from_env()
      .context("invalid configuration")?;
    let gateway = llmgate::build_gateway(&config)
      .context("failed to build gateway")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
      .await
      .with_context(|| format!("failed to bind {}", addr))?;

    llmgate::server::serve(listener, gateway, shutdown_signal()).await?;

    info!("llmgate stopped");
    Ok(())
}

async fn shutdown_signal()
{   match tokio::signal::ctrl_c().await
    {   Ok(()) => info!("Shutdown signal received")
      , Err(e) => {
          warn!("Failed to listen for shutdown signal: {}", e);
          std::future::pending::<()>().await;
        }
    }
}
