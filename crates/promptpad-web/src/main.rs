//! Serve the promptpad page backed by the Gemini API.
//!
//! Reads the API key from the `GEMINI_API_KEY` environment variable. An unset
//! key is sent as empty, which some deployments accept.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p promptpad-web
//! GEMINI_API_KEY=... cargo run -p promptpad-web -- --model gemini-2.5-flash --port 8080
//! cargo run -p promptpad-web -- --endpoint http://localhost:9000/generate --supersede
//! ```
//!
//! Then open the printed URL in a browser.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use promptpad::config::DEFAULT_MODEL;
use promptpad::prelude::*;
use promptpad_web::{WebConfig, spawn_web};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Browser front end for Gemini text generation.
#[derive(Parser)]
#[command(name = "promptpad-web")]
struct Args {
    /// Gemini model to use.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Full generateContent endpoint URL (overrides --model).
    #[arg(long)]
    endpoint: Option<String>,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Abort requests that take longer than this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Let a new action replace a pending one instead of refusing it.
    #[arg(long)]
    supersede: bool,

    /// Regenerate from the original template instead of the last prompt.
    #[arg(long)]
    reuse_template: bool,
}

impl Args {
    fn generation_config(&self) -> GenerationConfig {
        let mut config = GenerationConfig::from_env().with_model(&self.model);
        if let Some(ref endpoint) = self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_pending_policy(if self.supersede {
                PendingPolicy::Supersede
            } else {
                PendingPolicy::Reject
            })
            .with_regenerate_strategy(if self.reuse_template {
                RegenerateStrategy::ReuseTemplate
            } else {
                RegenerateStrategy::Retemplate
            })
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 1. Gemini client, shared by every page session.
    let generation_config = args.generation_config();
    if generation_config.api_key.is_empty() {
        info!("GEMINI_API_KEY is not set; sending requests with an empty key");
    }
    let backend: Arc<dyn GenerationBackend> = Arc::new(GeminiClient::new(generation_config)?);

    // 2. Serve until interrupted. Each page gets its own session.
    let web_config = WebConfig {
        bind_addr: (args.bind, args.port).into(),
        ..Default::default()
    };
    let addr = spawn_web(backend, args.session_config(), web_config).await?;
    println!("promptpad: http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    info!("Shutting down");
    Ok(())
}
