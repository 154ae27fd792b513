mod auth;
mod config;
mod converters;
mod error;
mod formatter;
mod llm_client;
mod logging;
mod models;
mod pipeline;
mod request_id;
mod router;

use clap::Parser;
use config::Config;
use pipeline::ResponsePipeline;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info, warn};

#[derive(Parser, Debug)]
#[command(name = "insight-assistant")]
#[command(about = "Generates sanitized assistant replies for wellness conversations")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Path to an optional YAML config file; LLM_* environment variables override it
    #[arg(short, long)]
    config: Option<String>,

    /// Bearer token required from callers
    #[arg(short, long)]
    token: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Also write logs to this file (size-capped)
    #[arg(long)]
    log_file: Option<String>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    logging::init_logging(log_level, args.log_file.as_deref())?;

    let config = Config::load(args.config.as_deref())?;
    match &args.config {
        Some(path) => info!("Configuration loaded successfully from: {}", path),
        None => info!("No config file given; using defaults and environment"),
    }
    if config.llm.credential().is_none() {
        warn!("{} is not set; every response request will fail until it is", config::API_KEY_ENV);
    }
    info!("Default model: {}", config.llm.default_model);

    // One shared HTTP client for every backend call
    let client_builder = reqwest::Client::builder();
    let client_builder = match &args.proxy {
        Some(proxy) => client_builder.proxy(reqwest::Proxy::all(proxy)?),
        None => client_builder,
    };
    let http_client = Arc::new(client_builder.build()?);

    let backend = llm_client::LlmClient::new(http_client, config.llm.api_base.clone());
    let app_state = auth::AppState {
        pipeline: Arc::new(ResponsePipeline::new(config.llm, backend)),
        token: args.token,
    };

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, router::app(app_state)).await?;
    Ok(())
}
