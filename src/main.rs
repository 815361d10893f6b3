//! clipshot server binary
//!
//! Element screenshot HTTP service over headless Chromium.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use clipshot::browser::CaptureEngine;
use clipshot::config::ServiceConfig;
use clipshot::handlers::{router, AppState};

/// Element screenshot HTTP service
#[derive(Parser, Debug)]
#[command(name = "clipshot")]
#[command(version)]
#[command(about = "Renders pages in headless Chromium and exports element or full-page screenshots")]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Directory screenshots are written to
    #[arg(long, default_value = "./screenshots")]
    output_dir: String,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Disable the Chromium sandbox (needed in some containers)
    #[arg(long)]
    no_sandbox: bool,

    /// Default navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout: u64,

    /// Default JPEG quality (1-100)
    #[arg(long, default_value = "90")]
    quality: u8,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let mut builder = ServiceConfig::builder()
        .output_dir(args.output_dir.as_str())
        .headless(!args.headed)
        .sandbox(!args.no_sandbox)
        .timeout_ms(args.timeout)
        .quality(args.quality.clamp(1, 100));
    if let Some(ref path) = args.chrome_path {
        builder = builder.chrome_path(path.as_str());
    }
    let config = Arc::new(builder.build());

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating output directory {}", config.output_dir.display()))?;

    let engine = Arc::new(CaptureEngine::new(config));
    let state = AppState::new(engine);
    let app = router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("clipshot listening on {addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
