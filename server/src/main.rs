use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, redirect_template_for_host, AppConfig, DEFAULT_DATA_PATH};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Dataset path (JSON object keyed by audiobook id)
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Download URL template containing `{id}`; defaults to one built from DOWNLOAD_HOST
    #[arg(long)]
    redirect_template: Option<String>,
    /// Timeout for resolving download redirects
    #[arg(long, default_value_t = 15)]
    redirect_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let redirect_template = args
        .redirect_template
        .or_else(|| std::env::var("DOWNLOAD_HOST").ok().map(|h| redirect_template_for_host(&h)));
    let config = AppConfig {
        data_path: args.data,
        redirect_template,
        redirect_timeout: Duration::from_secs(args.redirect_timeout_secs),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
