mod app;
mod handlers;
mod middleware;
mod report;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use vitrina_store_json::JsonFileStore;

use crate::app::ServiceState;

#[derive(Debug, Parser)]
#[command(name = "vitrina")]
#[command(about = "HTTP catalog service for collectible figure models")]
struct Args {
    /// Backing JSON document holding the model collection.
    #[arg(long, default_value = "./modelos.json")]
    data_file: PathBuf,
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    /// Directory for the access log and the exported report.
    /// Defaults to the Downloads folder under $HOME.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => default_output_dir()?,
    };

    if !args.data_file.exists() {
        tracing::warn!(
            path = %args.data_file.display(),
            "data file does not exist yet; requests will fail until it is created"
        );
    }

    let state = ServiceState {
        store: Arc::new(JsonFileStore::new(args.data_file)),
        report_path: output_dir.join("modelos_report.txt"),
        access_log_path: output_dir.join("access_log.txt"),
    };

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "vitrina listening");
    axum::serve(
        listener,
        app::app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn default_output_dir() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .context("HOME is not set; pass --output-dir for the access log and report")?;
    Ok(PathBuf::from(home).join("Downloads"))
}
