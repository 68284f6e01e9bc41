//! Feedminder - reminder scheduling and delivery service
//!
//! Reads one JSON request per line on stdin and writes one JSON response per
//! line on stdout until EOF or Ctrl-C.

use anyhow::Context;
use feedminder_lib::utils::logging::init_tracing;
use feedminder_lib::{handle_line, AppContext};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before tracing so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) => warn!(error = %e, "could not load .env file"),
    }

    let config = feedminder_infra::config::load().context("failed to load configuration")?;
    let ctx = AppContext::new(config).await.context("failed to initialise application context")?;
    ctx.start_background().await.context("failed to start alarm sweep")?;
    info!("Feedminder ready");

    let served = tokio::select! {
        result = serve(&ctx) => result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("interrupted");
            Ok(())
        }
    };

    ctx.shutdown().await.context("failed to stop alarm sweep")?;
    served
}

async fn serve(ctx: &AppContext) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(ctx, &line).await;
        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed");
    Ok(())
}
