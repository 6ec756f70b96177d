//! profrag server binary
//!
//! Reads `.env` (if present), loads `ServerConfig`, and serves the streaming
//! chat API until interrupted.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal in production; real env vars still apply.
    let _ = dotenvy::dotenv();

    let config = ServerConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
