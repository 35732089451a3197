use agriscan_server::{ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env();
    tracing::info!(
        bind = %cfg.bind_addr,
        max_upload_bytes = cfg.max_upload_bytes,
        max_stored_images = cfg.max_stored_images,
        "starting AgriScan server"
    );

    let handle = start_server(cfg).await?;
    // Park until the server task ends
    handle.await.ok();
    Ok(())
}
