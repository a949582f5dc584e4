//! Headless VNC client example - connect, authenticate and log the session.
//!
//! Usage:
//!   cargo run -p rfb-client --features cli --example headless_connect -- localhost:0 -P secret
//!
//! Set `RFB_PROTOCOL_TRACE=1` to log every handshake message.

use rfb_client::args::{init_logging, Args};
use rfb_client::{establish, Config};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::from_args(args)?;
    info!(
        "Connecting to {}:{}",
        config.connection.host, config.connection.port
    );

    let connection = match establish(&config).await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to connect: {}", e);
            if e.is_retryable() {
                info!("The error looks transient; retrying may succeed");
            }
            return Err(e.into());
        }
    };

    let (width, height) = connection.size();
    let pf = &connection.server_init.pixel_format;
    info!("✓ Connected to server");
    info!("  Desktop: {} ({}x{})", connection.name(), width, height);
    info!(
        "  Pixel format: {} bpp, depth {}, {}",
        pf.bits_per_pixel,
        pf.depth,
        if pf.big_endian != 0 { "big endian" } else { "little endian" }
    );
    if !connection.pending.is_empty() {
        info!("  {} bytes already waiting after ServerInit", connection.pending.len());
    }

    info!("Shutting down...");
    Ok(())
}
