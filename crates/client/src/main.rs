//! Fire At Will terminal client.
//!
//! Reads overrides from `FAW_*` environment variables (a `.env` file is
//! honored) and plays one hot-seat match on stdin/stdout.
//!
//! ```bash
//! FAW_SEED=7 FAW_SAVE_DIR=./saves cargo run -p fireatwill-client
//! ```
use std::sync::Arc;

use anyhow::Result;
use fireatwill_client::{App, ClientConfig, logging};
use fireatwill_runtime::LiteralCoordinateOracle;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    let session_id = config.session_id();
    let _guard = logging::setup_logging(&session_id)?;

    tracing::info!("Starting Fire At Will");
    tracing::info!(
        session = %session_id,
        seed = config.board.seed,
        turn_limit = config.rules.turn_limit,
        confidence = %config.rules.confidence,
        "configuration loaded"
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let app = App::new(
        config,
        session_id,
        Arc::new(LiteralCoordinateOracle::default()),
        stdin,
        std::io::stdout(),
    );
    let outcome = app.run().await?;

    tracing::info!(%outcome, "client shutdown complete");
    Ok(())
}
