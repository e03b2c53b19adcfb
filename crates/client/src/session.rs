//! Assembles a [`MatchRuntime`] from client configuration.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use fireatwill_core::Board;
use fireatwill_runtime::{FileTurnLog, InterpretationOracle, MatchRuntime};

use crate::config::ClientConfig;

/// A ready-to-play match plus where its turn log lives, if anywhere.
pub struct Session {
    pub id: String,
    pub runtime: MatchRuntime,
    pub log_path: Option<PathBuf>,
}

impl Session {
    /// Places the board from the configured seed and builds the runtime.
    ///
    /// A blank `frame` starts the match without a declared frame.
    pub fn start(
        config: &ClientConfig,
        session_id: String,
        frame: Option<&str>,
        oracle: Arc<dyn InterpretationOracle>,
    ) -> Result<Self> {
        let setup = &config.board;
        let board = Board::random_setup(
            setup.rows,
            setup.cols,
            setup.ships,
            setup.hostages,
            setup.seed,
        )
        .context("failed to place the board")?;

        let mut builder = MatchRuntime::builder()
            .config(config.rules.clone())
            .board(board)
            .shared_oracle(oracle);
        if let Some(frame) = frame.map(str::trim).filter(|frame| !frame.is_empty()) {
            builder = builder.declared_frame(frame);
        }

        let mut log_path = None;
        if let Some(dir) = &config.save_dir {
            let filename = format!("{session_id}.log");
            let log = FileTurnLog::create(dir, &filename)
                .with_context(|| format!("failed to create turn log in {}", dir.display()))?;
            log_path = Some(log.path().to_path_buf());
            builder = builder.turn_log(log);
        }

        let runtime = builder.build().context("failed to start the match")?;
        tracing::info!(
            session = %session_id,
            rows = setup.rows,
            cols = setup.cols,
            ships = setup.ships,
            hostages = setup.hostages,
            persisted = log_path.is_some(),
            "session started"
        );
        Ok(Self {
            id: session_id,
            runtime,
            log_path,
        })
    }
}
