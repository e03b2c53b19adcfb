//! Client configuration loaded from environment variables.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use fireatwill_core::MatchConfig;

/// Initial board layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSetup {
    pub rows: u8,
    pub cols: u8,
    pub ships: usize,
    pub hostages: usize,
    pub seed: u64,
}

impl Default for BoardSetup {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            ships: 5,
            hostages: 3,
            seed: 0,
        }
    }
}

/// Everything the binary needs to start a match.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub rules: MatchConfig,
    pub board: BoardSetup,
    pub session_id: Option<String>,
    /// Turn logs are written here when set.
    pub save_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rules: MatchConfig::new(),
            board: BoardSetup::default(),
            session_id: None,
            save_dir: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `FAW_FIRE_THRESHOLD`, `FAW_HOLD_BIAS` - Ally firing rule
    /// - `FAW_EVASION_THRESHOLD`, `FAW_BAIT_THRESHOLD` - Enemy reaction thresholds
    /// - `FAW_TURN_LIMIT` - Turns before the match is called (default: 20)
    /// - `FAW_CANDIDATE_FRAMES` - Comma-separated frames the enemy suspects
    /// - `FAW_ADAPTER_TIMEOUT_MS` - Deadline for one interpretation call
    /// - `FAW_BOARD_ROWS`, `FAW_BOARD_COLS` - Board size (default: 8x8)
    /// - `FAW_SHIPS`, `FAW_HOSTAGES` - Entity counts (default: 5 and 3)
    /// - `FAW_SEED` - Board placement seed
    /// - `FAW_CHAFF_CHARGES` - Enemy chaff reserve (default: 0)
    /// - `FAW_CONFIDENCE` - `entropy` or `peak`
    /// - `FAW_SESSION_ID` - Session identifier for logs and saves
    /// - `FAW_SAVE_DIR` - Directory for turn logs (default: none)
    ///
    /// Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = parse(read("FAW_FIRE_THRESHOLD")) {
            config.rules.fire_threshold = value;
        }
        if let Some(value) = parse(read("FAW_HOLD_BIAS")) {
            config.rules.hold_bias = value;
        }
        if let Some(value) = parse(read("FAW_EVASION_THRESHOLD")) {
            config.rules.evasion_threshold = value;
        }
        if let Some(value) = parse(read("FAW_BAIT_THRESHOLD")) {
            config.rules.bait_threshold = value;
        }
        if let Some(value) = parse(read("FAW_TURN_LIMIT")) {
            config.rules.turn_limit = value;
        }
        if let Some(value) = parse::<u64>(read("FAW_ADAPTER_TIMEOUT_MS")) {
            config.rules.adapter_timeout = Duration::from_millis(value);
        }
        if let Some(value) = parse(read("FAW_CHAFF_CHARGES")) {
            config.rules.chaff_charges = value;
        }
        if let Some(frames) = read("FAW_CANDIDATE_FRAMES") {
            let labels: Vec<String> = frames
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect();
            if !labels.is_empty() {
                config.rules = config.rules.with_candidate_frames(labels);
            }
        }

        if let Some(value) = parse(read("FAW_BOARD_ROWS")) {
            config.board.rows = value;
        }
        if let Some(value) = parse(read("FAW_BOARD_COLS")) {
            config.board.cols = value;
        }
        if let Some(value) = parse(read("FAW_SHIPS")) {
            config.board.ships = value;
        }
        if let Some(value) = parse(read("FAW_HOSTAGES")) {
            config.board.hostages = value;
        }
        if let Some(value) = parse(read("FAW_SEED")) {
            config.board.seed = value;
        }
        if let Some(value) = parse(read("FAW_CONFIDENCE")) {
            config.rules.confidence = value;
        }

        config.session_id = read("FAW_SESSION_ID");
        config.save_dir = read("FAW_SAVE_DIR").map(PathBuf::from);
        config
    }

    /// Configured session id, or a timestamp-based one.
    pub fn session_id(&self) -> String {
        self.session_id
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string())
    }
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.trim().parse().ok()
}
