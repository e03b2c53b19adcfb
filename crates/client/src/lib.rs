//! Terminal client for Fire At Will.
//!
//! ```text
//! main
//!   ├─→ config   (environment overrides)
//!   ├─→ logging  (per-session file log)
//!   ├─→ session  (board setup, runtime, optional turn log)
//!   └─→ app      (prompt, play, render loop)
//! ```
pub mod app;
pub mod config;
pub mod logging;
pub mod session;

pub use app::App;
pub use config::{BoardSetup, ClientConfig};
pub use session::Session;
