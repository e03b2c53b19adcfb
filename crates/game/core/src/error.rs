//! Common error infrastructure for fireatwill-core.
//!
//! Domain errors (`BoardError`, `ConfigError`, `DistributionError`,
//! `EngineError`, ...) live next to the types they validate. This module only
//! holds the shared classification used by the runtime to decide whether a
//! failure aborts the turn, the match, or nothing at all.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller may retry with a different input
/// - **Validation**: invalid input, rejected without retry
/// - **Internal**: unexpected state inconsistency; the turn must be discarded
/// - **Fatal**: the match cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an engine bug or corrupted state.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all fireatwill-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static identifier for this error variant, used in logs and
    /// tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
