//! Interpretation oracles.
//!
//! An [`InterpretationOracle`] turns the channel history and an optional lore
//! frame into an [`ActionDistribution`]. Oracles are untrusted: the
//! [`InterpretationAdapter`] wraps every call with a timeout, normalizes the
//! answer and substitutes a neutral fallback when anything goes wrong.

mod adapter;
mod literal;
mod scripted;

pub use adapter::{Interpretation, InterpretationAdapter, TurnInterpretations};
pub use literal::LiteralCoordinateOracle;
pub use scripted::{FailingOracle, ScriptedOracle, StalledOracle};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fireatwill_core::{ActionDistribution, LoreFrame, Message, TurnIndex};

/// Input to a single interpretation call.
///
/// `frame` is `None` for frame-agnostic queries, which is how the residual
/// candidate is probed.
#[derive(Clone, Debug, PartialEq)]
pub struct OracleRequest {
    pub turn: TurnIndex,
    pub history: Arc<[Message]>,
    pub frame: Option<LoreFrame>,
    pub rows: u8,
    pub cols: u8,
}

impl OracleRequest {
    pub fn latest(&self) -> Option<&Message> {
        self.history.last()
    }

    pub fn for_frame(&self, frame: Option<LoreFrame>) -> Self {
        Self {
            frame,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("interpretation timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("malformed interpretation: {0}")]
    Malformed(String),
}

/// External capability mapping (history, frame) to a fire distribution.
#[async_trait]
pub trait InterpretationOracle: Send + Sync {
    async fn interpret(&self, request: &OracleRequest)
    -> Result<ActionDistribution, OracleError>;
}

#[async_trait]
impl<T> InterpretationOracle for Arc<T>
where
    T: InterpretationOracle + ?Sized,
{
    async fn interpret(
        &self,
        request: &OracleRequest,
    ) -> Result<ActionDistribution, OracleError> {
        (**self).interpret(request).await
    }
}
