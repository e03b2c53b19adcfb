//! Lore frames: the shared context that gives player instructions meaning.

use std::fmt;

/// A cultural reference frame such as "The plays of William Shakespeare".
///
/// Labels compare case-insensitively after trimming, so `"greek mythology"`
/// and `" Greek Mythology "` name the same frame.
#[derive(Clone, Debug, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoreFrame(String);

impl LoreFrame {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into().trim().to_string())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for LoreFrame {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl std::hash::Hash for LoreFrame {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for LoreFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LoreFrame {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for LoreFrame {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

/// One hypothesis the enemy keeps about which frame the player is using.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameCandidate {
    Named(LoreFrame),
    /// "Some frame not in the candidate list". Interpreted frame-agnostically.
    Residual,
}

impl FrameCandidate {
    pub fn frame(&self) -> Option<&LoreFrame> {
        match self {
            Self::Named(frame) => Some(frame),
            Self::Residual => None,
        }
    }

    pub fn is_residual(&self) -> bool {
        matches!(self, Self::Residual)
    }
}

impl fmt::Display for FrameCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(frame) => write!(f, "{frame}"),
            Self::Residual => f.write_str("<residual>"),
        }
    }
}
