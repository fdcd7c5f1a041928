//! Error taxonomy for the text engine.
//!
//! - Contract violations (`RangeError`) fail fast and are never clamped.
//! - Resource exhaustion (`UnknownsError`) asks the caller to shrink the request.
//! - Unsupported languages (`LanguageError`) are safe to show to the end user.
//! - Service failures (`EngineError`) are cloned out to every waiter of a batch.
//!
//! `VoxError` is the umbrella used by the request-level entry points.

/// Offsets that do not describe a valid region of a source snapshot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid range [{start}, {stop}) for source of length {len}")]
    InvalidRange { start: usize, stop: usize, len: usize },

    #[error("inverted range: start {start} is after stop {stop}")]
    Inverted { start: usize, stop: usize },

    #[error("offset {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("change at {new} overlaps existing change at {existing}")]
    Overlapping { new: String, existing: String },
}

/// Out-of-vocabulary substitution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownsError {
    #[error("more than {max} distinct unknown words in one request")]
    HitMaxUnknowns { max: usize },
}

/// Language lookup failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    #[error("{feature} is not supported for {language}")]
    FeatureNotSupported { language: String, feature: String },
}

/// Translation service failures, shared by every caller of a batch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("translation service failed: {0}")]
    Transport(String),

    #[error("translation service returned {got} results for {expected} requests")]
    MismatchedBatch { expected: usize, got: usize },

    #[error("request was dropped before the batch completed")]
    Dropped,
}

/// Umbrella error for resolver and engine entry points
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoxError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Unknowns(#[from] UnknownsError),

    #[error(transparent)]
    Language(#[from] LanguageError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("unresolved placeholder <%{0}%>")]
    UnresolvedPlaceholder(String),
}

impl VoxError {
    /// Whether the message can be shown to the end user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, VoxError::Language(_) | VoxError::Unknowns(_))
    }
}

impl LanguageError {
    pub fn not_supported(language: impl Into<String>, feature: impl Into<String>) -> Self {
        LanguageError::FeatureNotSupported {
            language: language.into(),
            feature: feature.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_flag() {
        let lang: VoxError = LanguageError::not_supported("cobol", "snippets").into();
        assert!(lang.is_user_facing());
        assert_eq!(lang.to_string(), "snippets is not supported for cobol");

        let range: VoxError = RangeError::Inverted { start: 3, stop: 1 }.into();
        assert!(!range.is_user_facing());

        let engine: VoxError = EngineError::Transport("timeout".into()).into();
        assert!(!engine.is_user_facing());
    }
}
