//! Error types for the exploration engine.

use ambit_core::{Embedding, SearchMode};
use thiserror::Error;

/// Errors surfaced by the exploration engine.
///
/// Internal recoveries (mode fallback, radius escalation, best-effort
/// calibration) never produce one of these; they return a normal result
/// that records which strategy succeeded.
#[derive(Debug, Error)]
pub enum ExploreError {
    /// The anchor track is not in the index.
    #[error("track not found: {id}")]
    TrackNotFound { id: String },

    /// The operation needs an embedding the anchor track does not carry.
    #[error("track {id} has no {embedding} embedding")]
    MissingEmbedding { id: String, embedding: Embedding },

    /// Every neighbourhood search strategy failed.
    #[error("no search mode could serve track {id} (tried {}): {source}", format_modes(.attempted))]
    SearchUnavailable {
        id: String,
        attempted: Vec<SearchMode>,
        #[source]
        source: ambit_core::Error,
    },

    /// A PCA component name that is not `pc<N>` with `N >= 1`.
    #[error("invalid PCA component: {0}")]
    InvalidComponent(String),

    /// An error propagated from the index.
    #[error("index error: {0}")]
    Index(#[from] ambit_core::Error),
}

impl ExploreError {
    /// Returns `true` when the anchor track does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TrackNotFound { .. } | Self::Index(ambit_core::Error::TrackNotFound { .. })
        )
    }

    /// Returns `true` when the caller could retry with a different
    /// representation or search mode.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingEmbedding { .. }
                | Self::Index(
                    ambit_core::Error::MissingEmbedding { .. } | ambit_core::Error::Unsupported(_)
                )
        )
    }
}

fn format_modes(modes: &[SearchMode]) -> String {
    modes
        .iter()
        .map(|mode| mode.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Convenience alias for exploration results.
pub type ExploreResult<T> = std::result::Result<T, ExploreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_unavailable_message_names_track_and_modes() {
        let error = ExploreError::SearchUnavailable {
            id: "abc".to_string(),
            attempted: vec![SearchMode::Vae, SearchMode::Pca, SearchMode::Features],
            source: ambit_core::Error::Unsupported("offline".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains("abc"));
        assert!(message.contains("vae -> pca -> features"));
        assert!(message.contains("offline"));
    }

    #[test]
    fn test_predicates() {
        let not_found = ExploreError::TrackNotFound { id: "x".to_string() };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_recoverable());

        let missing = ExploreError::MissingEmbedding {
            id: "x".to_string(),
            embedding: Embedding::Vae,
        };
        assert!(missing.is_recoverable());
        assert!(!missing.is_not_found());
    }
}
