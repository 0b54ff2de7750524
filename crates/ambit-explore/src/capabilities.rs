//! Which search spaces a track can be explored in.

use ambit_core::{SearchMode, SpatialIndex, Track, TrackId};
use serde::{Deserialize, Serialize};

use crate::engine::ExplorationEngine;
use crate::error::ExploreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSearchModes {
    /// Raw features are always searchable.
    pub features: bool,
    pub pca: bool,
    pub vae: bool,
    pub recommended: SearchMode,
}

/// The richest space the track is embedded in: VAE, then PCA, then raw
/// features.
#[must_use]
pub fn recommended_search_mode(track: &Track) -> SearchMode {
    if track.has_vae_latent() {
        SearchMode::Vae
    } else if track.has_pca() {
        SearchMode::Pca
    } else {
        SearchMode::Features
    }
}

impl<I: SpatialIndex + ?Sized> ExplorationEngine<'_, I> {
    /// Search spaces available for `track_id`.
    pub fn available_search_modes(&self, track_id: &TrackId) -> ExploreResult<AvailableSearchModes> {
        let track = self.resolve_track(track_id)?;
        Ok(AvailableSearchModes {
            features: true,
            pca: track.has_pca(),
            vae: track.has_vae_latent(),
            recommended: recommended_search_mode(&track),
        })
    }
}
