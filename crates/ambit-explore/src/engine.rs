//! The exploration pipeline.
//!
//! [`ExplorationEngine::explore_from_track`] runs four stages against a
//! borrowed index: neighbourhood search with mode fallback, diversity
//! analysis over every configured dimension, relevant-dimension selection,
//! and directional candidate retrieval for each selected dimension.
//!
//! The engine holds nothing but a shared reference to the index, so it is
//! `Copy` and any number of calls may run in parallel.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use ambit_core::{
    DirectionLabels, DirectionalCandidates, Neighbor, Polarity, SearchMode, SpatialIndex, Track,
    TrackId, TrackSummary,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diversity::{analyze_dimensional_diversity, select_relevant_dimensions, RelevantDimension};
use crate::error::{ExploreError, ExploreResult};
use crate::mode::{neighborhood_plan, resolve_search_mode, search_neighborhood, SearchAttempt};
use crate::options::ExploreOptions;

/// A proposed next track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub track: TrackSummary,
    pub distance: f64,
    /// Signed movement from the anchor along the axis being explored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

impl Candidate {
    pub(crate) fn new(neighbor: &Neighbor, delta: Option<f64>) -> Self {
        Self {
            track: neighbor.track.summary(),
            distance: neighbor.distance,
            delta,
        }
    }
}

/// Candidates for one polarity of an exploration axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionSide {
    /// The semantic label queried, e.g. `faster`.
    pub direction: String,
    pub polarity: Polarity,
    pub total_available: usize,
    pub candidates: Vec<Candidate>,
}

impl DirectionSide {
    fn empty(direction: &str, polarity: Polarity) -> Self {
        Self {
            direction: direction.to_string(),
            polarity,
            total_available: 0,
            candidates: Vec::new(),
        }
    }

    fn from_query(direction: &str, polarity: Polarity, found: &DirectionalCandidates) -> Self {
        let candidates = found
            .candidates
            .iter()
            .map(|neighbor| {
                let delta = neighbor
                    .track
                    .feature(&found.dimension)
                    .map(|value| value - found.current_value);
                Candidate::new(neighbor, delta)
            })
            .collect();
        Self {
            direction: direction.to_string(),
            polarity,
            total_available: found.total_available,
            candidates,
        }
    }
}

/// Both polarities of one selected dimension, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalOption {
    pub dimension: String,
    pub exploration_potential: f64,
    pub context_label: String,
    /// `false` when the dimension has no entry in the label table and the
    /// fallback labels were used.
    pub labels_mapped: bool,
    pub positive: DirectionSide,
    pub negative: DirectionSide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodSummary {
    pub size: usize,
    pub average_distance: f64,
    /// The mode resolved from the request, before any fallback.
    pub search_mode: SearchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCapabilities {
    #[serde(rename = "hasVAE")]
    pub has_vae: bool,
    #[serde(rename = "hasPCA")]
    pub has_pca: bool,
    /// The mode whose search supplied the neighbourhood.
    pub used_mode: SearchMode,
    pub attempts: Vec<SearchAttempt>,
}

/// Everything `explore_from_track` learned about an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationResult {
    pub current_track: TrackSummary,
    pub neighborhood: NeighborhoodSummary,
    pub search_capabilities: SearchCapabilities,
    pub relevant_dimensions: usize,
    pub directional_options: Vec<DirectionalOption>,
    pub computation_time_ms: u64,
    pub generated_at: DateTime<Utc>,
}

/// Exploration queries over a read-only spatial index.
pub struct ExplorationEngine<'a, I: SpatialIndex + ?Sized> {
    index: &'a I,
}

impl<I: SpatialIndex + ?Sized> Clone for ExplorationEngine<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: SpatialIndex + ?Sized> Copy for ExplorationEngine<'_, I> {}

impl<I: SpatialIndex + ?Sized> fmt::Debug for ExplorationEngine<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorationEngine")
            .field("tracks", &self.index.tracks().len())
            .field("dimensions", &self.index.dimensions().len())
            .finish()
    }
}

impl<'a, I: SpatialIndex + ?Sized> ExplorationEngine<'a, I> {
    #[must_use]
    pub const fn new(index: &'a I) -> Self {
        Self { index }
    }

    #[must_use]
    pub const fn index(&self) -> &'a I {
        self.index
    }

    pub(crate) fn resolve_track(&self, id: &TrackId) -> ExploreResult<Arc<Track>> {
        self.index.track(id).ok_or_else(|| ExploreError::TrackNotFound {
            id: id.to_string(),
        })
    }

    /// Find a neighbourhood for `track_id` and the directions worth taking
    /// from it.
    ///
    /// # Errors
    /// Returns [`ExploreError::TrackNotFound`] for an unknown id and
    /// [`ExploreError::SearchUnavailable`] when every search strategy fails.
    pub fn explore_from_track(
        &self,
        track_id: &TrackId,
        options: &ExploreOptions,
    ) -> ExploreResult<ExplorationResult> {
        let started = Instant::now();
        let track = self.resolve_track(track_id)?;

        let resolved = resolve_search_mode(
            options.search_mode,
            options.use_pca,
            options.use_vae,
            &track,
        );
        log::debug!(
            "Exploring from {} (requested {}, resolved {})",
            track.id,
            options.search_mode,
            resolved
        );

        let plan = neighborhood_plan(resolved, &track);
        let outcome = search_neighborhood(self.index, &track, &plan, options)?;
        let neighbors = outcome.neighbors;

        let analysis = analyze_dimensional_diversity(&track, &neighbors, self.index.dimensions());
        let relevant = select_relevant_dimensions(&analysis, &options.selection_criteria());
        log::debug!(
            "{} of {} dimensions selected for {}",
            relevant.len(),
            analysis.len(),
            track.id
        );

        let directional_options: Vec<DirectionalOption> = relevant
            .iter()
            .map(|dimension| self.directional_option(&track, dimension, options))
            .collect();

        let average_distance = if neighbors.is_empty() {
            0.0
        } else {
            neighbors.iter().map(|n| n.distance).sum::<f64>() / neighbors.len() as f64
        };

        let computation_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Explored {} in {}ms: {} neighbours via {}, {} directions",
            track.id,
            computation_time_ms,
            neighbors.len(),
            outcome.used_mode,
            directional_options.len()
        );

        Ok(ExplorationResult {
            current_track: track.summary(),
            neighborhood: NeighborhoodSummary {
                size: neighbors.len(),
                average_distance,
                search_mode: resolved,
            },
            search_capabilities: SearchCapabilities {
                has_vae: track.has_vae_latent(),
                has_pca: track.has_pca(),
                used_mode: outcome.used_mode,
                attempts: outcome.attempts,
            },
            relevant_dimensions: relevant.len(),
            directional_options,
            computation_time_ms,
            generated_at: Utc::now(),
        })
    }

    fn directional_option(
        &self,
        track: &Track,
        dimension: &RelevantDimension,
        options: &ExploreOptions,
    ) -> DirectionalOption {
        let labels = DirectionLabels::for_dimension(&dimension.dimension);
        if !labels.is_mapped() {
            log::warn!(
                "No direction labels for dimension {} of {}, querying {}/{}",
                dimension.dimension,
                track.id,
                labels.positive(),
                labels.negative()
            );
        }

        DirectionalOption {
            dimension: dimension.dimension.clone(),
            exploration_potential: dimension.exploration_potential,
            context_label: dimension.context_label.clone(),
            labels_mapped: labels.is_mapped(),
            positive: self.direction_side(track, labels, Polarity::Positive, options),
            negative: self.direction_side(track, labels, Polarity::Negative, options),
        }
    }

    fn direction_side(
        &self,
        track: &Track,
        labels: DirectionLabels,
        polarity: Polarity,
        options: &ExploreOptions,
    ) -> DirectionSide {
        let direction = labels.label(polarity);
        match self.index.directional_candidates(
            &track.id,
            direction,
            options.weights.as_ref(),
            &options.ignore_dimensions,
        ) {
            Ok(found) => DirectionSide::from_query(direction, polarity, &found),
            Err(e) => {
                log::warn!("Directional query {} failed for {}: {}", direction, track.id, e);
                DirectionSide::empty(direction, polarity)
            }
        }
    }
}
