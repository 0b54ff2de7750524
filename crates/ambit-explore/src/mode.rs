//! Search-mode resolution and the neighbourhood fallback chain.
//!
//! Resolution picks one mode from the request flags and what the anchor
//! track carries. The chosen mode then expands into an ordered plan of
//! strategies; the first strategy whose query succeeds supplies the
//! neighbourhood, and every attempt is recorded in the outcome.

use ambit_core::{Neighbor, SearchMode, SmartSearchOptions, SpatialIndex, Track};
use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};
use crate::options::ExploreOptions;

/// Pick the search mode for an exploration request.
///
/// Precedence: a VAE request wins when the track has a latent; then PCA
/// in auto mode when the track has PCA; then plain features when auto mode
/// has PCA switched off; otherwise the requested mode stands as given.
#[must_use]
pub fn resolve_search_mode(
    requested: SearchMode,
    use_pca: bool,
    use_vae: bool,
    track: &Track,
) -> SearchMode {
    if use_vae && track.has_vae_latent() {
        SearchMode::Vae
    } else if use_pca && track.has_pca() && requested == SearchMode::Auto {
        SearchMode::Pca
    } else if requested == SearchMode::Auto && !use_pca {
        SearchMode::Features
    } else {
        requested
    }
}

/// One way of finding a neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborhoodStrategy {
    /// The index's mode-aware search.
    Smart(SearchMode),
    /// Plain weighted-distance search in raw feature space.
    LegacyRadius,
}

impl NeighborhoodStrategy {
    /// The mode reported when this strategy succeeds.
    #[must_use]
    pub const fn mode(self) -> SearchMode {
        match self {
            Self::Smart(mode) => mode,
            Self::LegacyRadius => SearchMode::Features,
        }
    }
}

/// Ordered strategies to try for a resolved mode.
#[must_use]
pub fn neighborhood_plan(resolved: SearchMode, track: &Track) -> Vec<NeighborhoodStrategy> {
    match resolved {
        SearchMode::Vae => {
            let mut plan = vec![NeighborhoodStrategy::Smart(SearchMode::Vae)];
            if track.has_pca() {
                plan.push(NeighborhoodStrategy::Smart(SearchMode::Pca));
            }
            plan.push(NeighborhoodStrategy::LegacyRadius);
            plan
        }
        SearchMode::Pca | SearchMode::Features | SearchMode::Auto => vec![
            NeighborhoodStrategy::Smart(resolved),
            NeighborhoodStrategy::LegacyRadius,
        ],
    }
}

/// A single strategy attempt and why it failed, if it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAttempt {
    pub mode: SearchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The neighbourhood produced by the first successful strategy.
#[derive(Debug, Clone)]
pub struct NeighborhoodOutcome {
    pub neighbors: Vec<Neighbor>,
    pub used_mode: SearchMode,
    pub attempts: Vec<SearchAttempt>,
}

/// Run `plan` in order until one strategy answers.
///
/// The anchor is removed from whatever the index returns.
pub fn search_neighborhood<I: SpatialIndex + ?Sized>(
    index: &I,
    track: &Track,
    plan: &[NeighborhoodStrategy],
    options: &ExploreOptions,
) -> ExploreResult<NeighborhoodOutcome> {
    let mut attempts = Vec::with_capacity(plan.len());
    let mut last_error = None;

    for &strategy in plan {
        let result = match strategy {
            NeighborhoodStrategy::Smart(mode) => {
                let smart = SmartSearchOptions {
                    mode,
                    resolution: options.resolution,
                    discriminator: options.discriminator.clone(),
                    radius: options.radius,
                    weights: options.weights.clone(),
                    limit: options.neighborhood_limit,
                };
                index.smart_radius_search(track, &smart)
            }
            NeighborhoodStrategy::LegacyRadius => index.radius_search(
                track,
                options.radius,
                options.weights.as_ref(),
                options.neighborhood_limit,
            ),
        };

        match result {
            Ok(mut neighbors) => {
                neighbors.retain(|neighbor| neighbor.track.id != track.id);
                attempts.push(SearchAttempt {
                    mode: strategy.mode(),
                    error: None,
                });
                if attempts.len() > 1 {
                    log::info!(
                        "Neighbourhood for {} served by {} after {} failed attempt(s)",
                        track.id,
                        strategy.mode(),
                        attempts.len() - 1
                    );
                }
                return Ok(NeighborhoodOutcome {
                    neighbors,
                    used_mode: strategy.mode(),
                    attempts,
                });
            }
            Err(e) => {
                log::warn!(
                    "{} search failed for {}: {}",
                    strategy.mode(),
                    track.id,
                    e
                );
                attempts.push(SearchAttempt {
                    mode: strategy.mode(),
                    error: Some(e.to_string()),
                });
                last_error = Some(e);
            }
        }
    }

    Err(ExploreError::SearchUnavailable {
        id: track.id.to_string(),
        attempted: attempts.iter().map(|attempt| attempt.mode).collect(),
        source: last_error.unwrap_or_else(|| {
            ambit_core::Error::Unsupported("no search strategy planned".to_string())
        }),
    })
}
