//! Candidates that move along a single VAE latent coordinate.
//!
//! Latent spaces can be sparse near the calibrated radius, so when the
//! calibrated search turns up nothing usable the search escalates through
//! a fixed ladder of wider radii and stops at the first rung that does.

use ambit_core::{
    Embedding, Neighbor, Polarity, Resolution, SpatialIndex, Track, TrackId, TrackSummary,
};
use serde::{Deserialize, Serialize};

use crate::engine::{Candidate, ExplorationEngine};
use crate::error::{ExploreError, ExploreResult};
use crate::options::VaeDirectionOptions;

/// Base radius the escalation multiples apply to.
pub const DEFAULT_VAE_RADIUS: f64 = 0.5;

/// Escalation ladder, tried in order.
pub const VAE_RADIUS_MULTIPLES: [f64; 4] = [2.0, 4.0, 6.0, 8.0];

/// How many times `limit` neighbours to fetch before filtering by direction.
const VAE_POOL_FACTOR: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaeDirectionalCandidates {
    pub current_track: TrackSummary,
    pub latent_index: usize,
    pub direction: Polarity,
    pub current_value: f64,
    /// Largest movement first.
    pub candidates: Vec<Candidate>,
    pub total_available: usize,
    pub resolution: Resolution,
    /// Radius of the search that produced the candidates.
    pub applied_radius: f64,
    /// Set when an escalated radius produced the candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_multiple: Option<f64>,
}

impl<I: SpatialIndex + ?Sized> ExplorationEngine<'_, I> {
    /// Neighbours of `track_id` whose latent coordinate `latent_index`
    /// moves in `direction`, largest movement first.
    ///
    /// # Errors
    /// Fails when the track is unknown, its latent vector is absent or too
    /// short, or the calibrated search itself fails.
    pub fn vae_directional_candidates(
        &self,
        track_id: &TrackId,
        latent_index: usize,
        direction: Polarity,
        options: &VaeDirectionOptions,
    ) -> ExploreResult<VaeDirectionalCandidates> {
        let track = self.resolve_track(track_id)?;
        let current_value = track
            .latent()
            .and_then(|latent| latent.get(latent_index))
            .copied()
            .ok_or_else(|| ExploreError::MissingEmbedding {
                id: track.id.to_string(),
                embedding: Embedding::Vae,
            })?;

        let pool = options.limit.saturating_mul(VAE_POOL_FACTOR);
        let calibrated = self
            .index()
            .vae_calibrated_search(&track, options.resolution, pool)?;

        let mut applied_radius = calibrated.applied_radius;
        let mut radius_multiple = None;
        let mut qualifying = qualify(&calibrated.neighbors, &track, latent_index, current_value, direction);

        if qualifying.is_empty() {
            log::info!(
                "No {} candidates on latent[{}] for {} within calibrated radius {}, escalating",
                direction,
                latent_index,
                track.id,
                applied_radius
            );
            for multiple in VAE_RADIUS_MULTIPLES {
                let radius = DEFAULT_VAE_RADIUS * multiple;
                let neighbors = match self.index().vae_radius_search(&track, radius, pool) {
                    Ok(neighbors) => neighbors,
                    Err(e) => {
                        log::warn!("VAE search at radius {} failed for {}: {}", radius, track.id, e);
                        Vec::new()
                    }
                };
                qualifying = qualify(&neighbors, &track, latent_index, current_value, direction);
                if !qualifying.is_empty() {
                    applied_radius = radius;
                    radius_multiple = Some(multiple);
                    break;
                }
            }
            if qualifying.is_empty() {
                log::warn!(
                    "No {} candidates on latent[{}] for {} after escalation",
                    direction,
                    latent_index,
                    track.id
                );
            }
        }

        let total_available = qualifying.len();
        let candidates = qualifying
            .into_iter()
            .take(options.limit)
            .map(|(neighbor, delta)| Candidate::new(&neighbor, Some(delta)))
            .collect();

        Ok(VaeDirectionalCandidates {
            current_track: track.summary(),
            latent_index,
            direction,
            current_value,
            candidates,
            total_available,
            resolution: options.resolution,
            applied_radius,
            radius_multiple,
        })
    }
}

/// Neighbours moving in `direction` on one latent coordinate with their
/// deltas, largest movement first.
fn qualify(
    neighbors: &[Neighbor],
    anchor: &Track,
    latent_index: usize,
    current_value: f64,
    direction: Polarity,
) -> Vec<(Neighbor, f64)> {
    let mut qualifying: Vec<(Neighbor, f64)> = neighbors
        .iter()
        .filter(|neighbor| neighbor.track.id != anchor.id)
        .filter_map(|neighbor| {
            let value = *neighbor.track.latent()?.get(latent_index)?;
            direction
                .matches(current_value, value)
                .then(|| (neighbor.clone(), value - current_value))
        })
        .collect();
    qualifying.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    qualifying
}
