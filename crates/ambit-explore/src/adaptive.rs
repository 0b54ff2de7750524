//! Adaptive neighbourhood sizing.
//!
//! A bounded search over a scale factor applied to the calibrated
//! `primary_d` radius, aiming for a neighbourhood whose size falls inside
//! a target window. It relies on the index returning at least as many
//! tracks for a larger radius as for a smaller one.

use ambit_core::{
    Embedding, Neighbor, RadiusOverride, SpatialIndex, TrackId, TrackSummary, PRIMARY_D,
};
use serde::{Deserialize, Serialize};

use crate::engine::ExplorationEngine;
use crate::error::{ExploreError, ExploreResult};
use crate::options::AdaptiveOptions;

/// Base radius when the index has no `primary_d` calibration.
pub const FALLBACK_BASE_RADIUS: f64 = 0.2;

/// Smallest outer radius ever queried.
pub const MIN_RADIUS: f64 = 1e-5;

/// Growth stops once the scale passes this factor.
pub const MAX_SCALE: f64 = 64.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveNeighborhood {
    pub current_track: TrackSummary,
    #[serde(skip)]
    pub neighbors: Vec<Neighbor>,
    pub radius: f64,
    pub scale: f64,
    pub count: usize,
    pub iterations: usize,
    pub within_target: bool,
}

/// One probe of the search.
struct Probe {
    neighbors: Vec<Neighbor>,
    radius: f64,
    scale: f64,
    count: usize,
}

impl<I: SpatialIndex + ?Sized> ExplorationEngine<'_, I> {
    /// Find a `primary_d` radius whose neighbourhood holds between
    /// `target_min` and `target_max` tracks.
    ///
    /// When no probe lands inside the window within `max_iterations`, the
    /// probe whose count was closest to the window's midpoint is returned
    /// with `within_target` unset.
    ///
    /// # Errors
    /// Fails when the track is unknown, has no PCA embedding, or a radius
    /// query fails.
    pub fn adaptive_neighborhood(
        &self,
        track_id: &TrackId,
        options: &AdaptiveOptions,
    ) -> ExploreResult<AdaptiveNeighborhood> {
        let track = self.resolve_track(track_id)?;
        if !track.has_pca() {
            return Err(ExploreError::MissingEmbedding {
                id: track.id.to_string(),
                embedding: Embedding::Pca,
            });
        }

        let base_radius = self
            .index()
            .calibration()
            .get(options.resolution, PRIMARY_D)
            .map_or(FALLBACK_BASE_RADIUS, |entry| entry.outer_radius);
        let mid = options.target_mid();

        let mut scale = initial_scale(options, base_radius);
        let mut lower = 0.0_f64;
        let mut upper = f64::INFINITY;
        let mut best: Option<Probe> = None;
        let mut iterations = 0;

        while iterations < options.max_iterations {
            iterations += 1;
            let radius = (base_radius * scale).max(MIN_RADIUS);
            let neighbors = self.index().pca_radius_search(
                &track,
                options.resolution,
                PRIMARY_D,
                options.limit,
                Some(RadiusOverride::ball(radius)),
            )?;
            let neighbors: Vec<Neighbor> = neighbors
                .into_iter()
                .filter(|neighbor| neighbor.track.id != track.id)
                .collect();
            let count = neighbors.len();
            log::debug!(
                "Adaptive probe {} for {}: scale {:.4} radius {:.5} -> {} tracks",
                iterations,
                track.id,
                scale,
                radius,
                count
            );

            let probe = Probe {
                neighbors,
                radius,
                scale,
                count,
            };

            if (options.target_min..=options.target_max).contains(&count) {
                return Ok(finish(track.summary(), probe, iterations, true));
            }

            let closer = best
                .as_ref()
                .map_or(true, |b| miss(count, mid) < miss(b.count, mid));
            if closer {
                best = Some(probe);
            }

            if count < options.target_min {
                lower = scale;
                scale = if upper.is_finite() {
                    (scale + upper) / 2.0
                } else {
                    scale * 2.0
                };
                if scale > MAX_SCALE {
                    log::debug!("Adaptive scale for {} passed {}x, stopping", track.id, MAX_SCALE);
                    break;
                }
            } else {
                upper = scale;
                scale = if lower > 0.0 {
                    (scale + lower) / 2.0
                } else {
                    scale / 2.0
                };
            }
        }

        log::warn!(
            "Adaptive neighbourhood for {} missed [{}, {}] after {} probes",
            track.id,
            options.target_min,
            options.target_max,
            iterations
        );
        match best {
            Some(probe) => Ok(finish(track.summary(), probe, iterations, false)),
            // Only reachable with max_iterations == 0.
            None => Ok(AdaptiveNeighborhood {
                current_track: track.summary(),
                neighbors: Vec::new(),
                radius: (base_radius * scale).max(MIN_RADIUS),
                scale,
                count: 0,
                iterations,
                within_target: false,
            }),
        }
    }
}

fn initial_scale(options: &AdaptiveOptions, base_radius: f64) -> f64 {
    let scale = options
        .initial_scale
        .or_else(|| options.initial_radius.map(|radius| radius / base_radius))
        .unwrap_or(1.0);
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn miss(count: usize, mid: f64) -> f64 {
    (count as f64 - mid).abs()
}

fn finish(
    current_track: TrackSummary,
    probe: Probe,
    iterations: usize,
    within_target: bool,
) -> AdaptiveNeighborhood {
    AdaptiveNeighborhood {
        current_track,
        neighbors: probe.neighbors,
        radius: probe.radius,
        scale: probe.scale,
        count: probe.count,
        iterations,
        within_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubIndex;
    use ambit_core::{PcaEmbedding, Resolution, Track};

    fn anchored() -> Vec<Track> {
        vec![Track::new("anchor").with_pca(PcaEmbedding::new(0.5))]
    }

    fn options() -> AdaptiveOptions {
        AdaptiveOptions {
            resolution: Resolution::MagnifyingGlass,
            ..AdaptiveOptions::default()
        }
    }

    #[test]
    fn test_hits_target_on_first_probe() {
        // Base radius 0.2 at scale 1 gives 400 tracks.
        let index = StubIndex::new(anchored()).with_radius_counts(|r| (r * 2000.0) as usize);
        let engine = ExplorationEngine::new(&index);

        let result = engine
            .adaptive_neighborhood(&TrackId::new("anchor"), &options())
            .unwrap();

        assert!(result.within_target);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.count, 400);
        assert_eq!(result.neighbors.len(), 400);
    }

    #[test]
    fn test_grows_until_inside_window() {
        // 400 tracks needs r = 0.8, scale 4.
        let index = StubIndex::new(anchored()).with_radius_counts(|r| (r * 500.0) as usize);
        let engine = ExplorationEngine::new(&index);

        let result = engine
            .adaptive_neighborhood(&TrackId::new("anchor"), &options())
            .unwrap();

        assert!(result.within_target);
        assert!((350..=450).contains(&result.count));
        assert_eq!(index.pca_radii().len(), result.iterations);
        let radii = index.pca_radii();
        assert!(radii.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_bisects_after_overshoot() {
        let index = StubIndex::new(anchored()).with_radius_counts(|r| (r * 1000.0) as usize);
        let engine = ExplorationEngine::new(&index);
        let options = AdaptiveOptions {
            initial_scale: Some(3.0),
            ..options()
        };

        let result = engine
            .adaptive_neighborhood(&TrackId::new("anchor"), &options)
            .unwrap();

        // 0.6 -> 600 (too many), 0.3 -> 300 (too few), 0.45 -> 450.
        assert!(result.within_target);
        assert_eq!(result.iterations, 3);
        assert!((result.scale - 2.25).abs() < f64::EPSILON);
        assert_eq!(result.count, 450);
    }

    #[test]
    fn test_returns_closest_probe_when_window_missed() {
        // A step function that jumps straight over the window.
        let index = StubIndex::new(anchored())
            .with_radius_counts(|r| if r < 0.5 { 300 } else { 600 });
        let engine = ExplorationEngine::new(&index);
        let options = AdaptiveOptions {
            limit: 5000,
            ..options()
        };

        let result = engine
            .adaptive_neighborhood(&TrackId::new("anchor"), &options)
            .unwrap();

        assert!(!result.within_target);
        assert_eq!(result.iterations, 6);
        // |300 - 400| < |600 - 400|
        assert_eq!(result.count, 300);
    }

    #[test]
    fn test_initial_radius_sets_scale() {
        let index = StubIndex::new(anchored()).with_radius_counts(|_| 400);
        let engine = ExplorationEngine::new(&index);
        let options = AdaptiveOptions {
            initial_radius: Some(0.1),
            ..options()
        };

        let result = engine
            .adaptive_neighborhood(&TrackId::new("anchor"), &options)
            .unwrap();

        assert!((result.scale - 0.5).abs() < 1e-12);
        assert!((result.radius - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_scale_ceiling_stops_growth() {
        let index = StubIndex::new(anchored()).with_radius_counts(|_| 10);
        let engine = ExplorationEngine::new(&index);
        let options = AdaptiveOptions {
            max_iterations: 20,
            ..options()
        };

        let result = engine
            .adaptive_neighborhood(&TrackId::new("anchor"), &options)
            .unwrap();

        // Scales 1, 2, 4, ... 64 are probed; 128 is never queried.
        assert!(!result.within_target);
        assert_eq!(result.iterations, 7);
        assert_eq!(index.pca_radii().len(), 7);
    }

    #[test]
    fn test_requires_pca() {
        let index = StubIndex::new(vec![Track::new("bare")]);
        let engine = ExplorationEngine::new(&index);

        let error = engine
            .adaptive_neighborhood(&TrackId::new("bare"), &options())
            .unwrap_err();
        assert!(matches!(error, ExploreError::MissingEmbedding { .. }));
    }
}
