//! Candidates that move along a single PCA axis.

use ambit_core::{
    Embedding, Neighbor, Polarity, RadiusOverride, Resolution, SpatialIndex, Track, TrackId,
    TrackSummary, PRIMARY_D,
};
use serde::{Deserialize, Serialize};

use crate::engine::{Candidate, ExplorationEngine};
use crate::error::{ExploreError, ExploreResult};
use crate::options::PcaDirectionOptions;

/// How many times `limit` neighbours to fetch before filtering by direction.
const PCA_POOL_FACTOR: usize = 10;

/// Zero-based component index for a `pc<N>` name (`pc1` is index 0).
pub fn parse_component_index(component: &str) -> ExploreResult<usize> {
    let digits = component
        .get(..2)
        .filter(|prefix| prefix.eq_ignore_ascii_case("pc"))
        .and_then(|_| component.get(2..))
        .ok_or_else(|| ExploreError::InvalidComponent(component.to_string()))?;
    match digits.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ExploreError::InvalidComponent(component.to_string())),
    }
}

/// Whether `candidate` lies in `direction` from `current` on a PCA axis.
///
/// For `primary_d` the scalar is compared and `component_index` is
/// ignored. A track missing the value is in no direction.
#[must_use]
pub fn is_in_pca_direction(
    candidate: &Track,
    current: &Track,
    domain: &str,
    component_index: usize,
    direction: Polarity,
) -> bool {
    match (
        current.pca_value(domain, component_index),
        candidate.pca_value(domain, component_index),
    ) {
        (Some(from), Some(to)) => direction.matches(from, to),
        _ => false,
    }
}

/// Where a PCA candidate search took its neighbourhood from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodSource {
    Precomputed,
    AdaptiveRadius,
    Calibrated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcaSearchParameters {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub component_index: usize,
    pub direction: Polarity,
    pub resolution: Resolution,
    pub source: NeighborhoodSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_radius: Option<f64>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcaDirectionalCandidates {
    pub current_track: TrackSummary,
    pub current_value: f64,
    pub candidates: Vec<Candidate>,
    /// Qualifying tracks before the limit was applied.
    pub total_available: usize,
    pub parameters: PcaSearchParameters,
}

impl<I: SpatialIndex + ?Sized> ExplorationEngine<'_, I> {
    /// Neighbours of `track_id` that move in `direction` along a PCA axis,
    /// nearest first.
    ///
    /// `component` names the axis inside `domain` (`pc1` when omitted) and
    /// is ignored for `primary_d`.
    ///
    /// # Errors
    /// Fails when the track is unknown, the component name is malformed,
    /// the track has no value on the axis, or the index query fails.
    pub fn pca_directional_candidates(
        &self,
        track_id: &TrackId,
        domain: &str,
        component: Option<&str>,
        direction: Polarity,
        options: &PcaDirectionOptions,
    ) -> ExploreResult<PcaDirectionalCandidates> {
        let track = self.resolve_track(track_id)?;
        let component_index = if domain == PRIMARY_D {
            0
        } else {
            parse_component_index(component.unwrap_or("pc1"))?
        };
        let current_value = track.pca_value(domain, component_index).ok_or_else(|| {
            ExploreError::MissingEmbedding {
                id: track.id.to_string(),
                embedding: Embedding::Pca,
            }
        })?;

        let (source, neighbors) = self.pca_neighborhood(&track, domain, options)?;

        let mut qualifying: Vec<(&Neighbor, f64)> = neighbors
            .iter()
            .filter(|neighbor| neighbor.track.id != track.id)
            .filter(|neighbor| {
                is_in_pca_direction(&neighbor.track, &track, domain, component_index, direction)
            })
            .filter_map(|neighbor| {
                let value = neighbor.track.pca_value(domain, component_index)?;
                Some((neighbor, value - current_value))
            })
            .collect();
        qualifying.sort_by(|a, b| a.0.distance.total_cmp(&b.0.distance));

        let total_available = qualifying.len();
        let candidates: Vec<Candidate> = qualifying
            .into_iter()
            .take(options.limit)
            .map(|(neighbor, delta)| Candidate::new(neighbor, Some(delta)))
            .collect();

        log::debug!(
            "{} {} candidates along {}[{}] for {} ({} available)",
            candidates.len(),
            direction,
            domain,
            component_index,
            track.id,
            total_available
        );

        Ok(PcaDirectionalCandidates {
            current_track: track.summary(),
            current_value,
            candidates,
            total_available,
            parameters: PcaSearchParameters {
                domain: domain.to_string(),
                component: component.map(str::to_string),
                component_index,
                direction,
                resolution: options.resolution,
                source,
                adaptive_radius: options.adaptive_radius,
                limit: options.limit,
            },
        })
    }

    fn pca_neighborhood(
        &self,
        track: &Track,
        domain: &str,
        options: &PcaDirectionOptions,
    ) -> ExploreResult<(NeighborhoodSource, Vec<Neighbor>)> {
        if let Some(neighbors) = &options.precomputed_neighbors {
            return Ok((NeighborhoodSource::Precomputed, neighbors.clone()));
        }
        let pool = options.limit.saturating_mul(PCA_POOL_FACTOR);
        if let Some(radius) = options.adaptive_radius {
            let neighbors = self.index().pca_radius_search(
                track,
                options.resolution,
                domain,
                pool,
                Some(RadiusOverride::ball(radius)),
            )?;
            return Ok((NeighborhoodSource::AdaptiveRadius, neighbors));
        }
        let neighbors =
            self.index()
                .pca_radius_search(track, options.resolution, domain, pool, None)?;
        Ok((NeighborhoodSource::Calibrated, neighbors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubIndex;
    use ambit_core::PcaEmbedding;

    fn pca_track(id: &str, primary_d: f64, tonal: &[f64]) -> Track {
        Track::new(id).with_pca(PcaEmbedding::new(primary_d).with_domain("tonal", tonal.to_vec()))
    }

    fn library() -> Vec<Track> {
        vec![
            pca_track("anchor", 0.50, &[0.0, 0.0]),
            pca_track("up-near", 0.52, &[0.1, -0.3]),
            pca_track("up-far", 0.70, &[0.2, 0.4]),
            pca_track("down", 0.40, &[-0.1, 0.2]),
            pca_track("same", 0.50, &[0.0, 0.0]),
            Track::new("no-pca"),
        ]
    }

    #[test]
    fn test_parse_component_index() {
        assert_eq!(parse_component_index("pc1").unwrap(), 0);
        assert_eq!(parse_component_index("PC3").unwrap(), 2);
        assert!(parse_component_index("pc0").is_err());
        assert!(parse_component_index("p1").is_err());
        assert!(parse_component_index("pcx").is_err());
        assert!(parse_component_index("").is_err());
    }

    #[test]
    fn test_primary_d_direction_is_antisymmetric() {
        let a = pca_track("a", 0.3, &[]);
        let b = pca_track("b", 0.6, &[]);
        for polarity in [Polarity::Positive, Polarity::Negative] {
            assert_eq!(
                is_in_pca_direction(&a, &b, PRIMARY_D, 0, polarity),
                is_in_pca_direction(&b, &a, PRIMARY_D, 0, polarity.opposite())
            );
        }
        assert!(is_in_pca_direction(&b, &a, PRIMARY_D, 5, Polarity::Positive));
    }

    #[test]
    fn test_component_direction_uses_index() {
        let anchor = pca_track("a", 0.0, &[0.0, 0.0]);
        let other = pca_track("b", 0.0, &[-1.0, 1.0]);
        assert!(is_in_pca_direction(&other, &anchor, "tonal", 1, Polarity::Positive));
        assert!(is_in_pca_direction(&other, &anchor, "tonal", 0, Polarity::Negative));
        assert!(!is_in_pca_direction(&other, &anchor, "tonal", 2, Polarity::Positive));
    }

    #[test]
    fn test_primary_d_candidates_sorted_and_exclude_anchor() {
        let index = StubIndex::new(library());
        let engine = ExplorationEngine::new(&index);

        let result = engine
            .pca_directional_candidates(
                &TrackId::new("anchor"),
                PRIMARY_D,
                None,
                Polarity::Positive,
                &PcaDirectionOptions::default(),
            )
            .unwrap();

        let ids: Vec<&str> = result.candidates.iter().map(|c| c.track.id.as_str()).collect();
        assert_eq!(ids, ["up-near", "up-far"]);
        assert_eq!(result.total_available, 2);
        assert_eq!(result.parameters.source, NeighborhoodSource::Calibrated);
        assert!(result.candidates.iter().all(|c| c.delta.unwrap() > 0.0));
    }

    #[test]
    fn test_limit_keeps_total_available() {
        let index = StubIndex::new(library());
        let engine = ExplorationEngine::new(&index);
        let options = PcaDirectionOptions {
            limit: 1,
            ..PcaDirectionOptions::default()
        };

        let result = engine
            .pca_directional_candidates(
                &TrackId::new("anchor"),
                "tonal",
                Some("pc2"),
                Polarity::Positive,
                &options,
            )
            .unwrap();

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.total_available, 2);
        assert_eq!(result.parameters.component_index, 1);
    }

    #[test]
    fn test_precomputed_neighbors_skip_the_index() {
        let index = StubIndex::new(library()).failing_mode(ambit_core::SearchMode::Pca);
        let engine = ExplorationEngine::new(&index);
        let anchor = index.track(&TrackId::new("anchor")).unwrap();
        let down = index.track(&TrackId::new("down")).unwrap();
        let options = PcaDirectionOptions {
            precomputed_neighbors: Some(vec![
                Neighbor::new(anchor, 0.0),
                Neighbor::new(down, 0.1),
            ]),
            ..PcaDirectionOptions::default()
        };

        let result = engine
            .pca_directional_candidates(
                &TrackId::new("anchor"),
                PRIMARY_D,
                None,
                Polarity::Negative,
                &options,
            )
            .unwrap();

        assert_eq!(result.parameters.source, NeighborhoodSource::Precomputed);
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].track.id.as_str(), "down");
    }

    #[test]
    fn test_adaptive_radius_queries_a_ball() {
        let index = StubIndex::new(library());
        let engine = ExplorationEngine::new(&index);
        let options = PcaDirectionOptions {
            adaptive_radius: Some(0.33),
            ..PcaDirectionOptions::default()
        };

        let result = engine
            .pca_directional_candidates(
                &TrackId::new("anchor"),
                PRIMARY_D,
                None,
                Polarity::Negative,
                &options,
            )
            .unwrap();

        assert_eq!(result.parameters.source, NeighborhoodSource::AdaptiveRadius);
        assert_eq!(index.pca_radii(), [0.33]);
    }

    #[test]
    fn test_track_without_pca_is_missing_embedding() {
        let index = StubIndex::new(library());
        let engine = ExplorationEngine::new(&index);

        let error = engine
            .pca_directional_candidates(
                &TrackId::new("no-pca"),
                PRIMARY_D,
                None,
                Polarity::Positive,
                &PcaDirectionOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(error, ExploreError::MissingEmbedding { .. }));
    }
}
