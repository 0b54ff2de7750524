//! Scripted `SpatialIndex` for exercising fallback paths.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use ambit_core::{
    CalibratedNeighbors, CalibrationSettings, Dimension, DirectionalCandidates, Error,
    FeatureWeights, IndexStats, Neighbor, PcaDirection, RadiusOverride, Resolution, Result,
    SearchMode, SmartSearchOptions, SpatialIndex, Track, TrackId, LATENT_DISCRIMINATOR,
};

type RadiusCounts = Box<dyn Fn(f64) -> usize>;

/// A track with a title and a single `bpm` feature.
pub(crate) fn feature_track(id: &str, bpm: f64) -> Track {
    Track::new(id)
        .with_title(format!("Track {id}"))
        .with_artist("Stub")
        .with_feature("bpm", bpm)
}

/// In-memory index whose failures and result sizes are scripted.
///
/// Distances are plain absolute or Euclidean differences and no query
/// applies a radius filter except the VAE ones, which the escalation
/// tests depend on.
pub(crate) struct StubIndex {
    tracks: Vec<Arc<Track>>,
    dimensions: Vec<String>,
    calibration: CalibrationSettings,
    failing_modes: BTreeSet<&'static str>,
    failing_directions: BTreeSet<String>,
    radius_counts: Option<RadiusCounts>,
    pca_radii: RefCell<Vec<f64>>,
    vae_radii: RefCell<Vec<f64>>,
}

impl fmt::Debug for StubIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubIndex")
            .field("tracks", &self.tracks.len())
            .field("dimensions", &self.dimensions)
            .field("failing_modes", &self.failing_modes)
            .field("failing_directions", &self.failing_directions)
            .field("radius_counts", &self.radius_counts.is_some())
            .finish_non_exhaustive()
    }
}

impl StubIndex {
    pub(crate) fn new(tracks: Vec<Track>) -> Self {
        let dimensions: BTreeSet<String> = tracks
            .iter()
            .flat_map(|track| track.features.keys().cloned())
            .collect();
        Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
            dimensions: dimensions.into_iter().collect(),
            calibration: CalibrationSettings::builtin(),
            failing_modes: BTreeSet::new(),
            failing_directions: BTreeSet::new(),
            radius_counts: None,
            pca_radii: RefCell::new(Vec::new()),
            vae_radii: RefCell::new(Vec::new()),
        }
    }

    /// Every query in `mode` returns `Unsupported`.
    pub(crate) fn failing_mode(mut self, mode: SearchMode) -> Self {
        self.failing_modes.insert(mode.as_str());
        self
    }

    /// Directional queries for `label` return an error.
    pub(crate) fn failing_direction(mut self, label: &str) -> Self {
        self.failing_directions.insert(label.to_string());
        self
    }

    /// PCA queries return `counts(outer_radius)` synthetic neighbours.
    pub(crate) fn with_radius_counts(mut self, counts: impl Fn(f64) -> usize + 'static) -> Self {
        self.radius_counts = Some(Box::new(counts));
        self
    }

    pub(crate) fn with_calibration(mut self, calibration: CalibrationSettings) -> Self {
        self.calibration = calibration;
        self
    }

    /// Outer radii of every PCA query, in call order.
    pub(crate) fn pca_radii(&self) -> Vec<f64> {
        self.pca_radii.borrow().clone()
    }

    /// Radii of every fixed-radius VAE query, in call order.
    pub(crate) fn vae_radii(&self) -> Vec<f64> {
        self.vae_radii.borrow().clone()
    }

    fn check(&self, mode: SearchMode) -> Result<()> {
        if self.failing_modes.contains(mode.as_str()) {
            return Err(Error::Unsupported(format!("{mode} disabled in stub")));
        }
        Ok(())
    }

    fn others<'a>(&'a self, anchor: &'a Track) -> impl Iterator<Item = &'a Arc<Track>> + 'a {
        self.tracks.iter().filter(move |track| track.id != anchor.id)
    }

    fn latent_within(&self, anchor: &Track, radius: f64, limit: usize) -> Result<Vec<Neighbor>> {
        let Some(latent) = anchor.latent() else {
            return Err(Error::MissingEmbedding {
                id: anchor.id.to_string(),
                embedding: ambit_core::Embedding::Vae,
            });
        };
        let mut neighbors: Vec<Neighbor> = self
            .others(anchor)
            .filter_map(|track| {
                let other = track.latent()?;
                let distance = latent
                    .iter()
                    .zip(other)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                (distance <= radius).then(|| Neighbor::new(Arc::clone(track), distance))
            })
            .collect();
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(limit);
        Ok(neighbors)
    }
}

impl SpatialIndex for StubIndex {
    fn track(&self, id: &TrackId) -> Option<Arc<Track>> {
        self.tracks.iter().find(|track| &track.id == id).cloned()
    }

    fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    fn calibration(&self) -> &CalibrationSettings {
        &self.calibration
    }

    fn pca_directions(&self) -> &[PcaDirection] {
        &[]
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            track_count: self.tracks.len(),
            dimension_count: self.dimensions.len(),
            ..IndexStats::default()
        }
    }

    fn radius_search(
        &self,
        track: &Track,
        _radius: f64,
        _weights: Option<&FeatureWeights>,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        self.check(SearchMode::Features)?;
        let mut neighbors: Vec<Neighbor> = self
            .others(track)
            .map(|other| {
                let distance = track
                    .features
                    .iter()
                    .filter_map(|(name, value)| other.feature(name).map(|v| (v - value).powi(2)))
                    .sum::<f64>()
                    .sqrt();
                Neighbor::new(Arc::clone(other), distance)
            })
            .collect();
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    fn pca_radius_search(
        &self,
        track: &Track,
        resolution: Resolution,
        discriminator: &str,
        limit: usize,
        overrides: Option<RadiusOverride>,
    ) -> Result<Vec<Neighbor>> {
        self.check(SearchMode::Pca)?;
        let outer = overrides
            .map(|radii| radii.outer_radius)
            .or_else(|| {
                self.calibration
                    .get(resolution, discriminator)
                    .map(|entry| entry.outer_radius)
            })
            .unwrap_or(f64::INFINITY);
        self.pca_radii.borrow_mut().push(outer);

        if let Some(counts) = &self.radius_counts {
            let count = counts(outer).min(limit);
            return Ok((0..count)
                .map(|i| {
                    let synthetic = Track::new(format!("synthetic-{i}"));
                    Neighbor::new(Arc::new(synthetic), outer * (i + 1) as f64 / count as f64)
                })
                .collect());
        }

        let Some(anchor) = track.pca.as_ref() else {
            return Err(Error::MissingEmbedding {
                id: track.id.to_string(),
                embedding: ambit_core::Embedding::Pca,
            });
        };
        let mut neighbors: Vec<Neighbor> = self
            .others(track)
            .filter_map(|other| {
                let pca = other.pca.as_ref()?;
                let distance = (pca.primary_d - anchor.primary_d).abs();
                Some(Neighbor::new(Arc::clone(other), distance))
            })
            .collect();
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    fn vae_radius_search(&self, track: &Track, radius: f64, limit: usize) -> Result<Vec<Neighbor>> {
        self.check(SearchMode::Vae)?;
        self.vae_radii.borrow_mut().push(radius);
        self.latent_within(track, radius, limit)
    }

    fn vae_calibrated_search(
        &self,
        track: &Track,
        resolution: Resolution,
        limit: usize,
    ) -> Result<CalibratedNeighbors> {
        self.check(SearchMode::Vae)?;
        let radius = self
            .calibration
            .get(resolution, LATENT_DISCRIMINATOR)
            .map_or(0.5, |entry| entry.outer_radius);
        Ok(CalibratedNeighbors {
            neighbors: self.latent_within(track, radius, limit)?,
            applied_radius: radius,
        })
    }

    fn smart_radius_search(
        &self,
        track: &Track,
        options: &SmartSearchOptions,
    ) -> Result<Vec<Neighbor>> {
        match options.mode {
            SearchMode::Vae => self
                .vae_calibrated_search(track, options.resolution, options.limit)
                .map(|calibrated| calibrated.neighbors),
            SearchMode::Pca => self.pca_radius_search(
                track,
                options.resolution,
                &options.discriminator,
                options.limit,
                None,
            ),
            SearchMode::Features | SearchMode::Auto => self.radius_search(
                track,
                options.radius,
                options.weights.as_ref(),
                options.limit,
            ),
        }
    }

    fn directional_candidates(
        &self,
        track_id: &TrackId,
        direction: &str,
        _weights: Option<&FeatureWeights>,
        _ignore_dimensions: &[String],
    ) -> Result<DirectionalCandidates> {
        if self.failing_directions.contains(direction) {
            return Err(Error::Unsupported(format!("{direction} disabled in stub")));
        }
        let anchor = self.track(track_id).ok_or_else(|| Error::TrackNotFound {
            id: track_id.to_string(),
        })?;
        let (dimension, polarity) = Dimension::from_direction_label(direction)
            .ok_or_else(|| Error::UnknownDirection(direction.to_string()))?;
        let current_value = anchor.feature(dimension.as_str()).unwrap_or_default();

        let mut candidates: Vec<Neighbor> = self
            .others(&anchor)
            .filter_map(|other| {
                let value = other.feature(dimension.as_str())?;
                polarity
                    .matches(current_value, value)
                    .then(|| Neighbor::new(Arc::clone(other), (value - current_value).abs()))
            })
            .collect();
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(DirectionalCandidates {
            total_available: candidates.len(),
            candidates,
            dimension: dimension.as_str().to_string(),
            current_value,
        })
    }
}
