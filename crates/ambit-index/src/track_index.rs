use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ambit_core::calibration::LATENT_DISCRIMINATOR;
use ambit_core::{
    CalibratedNeighbors, CalibrationSettings, Dimension, DirectionalCandidates, Embedding, Error,
    FeatureWeights, IndexStats, Neighbor, PcaDirection, RadiusOverride, Resolution, Result,
    SearchMode, SmartSearchOptions, SpatialIndex, Track, TrackId, PRIMARY_D,
};

/// Cap on the candidates returned per direction.
pub const MAX_DIRECTIONAL_CANDIDATES: usize = 50;

/// Latent radius used when the calibration has no `latent` entry.
pub const FALLBACK_VAE_RADIUS: f64 = 0.5;

/// A read-only index over a fixed set of tracks.
#[derive(Debug)]
pub struct TrackIndex {
    tracks: Vec<Arc<Track>>,
    by_id: HashMap<TrackId, usize>,
    dimensions: Vec<String>,
    /// Spread of each dimension across the library, used to normalise
    /// feature distances so bpm does not drown out 0..1 features.
    spreads: BTreeMap<String, f64>,
    calibration: CalibrationSettings,
    pca_directions: Vec<PcaDirection>,
    tracks_with_pca: usize,
    tracks_with_vae: usize,
    latent_width: usize,
}

impl TrackIndex {
    /// Build an index over `tracks`.
    ///
    /// # Errors
    /// Returns an error if two tracks share an id or a feature value is not
    /// finite.
    pub fn build(tracks: Vec<Track>, calibration: CalibrationSettings) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(tracks.len());
        let mut bounds: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        let mut domains: BTreeMap<String, usize> = BTreeMap::new();
        let mut tracks_with_pca = 0;
        let mut tracks_with_vae = 0;
        let mut latent_width = 0;

        for (position, track) in tracks.iter().enumerate() {
            if by_id.insert(track.id.clone(), position).is_some() {
                return Err(Error::InvalidData(format!("duplicate track id: {}", track.id)));
            }

            for (name, &value) in &track.features {
                if !value.is_finite() {
                    return Err(Error::InvalidData(format!(
                        "track {} has non-finite {name}",
                        track.id
                    )));
                }
                let entry = bounds.entry(name.clone()).or_insert((value, value));
                entry.0 = entry.0.min(value);
                entry.1 = entry.1.max(value);
            }

            if let Some(pca) = &track.pca {
                tracks_with_pca += 1;
                for (domain, components) in &pca.domains {
                    let width = domains.entry(domain.clone()).or_insert(0);
                    *width = (*width).max(components.len());
                }
            }

            if let Some(latent) = track.latent() {
                tracks_with_vae += 1;
                latent_width = latent_width.max(latent.len());
            }
        }

        let spreads: BTreeMap<String, f64> = bounds
            .into_iter()
            .map(|(name, (min, max))| {
                let spread = max - min;
                (name, if spread > 0.0 { spread } else { 1.0 })
            })
            .collect();
        let dimensions: Vec<String> = spreads.keys().cloned().collect();

        let pca_directions = if tracks_with_pca > 0 {
            describe_pca_directions(&domains)
        } else {
            Vec::new()
        };

        log::info!(
            "Built track index: {} tracks, {} dimensions, {} with PCA, {} with VAE",
            tracks.len(),
            dimensions.len(),
            tracks_with_pca,
            tracks_with_vae
        );

        Ok(Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
            by_id,
            dimensions,
            spreads,
            calibration,
            pca_directions,
            tracks_with_pca,
            tracks_with_vae,
            latent_width,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub const fn has_vae(&self) -> bool {
        self.tracks_with_vae > 0
    }

    /// Collect every other track whose distance passes `accept`, nearest
    /// first.
    fn scan<D, A>(&self, anchor: &Track, limit: usize, distance: D, accept: A) -> Vec<Neighbor>
    where
        D: Fn(&Track) -> Option<f64>,
        A: Fn(f64) -> bool,
    {
        let mut neighbors: Vec<Neighbor> = self
            .tracks
            .iter()
            .filter(|candidate| candidate.id != anchor.id)
            .filter_map(|candidate| {
                distance(candidate.as_ref())
                    .filter(|&d| accept(d))
                    .map(|d| Neighbor::new(Arc::clone(candidate), d))
            })
            .collect();
        sort_by_distance(&mut neighbors);
        neighbors.truncate(limit);
        neighbors
    }

    /// Range-normalised weighted Euclidean distance over shared features.
    fn feature_distance(
        &self,
        a: &Track,
        b: &Track,
        weights: Option<&FeatureWeights>,
        skip: &[String],
    ) -> Option<f64> {
        let mut sum = 0.0;
        let mut shared = 0;
        for name in &self.dimensions {
            if skip.contains(name) {
                continue;
            }
            let (Some(x), Some(y)) = (a.feature(name), b.feature(name)) else {
                continue;
            };
            let weight = weights.and_then(|w| w.get(name)).copied().unwrap_or(1.0);
            let spread = self.spreads.get(name).copied().unwrap_or(1.0);
            let delta = (x - y) / spread;
            sum += weight * delta * delta;
            shared += 1;
        }
        (shared > 0).then(|| sum.sqrt())
    }

    fn require_vae<'a>(&self, track: &'a Track) -> Result<&'a [f64]> {
        if !self.has_vae() {
            return Err(Error::Unsupported(
                "index holds no VAE latent vectors".to_string(),
            ));
        }
        track.latent().ok_or_else(|| Error::MissingEmbedding {
            id: track.id.to_string(),
            embedding: Embedding::Vae,
        })
    }

    fn recommended_mode(&self, track: &Track) -> SearchMode {
        if track.has_vae_latent() && self.has_vae() {
            SearchMode::Vae
        } else if track.has_pca() {
            SearchMode::Pca
        } else {
            SearchMode::Features
        }
    }
}

impl SpatialIndex for TrackIndex {
    fn track(&self, id: &TrackId) -> Option<Arc<Track>> {
        self.by_id
            .get(id)
            .map(|&position| Arc::clone(&self.tracks[position]))
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
        &self.pca_directions
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            track_count: self.tracks.len(),
            dimension_count: self.dimensions.len(),
            tracks_with_pca: self.tracks_with_pca,
            tracks_with_vae: self.tracks_with_vae,
            latent_width: self.latent_width,
        }
    }

    fn radius_search(
        &self,
        track: &Track,
        radius: f64,
        weights: Option<&FeatureWeights>,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        Ok(self.scan(
            track,
            limit,
            |candidate| self.feature_distance(track, candidate, weights, &[]),
            |d| d <= radius,
        ))
    }

    fn pca_radius_search(
        &self,
        track: &Track,
        resolution: Resolution,
        discriminator: &str,
        limit: usize,
        overrides: Option<RadiusOverride>,
    ) -> Result<Vec<Neighbor>> {
        if !track.has_pca() {
            return Err(Error::MissingEmbedding {
                id: track.id.to_string(),
                embedding: Embedding::Pca,
            });
        }

        let radii = match overrides {
            Some(radii) => radii,
            None => {
                let entry = self.calibration.get(resolution, discriminator).ok_or_else(|| {
                    Error::Unsupported(format!("no calibration for {resolution}.{discriminator}"))
                })?;
                RadiusOverride {
                    inner_radius: entry.inner_radius,
                    outer_radius: entry.outer_radius,
                }
            }
        };

        Ok(self.scan(
            track,
            limit,
            |candidate| pca_distance(track, candidate, discriminator),
            |d| d >= radii.inner_radius && d <= radii.outer_radius,
        ))
    }

    fn vae_radius_search(
        &self,
        track: &Track,
        radius: f64,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        let latent = self.require_vae(track)?;
        Ok(self.scan(
            track,
            limit,
            |candidate| candidate.latent().map(|other| euclidean(latent, other)),
            |d| d <= radius,
        ))
    }

    fn vae_calibrated_search(
        &self,
        track: &Track,
        resolution: Resolution,
        limit: usize,
    ) -> Result<CalibratedNeighbors> {
        let applied_radius = self
            .calibration
            .get(resolution, LATENT_DISCRIMINATOR)
            .map(|entry| entry.outer_radius)
            .unwrap_or(FALLBACK_VAE_RADIUS);
        let neighbors = self.vae_radius_search(track, applied_radius, limit)?;
        Ok(CalibratedNeighbors {
            neighbors,
            applied_radius,
        })
    }

    fn smart_radius_search(
        &self,
        track: &Track,
        options: &SmartSearchOptions,
    ) -> Result<Vec<Neighbor>> {
        let mode = match options.mode {
            SearchMode::Auto => self.recommended_mode(track),
            mode => mode,
        };
        log::debug!("Smart search for {} in {} mode", track.id, mode);

        match mode {
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
            SearchMode::Features | SearchMode::Auto => {
                self.radius_search(track, options.radius, options.weights.as_ref(), options.limit)
            }
        }
    }

    fn directional_candidates(
        &self,
        track_id: &TrackId,
        direction: &str,
        weights: Option<&FeatureWeights>,
        ignore_dimensions: &[String],
    ) -> Result<DirectionalCandidates> {
        let anchor = self.track(track_id).ok_or_else(|| Error::TrackNotFound {
            id: track_id.to_string(),
        })?;
        let (dimension, polarity) = Dimension::from_direction_label(direction)
            .ok_or_else(|| Error::UnknownDirection(direction.to_string()))?;
        let name = dimension.as_str();
        let current_value = anchor.feature(name).ok_or_else(|| {
            Error::InvalidData(format!("track {track_id} has no value for {name}"))
        })?;

        // Distance is measured on the other axes so that the moving
        // dimension does not push every candidate to the back.
        let mut skip = ignore_dimensions.to_vec();
        skip.push(name.to_string());
        let spread = self.spreads.get(name).copied().unwrap_or(1.0);

        let mut candidates: Vec<Neighbor> = self
            .tracks
            .iter()
            .filter(|candidate| candidate.id != anchor.id)
            .filter_map(|candidate| {
                let value = candidate.feature(name)?;
                if !polarity.matches(current_value, value) {
                    return None;
                }
                let distance = self
                    .feature_distance(&anchor, candidate, weights, &skip)
                    .unwrap_or_else(|| (value - current_value).abs() / spread);
                Some(Neighbor::new(Arc::clone(candidate), distance))
            })
            .collect();

        sort_by_distance(&mut candidates);
        let total_available = candidates.len();
        candidates.truncate(MAX_DIRECTIONAL_CANDIDATES);

        Ok(DirectionalCandidates {
            candidates,
            total_available,
            dimension: name.to_string(),
            current_value,
        })
    }
}

fn sort_by_distance(neighbors: &mut [Neighbor]) {
    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Distance in PCA space for a discriminator.
///
/// `primary_d` compares the scalar axis, a domain name compares that
/// domain's components, and anything else compares `primary_d` together
/// with every domain both tracks share.
fn pca_distance(a: &Track, b: &Track, discriminator: &str) -> Option<f64> {
    let (a, b) = (a.pca.as_ref()?, b.pca.as_ref()?);

    if discriminator == PRIMARY_D {
        return Some((a.primary_d - b.primary_d).abs());
    }
    if let Some(components) = a.domain(discriminator) {
        return b
            .domain(discriminator)
            .map(|other| euclidean(components, other));
    }

    let mut sum = (a.primary_d - b.primary_d).powi(2);
    for (domain, components) in &a.domains {
        if let Some(other) = b.domain(domain) {
            sum += euclidean(components, other).powi(2);
        }
    }
    Some(sum.sqrt())
}

fn describe_pca_directions(domains: &BTreeMap<String, usize>) -> Vec<PcaDirection> {
    let mut directions = vec![PcaDirection::new(PRIMARY_D, None, "Primary discriminator")];

    for (domain, &width) in domains {
        for index in 1..=width {
            directions.push(PcaDirection::new(
                domain.clone(),
                Some(format!("pc{index}")),
                format!("{domain} principal component {index}"),
            ));
        }
    }
    directions
}
