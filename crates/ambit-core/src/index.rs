//! The spatial index contract.
//!
//! The exploration engine never builds or mutates an index; it only asks
//! radius questions of one. Any structure that answers these questions can
//! back the engine, provided that a larger radius never returns fewer
//! results than a smaller one (adaptive calibration relies on it).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::calibration::{CalibrationSettings, Resolution};
use crate::error::{Error, Result};
use crate::model::{Track, TrackId};

/// Per-dimension multipliers applied to feature distances.
pub type FeatureWeights = BTreeMap<String, f64>;

/// Which representation space a search runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Auto,
    Vae,
    Pca,
    Features,
}

impl SearchMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Vae => "vae",
            Self::Pca => "pca",
            Self::Features => "features",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "vae" => Ok(Self::Vae),
            "pca" => Ok(Self::Pca),
            "features" => Ok(Self::Features),
            _ => Err(Error::InvalidData(format!("unknown search mode: {s}"))),
        }
    }
}

/// A track returned by a spatial query with its distance from the anchor.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub track: Arc<Track>,
    pub distance: f64,
}

impl Neighbor {
    #[must_use]
    pub fn new(track: Arc<Track>, distance: f64) -> Self {
        Self { track, distance }
    }

    #[must_use]
    pub fn id(&self) -> &TrackId {
        &self.track.id
    }
}

/// Explicit radii that replace the calibrated pair for one PCA query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusOverride {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl RadiusOverride {
    /// A full ball of the given radius.
    #[must_use]
    pub const fn ball(outer_radius: f64) -> Self {
        Self {
            inner_radius: 0.0,
            outer_radius,
        }
    }
}

/// Result of a calibrated VAE search.
#[derive(Debug, Clone)]
pub struct CalibratedNeighbors {
    pub neighbors: Vec<Neighbor>,
    pub applied_radius: f64,
}

/// Options for the index's own mode-aware search.
#[derive(Debug, Clone)]
pub struct SmartSearchOptions {
    pub mode: SearchMode,
    pub resolution: Resolution,
    pub discriminator: String,
    /// Radius for plain feature searches.
    pub radius: f64,
    pub weights: Option<FeatureWeights>,
    pub limit: usize,
}

/// Tracks that move away from an anchor along one labelled direction.
#[derive(Debug, Clone)]
pub struct DirectionalCandidates {
    pub candidates: Vec<Neighbor>,
    /// How many tracks move this way before any cap was applied.
    pub total_available: usize,
    pub dimension: String,
    pub current_value: f64,
}

/// A PCA axis with its semantic direction labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaDirection {
    pub domain: String,
    /// `pc1`, `pc2`, ... or `None` for the scalar `primary_d`.
    pub component: Option<String>,
    pub positive: String,
    pub negative: String,
    pub description: String,
}

impl PcaDirection {
    /// Navigation key stem for this axis: `primary_d` or `{domain}_{component}`.
    #[must_use]
    pub fn axis_key(domain: &str, component: Option<&str>) -> String {
        match component {
            Some(component) => format!("{domain}_{component}"),
            None => domain.to_string(),
        }
    }

    /// Describe one axis with `{axis}_positive` / `{axis}_negative` keys.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        component: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        let domain = domain.into();
        let axis = Self::axis_key(&domain, component.as_deref());
        Self {
            positive: format!("{axis}_positive"),
            negative: format!("{axis}_negative"),
            domain,
            component,
            description: description.into(),
        }
    }
}

/// One coordinate of the VAE latent space with its navigation keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatentDirection {
    /// Zero-based latent coordinate.
    pub latent_index: usize,
    pub positive: String,
    pub negative: String,
}

impl LatentDirection {
    #[must_use]
    pub fn new(latent_index: usize) -> Self {
        Self {
            latent_index,
            positive: format!("vae_latent_{latent_index}_positive"),
            negative: format!("vae_latent_{latent_index}_negative"),
        }
    }

    /// Every coordinate of a latent space `width` wide.
    #[must_use]
    pub fn for_width(width: usize) -> Vec<Self> {
        (0..width).map(Self::new).collect()
    }
}

/// Summary counts describing an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub track_count: usize,
    pub dimension_count: usize,
    pub tracks_with_pca: usize,
    pub tracks_with_vae: usize,
    pub latent_width: usize,
}

/// Read-only radius queries over the feature, PCA and VAE spaces.
///
/// Every query excludes the anchor track and returns neighbours ordered by
/// ascending distance.
pub trait SpatialIndex {
    fn track(&self, id: &TrackId) -> Option<Arc<Track>>;

    fn tracks(&self) -> &[Arc<Track>];

    /// The configured feature dimensions, in a stable order.
    fn dimensions(&self) -> &[String];

    fn calibration(&self) -> &CalibrationSettings;

    fn pca_directions(&self) -> &[PcaDirection];

    fn stats(&self) -> IndexStats;

    /// The VAE latent axes, one per coordinate of the widest latent vector.
    fn latent_directions(&self) -> Vec<LatentDirection> {
        LatentDirection::for_width(self.stats().latent_width)
    }

    /// Plain weighted feature-distance search.
    fn radius_search(
        &self,
        track: &Track,
        radius: f64,
        weights: Option<&FeatureWeights>,
        limit: usize,
    ) -> Result<Vec<Neighbor>>;

    /// PCA search using the calibrated radii for `resolution` and
    /// `discriminator`, unless `overrides` supplies its own.
    fn pca_radius_search(
        &self,
        track: &Track,
        resolution: Resolution,
        discriminator: &str,
        limit: usize,
        overrides: Option<RadiusOverride>,
    ) -> Result<Vec<Neighbor>>;

    fn vae_radius_search(&self, track: &Track, radius: f64, limit: usize)
        -> Result<Vec<Neighbor>>;

    fn vae_calibrated_search(
        &self,
        track: &Track,
        resolution: Resolution,
        limit: usize,
    ) -> Result<CalibratedNeighbors>;

    fn smart_radius_search(
        &self,
        track: &Track,
        options: &SmartSearchOptions,
    ) -> Result<Vec<Neighbor>>;

    fn directional_candidates(
        &self,
        track_id: &TrackId,
        direction: &str,
        weights: Option<&FeatureWeights>,
        ignore_dimensions: &[String],
    ) -> Result<DirectionalCandidates>;
}
