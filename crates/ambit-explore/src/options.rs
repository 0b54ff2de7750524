//! Per-call options for the engine entry points.
//!
//! Every struct deserializes with missing fields filled from its
//! `Default`, so callers only spell out what they change.

use ambit_core::{FeatureWeights, Neighbor, Resolution, SearchMode, PRIMARY_D};
use serde::{Deserialize, Serialize};

/// Options for [`ExplorationEngine::explore_from_track`].
///
/// [`ExplorationEngine::explore_from_track`]: crate::ExplorationEngine::explore_from_track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExploreOptions {
    pub resolution: Resolution,
    pub discriminator: String,
    /// Radius for the legacy feature-space search only.
    pub radius: f64,
    pub weights: Option<FeatureWeights>,
    pub ignore_dimensions: Vec<String>,
    pub max_dimensions: usize,
    pub min_exploration_potential: f64,
    #[serde(rename = "usePCA")]
    pub use_pca: bool,
    #[serde(rename = "useVAE")]
    pub use_vae: bool,
    pub search_mode: SearchMode,
    /// Upper bound on the neighbourhood size.
    pub neighborhood_limit: usize,
}

impl Default for ExploreOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::MagnifyingGlass,
            discriminator: PRIMARY_D.to_string(),
            radius: 2.0,
            weights: None,
            ignore_dimensions: Vec::new(),
            max_dimensions: 6,
            min_exploration_potential: 0.15,
            use_pca: true,
            use_vae: false,
            search_mode: SearchMode::Auto,
            neighborhood_limit: 1000,
        }
    }
}

impl ExploreOptions {
    /// Selection thresholds implied by these options.
    #[must_use]
    pub fn selection_criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            min_exploration_potential: self.min_exploration_potential,
            max_dimensions: self.max_dimensions,
            ..SelectionCriteria::default()
        }
    }
}

/// Thresholds for keeping a dimension as an exploration axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionCriteria {
    pub min_exploration_potential: f64,
    pub min_variance: f64,
    pub max_dimensions: usize,
    pub min_candidates: usize,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            min_exploration_potential: 0.15,
            min_variance: 0.12,
            max_dimensions: 6,
            min_candidates: 5,
        }
    }
}

/// Options for PCA directional candidate retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PcaDirectionOptions {
    pub resolution: Resolution,
    pub limit: usize,
    /// Run a plain ball query of this radius instead of the calibrated one.
    pub adaptive_radius: Option<f64>,
    /// Use this neighbourhood as-is and skip the index query.
    #[serde(skip)]
    pub precomputed_neighbors: Option<Vec<Neighbor>>,
}

impl Default for PcaDirectionOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::MagnifyingGlass,
            limit: 20,
            adaptive_radius: None,
            precomputed_neighbors: None,
        }
    }
}

/// Options for VAE directional candidate retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaeDirectionOptions {
    pub resolution: Resolution,
    pub limit: usize,
}

impl Default for VaeDirectionOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::MagnifyingGlass,
            limit: 20,
        }
    }
}

/// Options for adaptive neighbourhood calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdaptiveOptions {
    /// Tier whose calibrated `primary_d` radius is the base for scaling.
    pub resolution: Resolution,
    pub target_min: usize,
    pub target_max: usize,
    pub max_iterations: usize,
    pub limit: usize,
    pub initial_radius: Option<f64>,
    pub initial_scale: Option<f64>,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::MagnifyingGlass,
            target_min: 350,
            target_max: 450,
            max_iterations: 6,
            limit: 1200,
            initial_radius: None,
            initial_scale: None,
        }
    }
}

impl AdaptiveOptions {
    #[must_use]
    pub fn target_mid(&self) -> f64 {
        (self.target_min + self.target_max) as f64 / 2.0
    }
}
