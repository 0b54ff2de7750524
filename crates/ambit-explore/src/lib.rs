//! Exploration engine for ambit.
//!
//! Given an anchor track in a [`SpatialIndex`](ambit_core::SpatialIndex),
//! the engine finds its neighbourhood, scores how much each feature
//! dimension varies within it, and proposes candidates that move further
//! along the most promising dimensions in both directions. It can also
//! retrieve candidates along a single PCA axis or VAE latent coordinate,
//! and size a neighbourhood adaptively.
//!
//! ```no_run
//! use ambit_core::TrackId;
//! use ambit_explore::{ExplorationEngine, ExploreOptions};
//! # fn run(index: &impl ambit_core::SpatialIndex) -> ambit_explore::ExploreResult<()> {
//! let engine = ExplorationEngine::new(index);
//! let result = engine.explore_from_track(&TrackId::new("track-1"), &ExploreOptions::default())?;
//! for option in &result.directional_options {
//!     println!("{} ({})", option.dimension, option.context_label);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod adaptive;
pub mod capabilities;
pub mod config;
pub mod diversity;
pub mod engine;
pub mod error;
pub mod mode;
pub mod options;
pub mod pca;
pub mod vae;

#[cfg(test)]
pub(crate) mod testing;

pub use adaptive::AdaptiveNeighborhood;
pub use capabilities::{recommended_search_mode, AvailableSearchModes};
pub use config::Config;
pub use diversity::{
    analyze_dimensional_diversity, context_label, select_relevant_dimensions,
    BidirectionalOptions, DimensionAnalysis, DirectionAvailability, RelevantDimension,
};
pub use engine::{
    Candidate, DirectionSide, DirectionalOption, ExplorationEngine, ExplorationResult,
    NeighborhoodSummary, SearchCapabilities,
};
pub use error::{ExploreError, ExploreResult};
pub use mode::{neighborhood_plan, resolve_search_mode, NeighborhoodStrategy, SearchAttempt};
pub use options::{
    AdaptiveOptions, ExploreOptions, PcaDirectionOptions, SelectionCriteria, VaeDirectionOptions,
};
pub use pca::{
    is_in_pca_direction, parse_component_index, NeighborhoodSource, PcaDirectionalCandidates,
    PcaSearchParameters,
};
pub use vae::{VaeDirectionalCandidates, DEFAULT_VAE_RADIUS, VAE_RADIUS_MULTIPLES};
