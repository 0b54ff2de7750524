//! Core domain model for ambit.
//!
//! This crate defines the track model and its embeddings, the closed set of
//! feature dimensions with their direction and context labels, resolution
//! tiers and calibration settings, and the [`SpatialIndex`] contract that
//! the exploration engine queries.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod calibration;
pub mod dimension;
pub mod error;
pub mod index;
pub mod model;

pub use calibration::{CalibrationEntry, CalibrationSettings, Resolution, LATENT_DISCRIMINATOR};
pub use dimension::{Dimension, DirectionLabels, Polarity};
pub use error::{Error, Result};
pub use index::{
    CalibratedNeighbors, DirectionalCandidates, FeatureWeights, IndexStats, LatentDirection, Neighbor,
    PcaDirection, RadiusOverride, SearchMode, SmartSearchOptions, SpatialIndex,
};
pub use model::{
    Embedding, PcaEmbedding, Track, TrackId, TrackSummary, VaeEmbedding, PRIMARY_D,
};
