//! In-memory spatial index for ambit.
//!
//! [`TrackIndex`] answers the radius queries of
//! [`ambit_core::SpatialIndex`] by scanning every track, which is plenty for
//! a personal library. It is built once and never mutated. [`IndexLoader`]
//! wraps the build behind an async, idempotent `initialize`.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod loader;
pub mod track_index;

pub use loader::IndexLoader;
pub use track_index::{TrackIndex, FALLBACK_VAE_RADIUS, MAX_DIRECTIONAL_CANDIDATES};
