//! # Ambit
//!
//! Content-based music exploration for people who navigate a library by ear.
//!
//! Ambit embeds every track in one or more numeric spaces (raw audio
//! features, per-domain PCA projections and optional VAE latents), finds
//! the neighbourhood around the track that is playing, works out which
//! dimensions actually vary inside that neighbourhood, and proposes ranked
//! "keep going this way" candidates in both polarities: faster or slower,
//! brighter or darker, busier or sparser.
