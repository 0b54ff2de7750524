pub mod ids;
pub mod track;

pub use ids::TrackId;
pub use track::{Embedding, PcaEmbedding, Track, TrackSummary, VaeEmbedding, PRIMARY_D};
