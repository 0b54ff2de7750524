use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::ids::TrackId;

/// The PCA discriminator that is a plain scalar rather than a domain.
pub const PRIMARY_D: &str = "primary_d";

/// Which learned representation an operation needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Embedding {
    Pca,
    Vae,
}

impl fmt::Display for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pca => f.write_str("PCA"),
            Self::Vae => f.write_str("VAE"),
        }
    }
}

/// Per-domain PCA projections of a track.
///
/// `primary_d` is the distinguished scalar axis; every other key is a
/// domain (tonal, spectral, rhythmic, ...) holding its ordered components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaEmbedding {
    pub primary_d: f64,

    #[serde(flatten)]
    pub domains: BTreeMap<String, Vec<f64>>,
}

impl PcaEmbedding {
    #[must_use]
    pub fn new(primary_d: f64) -> Self {
        Self {
            primary_d,
            domains: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>, components: Vec<f64>) -> Self {
        self.domains.insert(domain.into(), components);
        self
    }

    /// Value along a PCA axis.
    ///
    /// For `primary_d` the component index is ignored; otherwise it is the
    /// zero-based position inside the domain's component list.
    #[must_use]
    pub fn value(&self, domain: &str, component_index: usize) -> Option<f64> {
        if domain == PRIMARY_D {
            return Some(self.primary_d);
        }
        self.domains
            .get(domain)
            .and_then(|components| components.get(component_index))
            .copied()
    }

    #[must_use]
    pub fn domain(&self, domain: &str) -> Option<&[f64]> {
        self.domains.get(domain).map(Vec::as_slice)
    }
}

/// VAE latent vector and the model that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaeEmbedding {
    #[serde(default)]
    pub latent: Option<Vec<f64>>,

    #[serde(default)]
    pub model_version: Option<String>,
}

/// A track embedded in the exploration spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub artist: String,

    /// Raw audio features keyed by dimension name.
    #[serde(default)]
    pub features: BTreeMap<String, f64>,

    #[serde(default)]
    pub pca: Option<PcaEmbedding>,

    #[serde(default)]
    pub vae: Option<VaeEmbedding>,
}

impl Track {
    #[must_use]
    pub fn new(id: impl Into<TrackId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            artist: String::new(),
            features: BTreeMap::new(),
            pca: None,
            vae: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    #[must_use]
    pub fn with_feature(mut self, dimension: impl Into<String>, value: f64) -> Self {
        self.features.insert(dimension.into(), value);
        self
    }

    #[must_use]
    pub fn with_pca(mut self, pca: PcaEmbedding) -> Self {
        self.pca = Some(pca);
        self
    }

    #[must_use]
    pub fn with_latent(mut self, latent: Vec<f64>) -> Self {
        let vae = self.vae.get_or_insert_with(VaeEmbedding::default);
        vae.latent = Some(latent);
        self
    }

    #[must_use]
    pub fn feature(&self, dimension: &str) -> Option<f64> {
        self.features.get(dimension).copied()
    }

    #[must_use]
    pub const fn has_pca(&self) -> bool {
        self.pca.is_some()
    }

    /// The latent vector, if present and non-empty.
    #[must_use]
    pub fn latent(&self) -> Option<&[f64]> {
        self.vae
            .as_ref()
            .and_then(|vae| vae.latent.as_deref())
            .filter(|latent| !latent.is_empty())
    }

    #[must_use]
    pub fn has_vae_latent(&self) -> bool {
        self.latent().is_some()
    }

    #[must_use]
    pub fn pca_value(&self, domain: &str, component_index: usize) -> Option<f64> {
        self.pca
            .as_ref()
            .and_then(|pca| pca.value(domain, component_index))
    }

    #[must_use]
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
        }
    }
}

/// The identifying slice of a track that results carry around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
}

impl fmt::Display for TrackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => write!(f, "{} - {}", self.artist, self.title),
            (true, false) => f.write_str(&self.title),
            _ => write!(f, "{}", self.id),
        }
    }
}
