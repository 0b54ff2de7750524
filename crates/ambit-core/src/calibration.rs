//! Resolution tiers and precomputed radius calibration.
//!
//! Calibration settings are produced offline by sampling neighbourhoods in
//! each embedding space and are read-only afterwards. They are stored as a
//! TOML document with one table per `[<resolution>.<discriminator>]`:
//!
//! ```toml
//! [magnifying_glass.primary_d]
//! inner_radius = 0.05
//! outer_radius = 0.2
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Discriminator name used for VAE latent calibration.
pub const LATENT_DISCRIMINATOR: &str = "latent";

/// A named search-breadth tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Microscope,
    #[default]
    MagnifyingGlass,
    Binoculars,
}

impl Resolution {
    pub const ALL: [Self; 3] = [Self::Microscope, Self::MagnifyingGlass, Self::Binoculars];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Microscope => "microscope",
            Self::MagnifyingGlass => "magnifying_glass",
            Self::Binoculars => "binoculars",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidData(format!("unknown resolution: {s}")))
    }
}

/// Radii for one (resolution, discriminator) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    pub inner_radius: f64,
    pub outer_radius: f64,

    /// Share of the library the calibration aimed to capture.
    #[serde(default)]
    pub target_percentage: Option<f64>,

    /// Share of the library the chosen radii actually captured.
    #[serde(default)]
    pub achieved_percentage: Option<f64>,

    #[serde(default)]
    pub base_x: Option<f64>,
}

impl CalibrationEntry {
    #[must_use]
    pub const fn new(inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
            target_percentage: None,
            achieved_percentage: None,
            base_x: None,
        }
    }
}

/// Calibrated radii per resolution tier per discriminator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationSettings {
    tiers: BTreeMap<String, BTreeMap<String, CalibrationEntry>>,
}

impl CalibrationSettings {
    /// Built-in radii for the PCA discriminators and the VAE latent space.
    #[must_use]
    pub fn builtin() -> Self {
        let pca_radii = [
            (Resolution::Microscope, 0.02, 0.08),
            (Resolution::MagnifyingGlass, 0.05, 0.20),
            (Resolution::Binoculars, 0.15, 0.40),
        ];
        let latent_radii = [
            (Resolution::Microscope, 0.05, 0.25),
            (Resolution::MagnifyingGlass, 0.10, 0.50),
            (Resolution::Binoculars, 0.25, 1.00),
        ];

        let mut settings = Self::default();
        for (resolution, inner, outer) in pca_radii {
            for discriminator in ["primary_d", "tonal", "spectral", "rhythmic"] {
                settings.insert(resolution, discriminator, CalibrationEntry::new(inner, outer));
            }
        }
        for (resolution, inner, outer) in latent_radii {
            settings.insert(
                resolution,
                LATENT_DISCRIMINATOR,
                CalibrationEntry::new(inner, outer),
            );
        }
        settings
    }

    /// Parse calibration settings from a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document is not valid TOML, a tier name is
    /// unknown, or a radius pair is not `0 <= inner <= outer`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load calibration settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        log::debug!("Loaded calibration settings from {}", path.display());
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        for (tier, discriminators) in &self.tiers {
            tier.parse::<Resolution>()?;
            for (discriminator, entry) in discriminators {
                let valid = entry.inner_radius.is_finite()
                    && entry.outer_radius.is_finite()
                    && entry.inner_radius >= 0.0
                    && entry.inner_radius <= entry.outer_radius;
                if !valid {
                    return Err(Error::InvalidData(format!(
                        "bad radii for {tier}.{discriminator}: inner {} outer {}",
                        entry.inner_radius, entry.outer_radius
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn insert(
        &mut self,
        resolution: Resolution,
        discriminator: impl Into<String>,
        entry: CalibrationEntry,
    ) {
        self.tiers
            .entry(resolution.as_str().to_string())
            .or_default()
            .insert(discriminator.into(), entry);
    }

    #[must_use]
    pub fn get(&self, resolution: Resolution, discriminator: &str) -> Option<&CalibrationEntry> {
        self.tiers
            .get(resolution.as_str())
            .and_then(|discriminators| discriminators.get(discriminator))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.values().all(BTreeMap::is_empty)
    }
}
