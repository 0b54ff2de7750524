//! The closed set of raw feature dimensions and their label tables.
//!
//! Each dimension has a pair of semantic direction labels (bpm moves
//! "faster" or "slower") and a context label shown when the dimension is
//! offered as an exploration axis. Dimension names arriving from an index
//! are plain strings, so lookups go through [`Dimension::from_name`] and a
//! name outside the closed set resolves to [`DirectionLabels::Unmapped`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A named raw audio feature axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Bpm,
    Danceability,
    OnsetRate,
    BeatPunch,
    TonalClarity,
    TuningPurity,
    FifthsStrength,
    ChordStrength,
    ChordChangeRate,
    Crest,
    Entropy,
    SpectralCentroid,
    SpectralRolloff,
    SpectralKurtosis,
    SpectralEnergy,
    SpectralFlatness,
    SubDrive,
    AirSizzle,
}

/// Label table: name, positive direction, negative direction, context label.
const DIMENSION_TABLE: &[(Dimension, &str, &str, &str, &str)] = &[
    (Dimension::Bpm, "bpm", "faster", "slower", "tempo"),
    (Dimension::Danceability, "danceability", "more_danceable", "less_danceable", "groove"),
    (Dimension::OnsetRate, "onset_rate", "busier_onsets", "sparser_onsets", "rhythmic density"),
    (Dimension::BeatPunch, "beat_punch", "punchier_beats", "smoother_beats", "beat attack"),
    (Dimension::TonalClarity, "tonal_clarity", "more_tonal", "more_atonal", "tonal clarity"),
    (Dimension::TuningPurity, "tuning_purity", "purer_tuning", "looser_tuning", "tuning"),
    (Dimension::FifthsStrength, "fifths_strength", "stronger_fifths", "weaker_fifths", "harmonic stability"),
    (Dimension::ChordStrength, "chord_strength", "stronger_chords", "weaker_chords", "chord definition"),
    (Dimension::ChordChangeRate, "chord_change_rate", "faster_changes", "slower_changes", "harmonic motion"),
    (Dimension::Crest, "crest", "more_punchy", "smoother", "dynamics"),
    (Dimension::Entropy, "entropy", "more_complex", "simpler", "complexity"),
    (Dimension::SpectralCentroid, "spectral_centroid", "brighter", "darker", "brightness"),
    (Dimension::SpectralRolloff, "spectral_rolloff", "fuller_spectrum", "narrower_spectrum", "high-end extension"),
    (Dimension::SpectralKurtosis, "spectral_kurtosis", "peakier_spectrum", "flatter_spectrum", "spectral focus"),
    (Dimension::SpectralEnergy, "spectral_energy", "more_energetic", "calmer", "energy"),
    (Dimension::SpectralFlatness, "spectral_flatness", "noisier", "more_tonal_spectrum", "texture"),
    (Dimension::SubDrive, "sub_drive", "more_bass", "less_bass", "low end"),
    (Dimension::AirSizzle, "air_sizzle", "more_air", "less_air", "shimmer"),
];

/// Older direction names still accepted by the reverse lookup.
const LEGACY_LABELS: &[(&str, Dimension, Polarity)] = &[
    ("denser_onsets", Dimension::OnsetRate, Polarity::Positive),
    ("impurer_tuning", Dimension::TuningPurity, Polarity::Negative),
    ("less_punchy", Dimension::Crest, Polarity::Negative),
    ("more_air_sizzle", Dimension::AirSizzle, Polarity::Positive),
    ("less_air_sizzle", Dimension::AirSizzle, Polarity::Negative),
];

/// Labels handed out for a dimension outside the table.
///
/// These are the tempo labels, which is almost certainly not what an
/// unknown dimension means. Callers can detect the case through
/// [`DirectionLabels::is_mapped`].
const UNMAPPED_POSITIVE: &str = "faster";
const UNMAPPED_NEGATIVE: &str = "slower";

impl Dimension {
    /// Every dimension, in table order.
    pub const ALL: [Self; 18] = [
        Self::Bpm,
        Self::Danceability,
        Self::OnsetRate,
        Self::BeatPunch,
        Self::TonalClarity,
        Self::TuningPurity,
        Self::FifthsStrength,
        Self::ChordStrength,
        Self::ChordChangeRate,
        Self::Crest,
        Self::Entropy,
        Self::SpectralCentroid,
        Self::SpectralRolloff,
        Self::SpectralKurtosis,
        Self::SpectralEnergy,
        Self::SpectralFlatness,
        Self::SubDrive,
        Self::AirSizzle,
    ];

    fn entry(self) -> &'static (Self, &'static str, &'static str, &'static str, &'static str) {
        // Table rows are in declaration order.
        &DIMENSION_TABLE[self as usize]
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.entry().1
    }

    /// Look up a dimension by its feature name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        DIMENSION_TABLE
            .iter()
            .find(|(_, canonical, ..)| *canonical == name)
            .map(|&(dimension, ..)| dimension)
    }

    /// The semantic label for moving along this dimension.
    #[must_use]
    pub fn direction_label(self, polarity: Polarity) -> &'static str {
        let &(_, _, positive, negative, _) = self.entry();
        match polarity {
            Polarity::Positive => positive,
            Polarity::Negative => negative,
        }
    }

    /// Reverse lookup from a direction label to the axis it moves along.
    ///
    /// Accepts the table labels, the legacy names, and raw
    /// `{dimension}_positive` / `{dimension}_negative` keys.
    #[must_use]
    pub fn from_direction_label(label: &str) -> Option<(Self, Polarity)> {
        let mapped = DIMENSION_TABLE
            .iter()
            .find_map(|&(dimension, _, positive, negative, _)| {
                if positive == label {
                    Some((dimension, Polarity::Positive))
                } else if negative == label {
                    Some((dimension, Polarity::Negative))
                } else {
                    None
                }
            });
        mapped
            .or_else(|| {
                LEGACY_LABELS
                    .iter()
                    .find(|(legacy, ..)| *legacy == label)
                    .map(|&(_, dimension, polarity)| (dimension, polarity))
            })
            .or_else(|| {
                let (name, polarity) = Polarity::split_key(label)?;
                Some((Self::from_name(name)?, polarity))
            })
    }

    /// Static context label shown with an exploration axis.
    #[must_use]
    pub fn context_label(self) -> &'static str {
        self.entry().4
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::InvalidData(format!("unknown dimension: {s}")))
    }
}

/// Which way to move along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }

    /// Split a `{axis}_positive` / `{axis}_negative` key into the axis
    /// name and polarity.
    #[must_use]
    pub fn split_key(key: &str) -> Option<(&str, Self)> {
        if let Some(axis) = key.strip_suffix("_positive") {
            Some((axis, Self::Positive))
        } else {
            key.strip_suffix("_negative")
                .map(|axis| (axis, Self::Negative))
        }
    }

    /// Whether moving from `from` to `to` goes this way. Equal values go
    /// neither way.
    #[must_use]
    pub fn matches(self, from: f64, to: f64) -> bool {
        match self {
            Self::Positive => to > from,
            Self::Negative => to < from,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => f.write_str("positive"),
            Self::Negative => f.write_str("negative"),
        }
    }
}

impl FromStr for Polarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" | "pos" | "+" => Ok(Self::Positive),
            "negative" | "neg" | "-" => Ok(Self::Negative),
            _ => Err(Error::InvalidData(format!("unknown direction: {s}"))),
        }
    }
}

/// The pair of direction labels for a dimension name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionLabels {
    Mapped {
        dimension: Dimension,
        positive: &'static str,
        negative: &'static str,
    },
    Unmapped,
}

impl DirectionLabels {
    #[must_use]
    pub fn for_dimension(name: &str) -> Self {
        match Dimension::from_name(name) {
            Some(dimension) => Self::Mapped {
                dimension,
                positive: dimension.direction_label(Polarity::Positive),
                negative: dimension.direction_label(Polarity::Negative),
            },
            None => Self::Unmapped,
        }
    }

    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped { .. })
    }

    #[must_use]
    pub const fn positive(&self) -> &'static str {
        match self {
            Self::Mapped { positive, .. } => *positive,
            Self::Unmapped => UNMAPPED_POSITIVE,
        }
    }

    #[must_use]
    pub const fn negative(&self) -> &'static str {
        match self {
            Self::Mapped { negative, .. } => *negative,
            Self::Unmapped => UNMAPPED_NEGATIVE,
        }
    }

    #[must_use]
    pub const fn label(&self, polarity: Polarity) -> &'static str {
        match polarity {
            Polarity::Positive => self.positive(),
            Polarity::Negative => self.negative(),
        }
    }
}
