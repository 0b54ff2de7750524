//! Dimensional diversity analysis and exploration-axis selection.
//!
//! Given an anchor and its neighbourhood, every dimension gets a score for
//! how much room there is to move along it. The highest-scoring dimensions
//! that also have enough tracks on at least one side become the axes the
//! engine offers.

use ambit_core::{Dimension, Neighbor, Track};
use serde::{Deserialize, Serialize};

use crate::options::SelectionCriteria;

const VARIANCE_WEIGHT: f64 = 0.4;
const RANGE_WEIGHT: f64 = 0.4;
const POSITION_WEIGHT: f64 = 0.2;

/// A side is unavailable once the anchor sits in its outermost 20%.
const TAIL_FRACTION: f64 = 0.2;

/// Whether there is room to move one way along a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionAvailability {
    pub available: bool,
    /// Neighbours strictly beyond the anchor on this side.
    pub candidate_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidirectionalOptions {
    pub positive: DirectionAvailability,
    pub negative: DirectionAvailability,
}

impl BidirectionalOptions {
    /// Larger of the two candidate counts.
    #[must_use]
    pub fn max_candidates(&self) -> usize {
        self.positive.candidate_count.max(self.negative.candidate_count)
    }
}

/// Spread statistics for one dimension within a neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionAnalysis {
    pub dimension: String,
    pub current_value: f64,
    /// Population variance of the neighbour values.
    pub variance: f64,
    pub range: f64,
    /// Rank of the anchor value among sorted neighbour values, in `[0, 1]`.
    pub current_position: f64,
    pub exploration_potential: f64,
    pub bidirectional_options: BidirectionalOptions,
}

/// A dimension chosen as an exploration axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantDimension {
    pub dimension: String,
    pub exploration_potential: f64,
    pub context_label: String,
}

/// Score every dimension in `dimensions` over the neighbourhood.
///
/// Dimensions the anchor has no value for, or that no neighbour carries,
/// are left out of the result.
#[must_use]
pub fn analyze_dimensional_diversity(
    current: &Track,
    neighbors: &[Neighbor],
    dimensions: &[String],
) -> Vec<DimensionAnalysis> {
    dimensions
        .iter()
        .filter_map(|dimension| {
            let current_value = current.feature(dimension)?;
            let values: Vec<f64> = neighbors
                .iter()
                .filter_map(|neighbor| neighbor.track.feature(dimension))
                .collect();
            analyze_values(dimension, current_value, values)
        })
        .collect()
}

fn analyze_values(
    dimension: &str,
    current_value: f64,
    mut values: Vec<f64>,
) -> Option<DimensionAnalysis> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    values.sort_by(f64::total_cmp);
    let min = values[0];
    let max = values[values.len() - 1];
    let range = max - min;

    // First-occurrence rank: duplicates of the anchor value all share the
    // lowest position.
    let rank = values.partition_point(|&v| v < current_value);
    let current_position = rank as f64 / n;

    let position_spread = 1.0 - (current_position - 0.5).abs() * 2.0;
    let exploration_potential =
        VARIANCE_WEIGHT * variance + RANGE_WEIGHT * range + POSITION_WEIGHT * position_spread;

    let above = values.iter().filter(|&&v| v > current_value).count();
    let below = values.iter().filter(|&&v| v < current_value).count();

    Some(DimensionAnalysis {
        dimension: dimension.to_string(),
        current_value,
        variance,
        range,
        current_position,
        exploration_potential,
        bidirectional_options: BidirectionalOptions {
            positive: DirectionAvailability {
                available: current_position < 1.0 - TAIL_FRACTION,
                candidate_count: above,
            },
            negative: DirectionAvailability {
                available: current_position > TAIL_FRACTION,
                candidate_count: below,
            },
        },
    })
}

/// Keep the dimensions worth offering, best first.
#[must_use]
pub fn select_relevant_dimensions(
    analysis: &[DimensionAnalysis],
    criteria: &SelectionCriteria,
) -> Vec<RelevantDimension> {
    let mut relevant: Vec<&DimensionAnalysis> = analysis
        .iter()
        .filter(|entry| {
            entry.exploration_potential > criteria.min_exploration_potential
                && entry.variance > criteria.min_variance
                && entry.bidirectional_options.max_candidates() > criteria.min_candidates
        })
        .collect();

    relevant.sort_by(|a, b| b.exploration_potential.total_cmp(&a.exploration_potential));
    relevant.truncate(criteria.max_dimensions);

    relevant
        .into_iter()
        .map(|entry| RelevantDimension {
            dimension: entry.dimension.clone(),
            exploration_potential: entry.exploration_potential,
            context_label: context_label(&entry.dimension, entry.current_position),
        })
        .collect()
}

/// Human wording for an exploration axis.
///
/// Brightness and energy phrase the pair from the side the anchor is
/// furthest from.
#[must_use]
pub fn context_label(dimension: &str, current_position: f64) -> String {
    let label = match Dimension::from_name(dimension) {
        Some(Dimension::SpectralCentroid) if current_position > 0.5 => "darker/brighter",
        Some(Dimension::SpectralCentroid) => "brighter/darker",
        Some(Dimension::SpectralEnergy) if current_position > 0.7 => "calmer/more energetic",
        Some(Dimension::SpectralEnergy) => "more energetic/calmer",
        Some(known) => known.context_label(),
        None => return format!("{dimension} variation"),
    };
    label.to_string()
}
