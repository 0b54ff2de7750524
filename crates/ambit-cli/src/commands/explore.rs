use anyhow::Result;

use ambit_core::TrackId;
use ambit_explore::{ExplorationEngine, ExploreOptions};
use ambit_index::TrackIndex;

use super::{print_candidates, print_json};

/// Number of candidates shown per direction in text output.
const SHOWN_PER_SIDE: usize = 5;

pub fn run_explore(
    index: &TrackIndex,
    track_id: &str,
    options: &ExploreOptions,
    json: bool,
) -> Result<()> {
    let engine = ExplorationEngine::new(index);
    let result = engine.explore_from_track(&TrackId::new(track_id), options)?;

    if json {
        return print_json(&result);
    }

    println!("\nExploring from {}\n", result.current_track);
    println!(
        "  Neighbourhood: {} tracks via {} (resolved {}), average distance {:.4}",
        result.neighborhood.size,
        result.search_capabilities.used_mode,
        result.neighborhood.search_mode,
        result.neighborhood.average_distance
    );
    for attempt in &result.search_capabilities.attempts {
        if let Some(error) = &attempt.error {
            println!("  ✗ {} search failed: {}", attempt.mode, error);
        }
    }

    if result.directional_options.is_empty() {
        println!("\n  No dimension varies enough here to explore.");
    }

    for (rank, option) in result.directional_options.iter().enumerate() {
        let flag = if option.labels_mapped { "" } else { " [unmapped labels]" };
        println!(
            "\n  {}. {} ({}), potential {:.2}{flag}",
            rank + 1,
            option.dimension,
            option.context_label,
            option.exploration_potential
        );
        for side in [&option.positive, &option.negative] {
            println!("     {} ({} available)", side.direction, side.total_available);
            let shown = side.candidates.len().min(SHOWN_PER_SIDE);
            print_candidates(&side.candidates[..shown], "       ");
        }
    }

    println!("\n  Computed in {}ms", result.computation_time_ms);
    Ok(())
}
