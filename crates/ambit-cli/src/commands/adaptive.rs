use anyhow::Result;

use ambit_core::TrackId;
use ambit_explore::{AdaptiveOptions, ExplorationEngine};
use ambit_index::TrackIndex;

use super::print_json;

pub fn run_adaptive(
    index: &TrackIndex,
    track_id: &str,
    options: &AdaptiveOptions,
    json: bool,
) -> Result<()> {
    let engine = ExplorationEngine::new(index);
    let result = engine.adaptive_neighborhood(&TrackId::new(track_id), options)?;

    if json {
        return print_json(&result);
    }

    println!("\nAdaptive neighbourhood for {}\n", result.current_track);
    println!(
        "  Target: {}-{} tracks",
        options.target_min, options.target_max
    );
    println!(
        "  Found:  {} tracks at radius {:.5} (scale {:.4}) after {} iteration(s)",
        result.count, result.radius, result.scale, result.iterations
    );
    if result.within_target {
        println!("  ✓ Within target");
    } else {
        println!("  ✗ Target missed, closest probe shown");
    }
    Ok(())
}
