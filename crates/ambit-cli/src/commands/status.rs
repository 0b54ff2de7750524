use anyhow::Result;
use serde::Serialize;

use ambit_core::{IndexStats, LatentDirection, PcaDirection, SpatialIndex, TrackId};
use ambit_explore::ExplorationEngine;
use ambit_index::TrackIndex;

use super::print_json;

/// Show the search spaces available for a track.
pub fn show_modes(index: &TrackIndex, track_id: &str, json: bool) -> Result<()> {
    let engine = ExplorationEngine::new(index);
    let modes = engine.available_search_modes(&TrackId::new(track_id))?;

    if json {
        return print_json(&modes);
    }

    let mark = |available: bool| if available { "✓" } else { "✗" };
    println!("\nSearch modes for {track_id}\n");
    println!("  {} features", mark(modes.features));
    println!("  {} pca", mark(modes.pca));
    println!("  {} vae", mark(modes.vae));
    println!("\n  Recommended: {}", modes.recommended);
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    stats: IndexStats,
    dimensions: &'a [String],
    pca_directions: &'a [PcaDirection],
    latent_directions: Vec<LatentDirection>,
}

/// Show index statistics and every navigable PCA and VAE axis.
pub fn show_stats(index: &TrackIndex, json: bool) -> Result<()> {
    let report = StatsReport {
        stats: index.stats(),
        dimensions: index.dimensions(),
        pca_directions: index.pca_directions(),
        latent_directions: index.latent_directions(),
    };

    if json {
        return print_json(&report);
    }

    let stats = &report.stats;
    println!("\n📊 Ambit Index\n");
    println!("  Tracks:         {}", stats.track_count);
    println!("  Dimensions:     {}", stats.dimension_count);
    println!("  With PCA:       {}", stats.tracks_with_pca);
    println!("  With VAE:       {}", stats.tracks_with_vae);
    if stats.latent_width > 0 {
        println!("  Latent width:   {}", stats.latent_width);
    }

    if !report.dimensions.is_empty() {
        println!("\n  Dimensions: {}", report.dimensions.join(", "));
    }

    if !report.pca_directions.is_empty() {
        println!("\n  PCA axes:");
        for direction in report.pca_directions {
            println!(
                "    {:<28} {:<28} {}",
                direction.positive, direction.negative, direction.description
            );
        }
    }

    if !report.latent_directions.is_empty() {
        println!("\n  VAE axes:");
        for direction in &report.latent_directions {
            println!("    {:<28} {}", direction.positive, direction.negative);
        }
    }
    Ok(())
}
