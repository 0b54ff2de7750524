use anyhow::Result;

use ambit_core::{Polarity, TrackId};
use ambit_explore::{ExplorationEngine, PcaDirectionOptions, VaeDirectionOptions};
use ambit_index::TrackIndex;

use super::{print_candidates, print_json};

pub fn run_pca(
    index: &TrackIndex,
    track_id: &str,
    domain: &str,
    component: Option<&str>,
    direction: Polarity,
    options: &PcaDirectionOptions,
    json: bool,
) -> Result<()> {
    let engine = ExplorationEngine::new(index);
    let result = engine.pca_directional_candidates(
        &TrackId::new(track_id),
        domain,
        component,
        direction,
        options,
    )?;

    if json {
        return print_json(&result);
    }

    let axis = match &result.parameters.component {
        Some(component) if domain != ambit_core::PRIMARY_D => format!("{domain}.{component}"),
        _ => domain.to_string(),
    };
    println!("\n{} along {axis} from {}\n", direction, result.current_track);
    println!(
        "  Current value {:.4}, {} of {} candidates shown",
        result.current_value,
        result.candidates.len(),
        result.total_available
    );
    print_candidates(&result.candidates, "  ");
    Ok(())
}

pub fn run_vae(
    index: &TrackIndex,
    track_id: &str,
    latent_index: usize,
    direction: Polarity,
    options: &VaeDirectionOptions,
    json: bool,
) -> Result<()> {
    let engine = ExplorationEngine::new(index);
    let result =
        engine.vae_directional_candidates(&TrackId::new(track_id), latent_index, direction, options)?;

    if json {
        return print_json(&result);
    }

    println!(
        "\n{} along latent[{latent_index}] from {}\n",
        direction, result.current_track
    );
    match result.radius_multiple {
        Some(multiple) => println!(
            "  Escalated to radius {:.3} ({multiple}x default)",
            result.applied_radius
        ),
        None => println!("  Radius {:.3}", result.applied_radius),
    }
    println!(
        "  Current value {:.4}, {} of {} candidates shown",
        result.current_value,
        result.candidates.len(),
        result.total_available
    );
    print_candidates(&result.candidates, "  ");
    Ok(())
}
