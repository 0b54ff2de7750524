use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use ambit_core::{Polarity, Resolution, SearchMode, PRIMARY_D};
use ambit_explore::Config;
use ambit_index::{IndexLoader, TrackIndex};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ambit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON track catalog (default: ~/.local/share/ambit/catalog.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Path to a TOML file of calibrated search radii
    #[arg(long, global = true)]
    calibration: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Explore the neighbourhood of a track
    ///
    /// Finds the tracks around the anchor, scores how much each feature
    /// dimension varies among them, and lists candidates that move further
    /// along the most promising dimensions in both directions.
    ///
    /// The search runs in the richest space requested and available. If
    /// that search fails, it falls back from VAE to PCA to raw features
    /// and reports which mode answered.
    Explore {
        /// Track identifier
        track_id: String,

        /// Resolution tier (microscope, magnifying_glass, binoculars)
        #[arg(long)]
        resolution: Option<Resolution>,

        /// Search mode (auto, vae, pca, features)
        #[arg(long, default_value = "auto")]
        mode: SearchMode,

        /// Prefer the VAE latent space when the track has one
        #[arg(long)]
        use_vae: bool,

        /// Do not use PCA projections in auto mode
        #[arg(long)]
        no_pca: bool,

        /// Maximum number of dimensions to offer
        #[arg(long, default_value_t = 6)]
        max_dimensions: usize,

        /// Radius for the raw feature search
        #[arg(long, default_value_t = 2.0)]
        radius: f64,

        /// Dimension to leave out of candidate distances (repeatable)
        #[arg(long = "ignore")]
        ignore_dimensions: Vec<String>,
    },
    /// List candidates along a PCA axis
    Pca {
        /// Track identifier
        track_id: String,

        /// PCA domain (primary_d, tonal, spectral, rhythmic)
        #[arg(long, default_value = PRIMARY_D)]
        domain: String,

        /// Component within the domain, e.g. pc2 (ignored for primary_d)
        #[arg(long)]
        component: Option<String>,

        /// Direction along the axis (positive, negative)
        #[arg(long)]
        direction: Polarity,

        /// Resolution tier
        #[arg(long)]
        resolution: Option<Resolution>,

        /// Maximum number of candidates
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Query a plain ball of this radius instead of the calibrated one
        #[arg(long)]
        adaptive_radius: Option<f64>,
    },
    /// List candidates along a VAE latent coordinate
    Vae {
        /// Track identifier
        track_id: String,

        /// Zero-based latent coordinate
        #[arg(long)]
        latent_index: usize,

        /// Direction along the coordinate (positive, negative)
        #[arg(long)]
        direction: Polarity,

        /// Resolution tier
        #[arg(long)]
        resolution: Option<Resolution>,

        /// Maximum number of candidates
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Size a neighbourhood to a target track count
    Adaptive {
        /// Track identifier
        track_id: String,

        /// Resolution tier whose primary_d radius is scaled
        #[arg(long)]
        resolution: Option<Resolution>,

        #[arg(long, default_value_t = 350)]
        target_min: usize,

        #[arg(long, default_value_t = 450)]
        target_max: usize,

        #[arg(long, default_value_t = 6)]
        max_iterations: usize,

        /// Starting scale factor for the calibrated radius
        #[arg(long, conflicts_with = "initial_radius")]
        initial_scale: Option<f64>,

        /// Starting radius
        #[arg(long)]
        initial_radius: Option<f64>,
    },
    /// Show which search spaces a track can be explored in
    Modes {
        /// Track identifier
        track_id: String,
    },
    /// Show index statistics and PCA axes
    Stats,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the current effective configuration
    Show,
    /// Show the config file path
    Path,
    /// Print an example configuration
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_overrides(cli.catalog, cli.calibration)?;
    if let Err(e) = twyg::setup(config.logging.clone()) {
        eprintln!("Failed to set up logging: {e}");
    }

    if let Commands::Config { action } = cli.command {
        return match action {
            ConfigAction::Show => commands::config::show_config(&config),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config(),
        };
    }

    log::debug!("Using catalog {}", config.catalog_path.display());
    let mut loader = IndexLoader::new(&config.catalog_path);
    if let Some(path) = &config.calibration_path {
        loader = loader.with_calibration(path);
    }
    let index = loader
        .initialize()
        .await
        .with_context(|| format!("Failed to load catalog {}", config.catalog_path.display()))?;
    log::info!(
        "Loaded {} tracks from {}",
        index.len(),
        config.catalog_path.display()
    );

    run(cli.command, index, &config, cli.json)
}

fn run(command: Commands, index: &TrackIndex, config: &Config, json: bool) -> Result<()> {
    log::debug!("Dispatching {command:?}");
    match command {
        Commands::Explore {
            track_id,
            resolution,
            mode,
            use_vae,
            no_pca,
            max_dimensions,
            radius,
            ignore_dimensions,
        } => {
            let options = ambit_explore::ExploreOptions {
                resolution: resolution.unwrap_or(config.resolution),
                search_mode: mode,
                use_vae,
                use_pca: !no_pca,
                max_dimensions,
                radius,
                ignore_dimensions,
                ..ambit_explore::ExploreOptions::default()
            };
            commands::explore::run_explore(index, &track_id, &options, json)
        }
        Commands::Pca {
            track_id,
            domain,
            component,
            direction,
            resolution,
            limit,
            adaptive_radius,
        } => {
            let options = ambit_explore::PcaDirectionOptions {
                resolution: resolution.unwrap_or(config.resolution),
                limit,
                adaptive_radius,
                precomputed_neighbors: None,
            };
            commands::directions::run_pca(
                index,
                &track_id,
                &domain,
                component.as_deref(),
                direction,
                &options,
                json,
            )
        }
        Commands::Vae {
            track_id,
            latent_index,
            direction,
            resolution,
            limit,
        } => {
            let options = ambit_explore::VaeDirectionOptions {
                resolution: resolution.unwrap_or(config.resolution),
                limit,
            };
            commands::directions::run_vae(index, &track_id, latent_index, direction, &options, json)
        }
        Commands::Adaptive {
            track_id,
            resolution,
            target_min,
            target_max,
            max_iterations,
            initial_scale,
            initial_radius,
        } => {
            let options = ambit_explore::AdaptiveOptions {
                resolution: resolution.unwrap_or(config.resolution),
                target_min,
                target_max,
                max_iterations,
                initial_scale,
                initial_radius,
                ..ambit_explore::AdaptiveOptions::default()
            };
            commands::adaptive::run_adaptive(index, &track_id, &options, json)
        }
        Commands::Modes { track_id } => commands::status::show_modes(index, &track_id, json),
        Commands::Stats => commands::status::show_stats(index, json),
        Commands::Config { .. } => {
            anyhow::bail!("config commands do not need the track index")
        }
    }
}
