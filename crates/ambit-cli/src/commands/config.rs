use anyhow::Result;
use ambit_explore::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  catalog_path: {}", config.catalog_path.display());
    println!(
        "  calibration_path: {}",
        config
            .calibration_path
            .as_ref()
            .map_or_else(|| "<built-in radii>".to_string(), |p| p.display().to_string())
    );
    println!("  resolution: {}", config.resolution);
    println!("  logging: {:?}", config.logging);

    println!("\nPriority: CLI args > ENV vars (AMBIT_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure ambit.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
