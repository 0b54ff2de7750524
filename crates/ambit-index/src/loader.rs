//! Lazy, build-once loading of a [`TrackIndex`] from catalog files.

use std::path::{Path, PathBuf};

use ambit_core::{CalibrationSettings, Result, Track};
use tokio::sync::OnceCell;

use crate::track_index::TrackIndex;

/// Loads a JSON track catalog (and optional TOML calibration) into a
/// [`TrackIndex`] the first time it is asked for.
///
/// `initialize` may be called any number of times, concurrently or not;
/// the catalog is read and the index built exactly once, and every caller
/// receives the same immutable index.
#[derive(Debug)]
pub struct IndexLoader {
    catalog_path: PathBuf,
    calibration_path: Option<PathBuf>,
    index: OnceCell<TrackIndex>,
}

impl IndexLoader {
    #[must_use]
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            calibration_path: None,
            index: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_calibration(mut self, calibration_path: impl Into<PathBuf>) -> Self {
        self.calibration_path = Some(calibration_path.into());
        self
    }

    #[must_use]
    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Build the index if it has not been built yet and return it.
    ///
    /// # Errors
    /// Returns an error if the catalog or calibration file cannot be read or
    /// parsed, or the tracks fail validation. A failed build leaves the
    /// loader uninitialised so a later call can retry.
    pub async fn initialize(&self) -> Result<&TrackIndex> {
        self.index.get_or_try_init(|| self.build()).await
    }

    /// The index, if `initialize` has already succeeded.
    #[must_use]
    pub fn get(&self) -> Option<&TrackIndex> {
        self.index.get()
    }

    async fn build(&self) -> Result<TrackIndex> {
        log::info!("Loading track catalog from {}", self.catalog_path.display());
        let content = tokio::fs::read_to_string(&self.catalog_path).await?;
        let tracks: Vec<Track> = serde_json::from_str(&content)?;

        let calibration = match &self.calibration_path {
            Some(path) => {
                log::info!("Loading calibration from {}", path.display());
                let content = tokio::fs::read_to_string(path).await?;
                CalibrationSettings::from_toml_str(&content)?
            }
            None => {
                log::debug!("No calibration file configured, using built-in radii");
                CalibrationSettings::builtin()
            }
        };

        TrackIndex::build(tracks, calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambit_core::{Resolution, SpatialIndex};
    use tempfile::TempDir;

    const CATALOG: &str = r#"[
        { "id": "a", "title": "One", "artist": "X", "features": { "bpm": 120.0 } },
        { "id": "b", "title": "Two", "artist": "Y", "features": { "bpm": 128.0 } }
    ]"#;

    #[tokio::test]
    async fn test_initialize_builds_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, CATALOG).unwrap();

        let loader = IndexLoader::new(&path);
        assert!(loader.get().is_none());

        let index = loader.initialize().await.unwrap();
        assert_eq!(index.len(), 2);
        assert!(loader.get().is_some());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, CATALOG).unwrap();

        let loader = IndexLoader::new(&path);
        let first: *const TrackIndex = loader.initialize().await.unwrap();

        // A second call must not touch the file again.
        std::fs::remove_file(&path).unwrap();
        let second: *const TrackIndex = loader.initialize().await.unwrap();

        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn test_initialize_reports_missing_catalog() {
        let dir = TempDir::new().unwrap();
        let loader = IndexLoader::new(dir.path().join("missing.json"));

        assert!(loader.initialize().await.is_err());
        assert!(loader.get().is_none());
    }

    #[tokio::test]
    async fn test_initialize_with_calibration_file() {
        let dir = TempDir::new().unwrap();
        let catalog = dir.path().join("catalog.json");
        let calibration = dir.path().join("calibration.toml");
        std::fs::write(&catalog, CATALOG).unwrap();
        std::fs::write(
            &calibration,
            "[microscope.primary_d]\ninner_radius = 0.0\nouter_radius = 0.01\n",
        )
        .unwrap();

        let loader = IndexLoader::new(&catalog).with_calibration(&calibration);
        let index = loader.initialize().await.unwrap();

        assert!(index.calibration().get(Resolution::Microscope, "primary_d").is_some());
        assert!(index.calibration().get(Resolution::Binoculars, "primary_d").is_none());
    }
}
