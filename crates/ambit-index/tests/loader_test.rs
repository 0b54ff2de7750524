//! Catalog loading through the public loader API.

use std::sync::Arc;

use ambit_core::{Resolution, SearchMode, SmartSearchOptions, SpatialIndex, TrackId, PRIMARY_D};
use ambit_index::IndexLoader;
use tempfile::TempDir;

const CATALOG: &str = r#"[
    { "id": "a", "title": "One", "artist": "X",
      "features": { "bpm": 120.0, "spectral_centroid": 1800.0 },
      "pca": { "primary_d": 0.50 } },
    { "id": "b", "title": "Two", "artist": "Y",
      "features": { "bpm": 124.0, "spectral_centroid": 1900.0 },
      "pca": { "primary_d": 0.58 } },
    { "id": "c", "title": "Three", "artist": "Z",
      "features": { "bpm": 90.0 } }
]"#;

fn write_catalog(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, CATALOG).unwrap();
    path
}

#[tokio::test]
async fn test_concurrent_initialize_builds_once() {
    let dir = TempDir::new().unwrap();
    let loader = Arc::new(IndexLoader::new(write_catalog(&dir)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move {
                let index = loader.initialize().await.unwrap();
                std::ptr::from_ref(index) as usize
            })
        })
        .collect();

    let mut addresses = Vec::new();
    for handle in handles {
        addresses.push(handle.await.unwrap());
    }
    addresses.dedup();
    assert_eq!(addresses.len(), 1);
}

#[tokio::test]
async fn test_loaded_index_answers_queries() {
    let dir = TempDir::new().unwrap();
    let loader = IndexLoader::new(write_catalog(&dir));
    let index = loader.initialize().await.unwrap();

    let stats = index.stats();
    assert_eq!(stats.track_count, 3);
    assert_eq!(stats.tracks_with_pca, 2);
    assert_eq!(stats.tracks_with_vae, 0);
    assert_eq!(index.dimensions(), ["bpm", "spectral_centroid"]);

    let anchor = index.track(&TrackId::new("a")).unwrap();
    let options = SmartSearchOptions {
        mode: SearchMode::Pca,
        resolution: Resolution::MagnifyingGlass,
        discriminator: PRIMARY_D.to_string(),
        radius: 2.0,
        weights: None,
        limit: 50,
    };
    let neighbors = index.smart_radius_search(&anchor, &options).unwrap();
    let ids: Vec<&str> = neighbors.iter().map(|n| n.track.id.as_str()).collect();
    assert_eq!(ids, ["b"]);
}

#[tokio::test]
async fn test_malformed_catalog_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, "{ not json").unwrap();

    let loader = IndexLoader::new(&path);
    assert!(loader.initialize().await.is_err());
    assert!(loader.get().is_none());
}
