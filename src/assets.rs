use itertools::Itertools;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

use crate::error::Result;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "avif"];

const BUILTIN_TILES: [&str; 24] = [
    "harbor", "lantern", "orchard", "glacier", "meadow", "canyon", "reef", "aurora", "dune",
    "fjord", "grove", "mesa", "lagoon", "summit", "delta", "prairie", "tundra", "cove", "marsh",
    "ridge", "atoll", "basin", "cliff", "spring",
];

/// One background column: its tiles, in order, repeated twice so the
/// scroll can wrap without a seam.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnContent {
    pub tiles: Vec<String>,
}

impl ColumnContent {
    fn doubled(tiles: Vec<String>) -> Self {
        let mut all = tiles.clone();
        all.extend(tiles);
        Self { tiles: all }
    }

    pub fn content_height(&self, tile_height: f64) -> f64 {
        self.tiles.len() as f64 * tile_height
    }

    /// Height of one non-duplicated set.
    pub fn cycle_height(&self, tile_height: f64) -> f64 {
        self.content_height(tile_height) / 2.0
    }
}

pub fn builtin_tiles() -> Vec<String> {
    BUILTIN_TILES.iter().map(|s| s.to_string()).collect()
}

/// Image files in `dir`, sorted by file name, as display labels (file stems).
pub fn load_image_dir(dir: &Path) -> Result<Vec<String>> {
    let mut labels = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to load image entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_image {
            debug!("skipping non-image {}", path.display());
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => labels.push(stem.to_string()),
            None => error!("Failed to load image: {}", path.display()),
        }
    }
    labels.sort();
    Ok(labels)
}

/// Split tiles into columns: the first `featured` go to the middle column,
/// the rest is shared evenly (the last column takes the remainder) and the
/// middle column appends its share after the featured tiles.
pub fn populate_grid(tiles: &[String], column_count: usize, featured: usize) -> Vec<ColumnContent> {
    if column_count == 0 {
        return Vec::new();
    }
    let middle = column_count / 2;
    let featured_len = featured.min(tiles.len());
    let (featured_tiles, remaining) = tiles.split_at(featured_len);
    let per_column = remaining.len() / column_count;

    (0..column_count)
        .map(|i| {
            let start = i * per_column;
            let end = if i + 1 == column_count {
                remaining.len()
            } else {
                start + per_column
            };
            let share = &remaining[start..end];
            let column = if i == middle {
                featured_tiles.iter().chain(share).cloned().collect_vec()
            } else {
                share.to_vec()
            };
            ColumnContent::doubled(column)
        })
        .collect()
}
