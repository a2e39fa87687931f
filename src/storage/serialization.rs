//! JSON files for datasets, clusters and marks.

use crate::analysis::SolutionMarksHolder;
use crate::clustering::{Clusters, MarkedClusters};
use crate::error::Result;
use crate::model::Dataset;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

fn store_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    debug!("Stored {}", path.display());
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    let value = serde_json::from_reader(reader)?;
    debug!("Loaded {}", path.display());
    Ok(value)
}

pub fn store_dataset(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    store_json(dataset, path.as_ref())
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    load_json(path.as_ref())
}

pub fn store_clusters<V: Serialize>(clusters: &Clusters<V>, path: impl AsRef<Path>) -> Result<()> {
    store_json(clusters, path.as_ref())
}

pub fn load_clusters<V: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Clusters<V>> {
    load_json(path.as_ref())
}

pub fn store_marked_clusters<V: Serialize, L: Serialize>(
    marked: &MarkedClusters<V, L>,
    path: impl AsRef<Path>,
) -> Result<()> {
    store_json(marked, path.as_ref())
}

pub fn load_marked_clusters<V: DeserializeOwned, L: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<MarkedClusters<V, L>> {
    load_json(path.as_ref())
}

pub fn store_marks(marks: &SolutionMarksHolder, path: impl AsRef<Path>) -> Result<()> {
    store_json(marks, path.as_ref())
}

pub fn load_marks(path: impl AsRef<Path>) -> Result<SolutionMarksHolder> {
    load_json(path.as_ref())
}
