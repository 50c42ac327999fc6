use crate::error::{Result, RosterError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile<T> {
    List(Vec<T>),
    Wrapped { items: Vec<T> },
}

/// Loads items from a JSON file holding either a bare array or an
/// `{"items": [...]}` object (a saved page response).
pub fn load_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)?;
    let file: FixtureFile<T> = serde_json::from_str(&content)
        .map_err(|e| RosterError::Fixture(format!("{}: {}", path.display(), e)))?;
    Ok(match file {
        FixtureFile::List(items) => items,
        FixtureFile::Wrapped { items } => items,
    })
}
