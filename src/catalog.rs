//! Read-only tag catalog feeding the active region label.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read tag catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tag catalog {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CatalogRow")]
pub struct TagEntry {
    pub tag: String,
    pub sku: String,
}

/// One catalog row: either keyed fields or positional columns (tag first, sku second).
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogRow {
    Keyed { tag: String, sku: String },
    Columns(Vec<serde_json::Value>),
}

impl TryFrom<CatalogRow> for TagEntry {
    type Error = String;

    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        match row {
            CatalogRow::Keyed { tag, sku } => Ok(Self::new(tag, sku)),
            CatalogRow::Columns(cells) => match cells.as_slice() {
                [tag, sku, ..] => Ok(Self::new(cell_text(tag)?, cell_text(sku)?)),
                _ => Err(format!(
                    "catalog row needs tag and sku columns, found {}",
                    cells.len()
                )),
            },
        }
    }
}

fn cell_text(cell: &serde_json::Value) -> Result<String, String> {
    match cell {
        serde_json::Value::String(text) => Ok(text.clone()),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        serde_json::Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(format!("catalog cell is not text or a number: {other}")),
    }
}

impl TagEntry {
    pub fn new(tag: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            sku: sku.into(),
        }
    }

    /// The label stored with new regions: `"<tag> - <sku>"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.tag, self.sku)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCatalog {
    entries: Vec<TagEntry>,
}

impl TagCatalog {
    pub fn from_entries(entries: Vec<TagEntry>) -> Self {
        Self { entries }
    }

    /// Reads a JSON array of rows. A row is `{ "tag": ..., "sku": ... }` or a
    /// column array whose first two cells are the tag and the sku.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "loaded tag catalog");
        Ok(catalog)
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Vec<TagEntry>>(contents).map(Self::from_entries)
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TagEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
