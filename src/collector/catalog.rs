//! Source-of-truth list of terms to search
//!
//! The catalog is only consulted to seed an empty candidate set; after that
//! the store owns term membership.

use crate::config::CatalogConfig;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the term catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read term catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Term catalog is empty")]
    Empty,
}

/// Anything that can list the terms to collect
pub trait TermCatalog {
    fn load_terms(&self) -> Result<Vec<String>, CatalogError>;
}

/// Terms read from a text file, one per line
///
/// Blank lines and lines starting with `#` are skipped; surrounding
/// whitespace is trimmed.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TermCatalog for FileCatalog {
    fn load_terms(&self) -> Result<Vec<String>, CatalogError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

/// Terms given inline
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    terms: Vec<String>,
}

impl StaticCatalog {
    pub fn new(terms: Vec<String>) -> Self {
        Self { terms }
    }
}

impl TermCatalog for StaticCatalog {
    fn load_terms(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.terms.iter().map(|t| t.trim().to_string()).collect())
    }
}

/// The catalog described by `[catalog]`: the file's terms followed by inline ones
#[derive(Debug, Clone)]
pub struct ConfigCatalog {
    file: Option<FileCatalog>,
    inline: StaticCatalog,
}

impl ConfigCatalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            file: config
                .path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(FileCatalog::new),
            inline: StaticCatalog::new(config.terms.clone()),
        }
    }
}

impl TermCatalog for ConfigCatalog {
    fn load_terms(&self) -> Result<Vec<String>, CatalogError> {
        let mut terms = match &self.file {
            Some(file) => file.load_terms()?,
            None => Vec::new(),
        };
        terms.extend(self.inline.load_terms()?);

        let mut seen = HashSet::new();
        terms.retain(|t| !t.is_empty() && seen.insert(t.clone()));

        if terms.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(terms)
    }
}
