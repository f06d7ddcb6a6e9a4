// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Config file name looked up inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent settings. Missing fields in a config file fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Root directory holding the content store and the index database.
    /// `None` means the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// File name of the SQLite index inside `data_dir`.
    pub database_file: String,
    /// URL prefix under which stored blobs are served.
    pub media_url: String,
    /// Page size used when a listing request does not name one.
    pub default_page_size: u32,
    /// Upper bound for listing page sizes.
    pub max_page_size: u32,
    /// Resolution used by page rasterization when none is given.
    pub default_dpi: u32,
    /// Upper bound for rasterization resolution.
    pub max_dpi: u32,
    /// Longest accepted document title, in characters.
    pub max_title_len: usize,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Directory containing the PDFium shared library. `None` uses the
    /// system library search path.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: "folio.db".into(),
            media_url: "/media/".into(),
            default_page_size: 20,
            max_page_size: 100,
            default_dpi: 200,
            max_dpi: 600,
            max_title_len: 255,
            log_level: "info".into(),
            pdfium_library_path: None,
        }
    }
}

impl FolioConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SetupError::ConfigRead {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|err| SetupError::ConfigParse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    /// Write settings as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), SetupError> {
        let write_err = |source: std::io::Error| SetupError::ConfigWrite {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| SetupError::ConfigParse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        std::fs::write(path, json).map_err(write_err)
    }

    /// Path of the SQLite index inside `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    /// Public URL of a stored blob: `media_url` joined with its location.
    pub fn file_url(&self, location: &str) -> String {
        format!(
            "{}/{}",
            self.media_url.trim_end_matches('/'),
            location.trim_start_matches('/')
        )
    }

    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn clamp_page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: FolioConfig = serde_json::from_str(r#"{ "max_dpi": 300 }"#).unwrap();
        assert_eq!(config.max_dpi, 300);
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.max_title_len, 255);
    }

    #[test]
    fn file_url_joins_prefix_and_location() {
        let config = FolioConfig::default();
        assert_eq!(config.file_url("images/a.png"), "/media/images/a.png");

        let bare = FolioConfig {
            media_url: "https://cdn.example.org/files".into(),
            ..FolioConfig::default()
        };
        assert_eq!(bare.file_url("pdfs/b.pdf"), "https://cdn.example.org/files/pdfs/b.pdf");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("folio-config-that-does-not-exist.json");
        assert_eq!(FolioConfig::load(&path).unwrap(), FolioConfig::default());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("folio-bad-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = FolioConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(SetupError::ConfigParse { .. })));
    }

    #[test]
    fn page_size_is_clamped() {
        let config = FolioConfig::default();
        assert_eq!(config.clamp_page_size(None), 20);
        assert_eq!(config.clamp_page_size(Some(0)), 1);
        assert_eq!(config.clamp_page_size(Some(10_000)), 100);
    }
}
