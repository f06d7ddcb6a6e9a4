// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory and config file resolution.

use std::ffi::OsString;
use std::path::PathBuf;

use folio_core::FolioConfig;
use folio_core::config::CONFIG_FILE;
use folio_core::error::SetupError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FOLIO_DATA_DIR";

const APP_DIR: &str = "folio";

/// Where the store lives and how it is configured.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub data_dir: PathBuf,
    pub config: FolioConfig,
}

/// Resolve the data directory and load the config.
///
/// Precedence for the data directory: `--data-dir`, then `FOLIO_DATA_DIR`,
/// then `data_dir` from the config file, then the platform default. The
/// config file is `--config` if given, otherwise `config.json` in the
/// directory found without consulting the config.
pub fn resolve(
    flag_dir: Option<PathBuf>,
    flag_config: Option<PathBuf>,
) -> Result<Resolved, SetupError> {
    let explicit = flag_dir.or_else(|| non_empty(std::env::var_os(DATA_DIR_ENV)));
    let bootstrap = explicit.clone().unwrap_or_else(default_data_dir);

    let config_path = flag_config.unwrap_or_else(|| bootstrap.join(CONFIG_FILE));
    let config = FolioConfig::load(&config_path)?;

    let data_dir = explicit
        .or_else(|| config.data_dir.clone())
        .unwrap_or(bootstrap);

    Ok(Resolved { data_dir, config })
}

/// `$XDG_DATA_HOME/folio`, else `$HOME/.local/share/folio`, else a temp dir.
pub fn default_data_dir() -> PathBuf {
    base_dir(
        non_empty(std::env::var_os("XDG_DATA_HOME")),
        non_empty(std::env::var_os("HOME")),
    )
    .join(APP_DIR)
}

fn base_dir(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(xdg) = xdg {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".local").join("share");
    }
    std::env::temp_dir()
}

fn non_empty(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let dir = base_dir(Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/xdg"));
    }

    #[test]
    fn home_falls_back_to_local_share() {
        let dir = base_dir(None, Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/home/u/.local/share"));
    }

    #[test]
    fn explicit_dir_reads_its_own_config() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = FolioConfig {
            default_dpi: 96,
            ..FolioConfig::default()
        };
        config.save(&tmp.path().join(CONFIG_FILE)).expect("save");

        let resolved = resolve(Some(tmp.path().to_path_buf()), None).expect("resolve");
        assert_eq!(resolved.data_dir, tmp.path());
        assert_eq!(resolved.config.default_dpi, 96);
    }

    #[test]
    fn config_data_dir_is_used_without_flag_or_env() {
        if std::env::var_os(DATA_DIR_ENV).is_some() {
            return;
        }
        let tmp = tempfile::tempdir().expect("tempdir");
        let target = tmp.path().join("store");
        let config_path = tmp.path().join("custom.json");
        FolioConfig {
            data_dir: Some(target.clone()),
            ..FolioConfig::default()
        }
        .save(&config_path)
        .expect("save");

        let resolved = resolve(None, Some(config_path)).expect("resolve");
        assert_eq!(resolved.data_dir, target);
    }

    #[test]
    fn malformed_config_is_a_setup_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_path = tmp.path().join("bad.json");
        std::fs::write(&config_path, "{ nope").expect("write");

        let err = resolve(Some(tmp.path().to_path_buf()), Some(config_path))
            .expect_err("must fail");
        assert!(matches!(err, SetupError::ConfigParse { .. }));
    }
}
