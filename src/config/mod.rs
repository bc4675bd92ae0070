use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::source::DEFAULT_IMAGE_EXTENSIONS;
use crate::viewport::AspectMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "region-selector";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub regions_dir: Option<PathBuf>,
    pub aspect_mode: AspectMode,
    pub zoom_enabled: bool,
    pub image_extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            regions_dir: None,
            aspect_mode: AspectMode::Keep,
            zoom_enabled: true,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|extension| extension.to_string())
                .collect(),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

/// Command-line overrides: `[IMAGE_DIR] [--tags FILE] [--regions DIR]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupArgs {
    pub image_dir: Option<PathBuf>,
    pub tags_file: Option<PathBuf>,
    pub regions_dir: Option<PathBuf>,
}

impl StartupArgs {
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--tags" => parsed.tags_file = args.next().map(PathBuf::from),
                "--regions" => parsed.regions_dir = args.next().map(PathBuf::from),
                flag if flag.starts_with("--") => {
                    tracing::warn!(flag, "ignoring unknown command-line flag");
                }
                _ if parsed.image_dir.is_none() => parsed.image_dir = Some(PathBuf::from(&arg)),
                _ => tracing::warn!(arg = %arg, "ignoring extra positional argument"),
            }
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "region-selector",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/config-root/region-selector/config.json")
        );
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path(
            "region-selector",
            "config.json",
            None,
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/home/.config/region-selector/config.json")
        );
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("region-selector", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{"aspect_mode": "ignore", "zoom_enabled": false}"#)
                .expect("config should parse");
        assert_eq!(config.aspect_mode, AspectMode::Ignore);
        assert!(!config.zoom_enabled);
        assert_eq!(config.image_extensions, vec!["png", "jpg"]);
        assert_eq!(config.regions_dir, None);
    }

    #[test]
    fn malformed_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join(APP_DIR);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join(APP_CONFIG_FILE), "{ not json").unwrap();

        assert_eq!(
            load_app_config_with(Some(dir.path()), None),
            AppConfig::default()
        );
    }

    #[test]
    fn startup_args_read_folder_and_flags() {
        let args = StartupArgs::parse(
            ["photos", "--tags", "tags.json", "--regions", "out", "--bogus"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(
            args,
            StartupArgs {
                image_dir: Some(PathBuf::from("photos")),
                tags_file: Some(PathBuf::from("tags.json")),
                regions_dir: Some(PathBuf::from("out")),
            }
        );
    }
}
