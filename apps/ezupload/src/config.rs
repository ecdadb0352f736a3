//! Configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/ezupload/config.toml`
//! - Windows: `%APPDATA%/ezupload/config.toml`

use std::path::{Path, PathBuf};

use ezupload_protocol::constants::{DEFAULT_CHANNEL_PORT, DEFAULT_PAGE_PORT};
use ezupload_transfer::TransferMode;
use serde::{Deserialize, Serialize};

/// Persistent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Ask to confirm the destination even when it was given explicitly.
    #[serde(default)]
    pub confirm_context_menu_upload: bool,

    /// Source provider selection (`auto`, `native` or `picker`).
    #[serde(default)]
    pub mode: TransferMode,

    /// Interface the picker page and channel bind to.
    #[serde(default = "default_bind")]
    pub picker_bind: String,

    /// HTTP port of the picker page (0 = auto-assign).
    #[serde(default = "default_page_port")]
    pub picker_port: u16,

    /// WebSocket port of the picker channel (0 = auto-assign).
    #[serde(default = "default_channel_port")]
    pub picker_ws_port: u16,

    /// Extra workspace roots, consulted after the command-line ones.
    #[serde(default)]
    pub workspace_roots: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_page_port() -> u16 {
    DEFAULT_PAGE_PORT
}

fn default_channel_port() -> u16 {
    DEFAULT_CHANNEL_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confirm_context_menu_upload: false,
            mode: TransferMode::default(),
            picker_bind: default_bind(),
            picker_port: default_page_port(),
            picker_ws_port: default_channel_port(),
            workspace_roots: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the default location, creating it with
    /// defaults if missing.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, creating it with defaults if missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        Ok(ezupload_file_ops::home_dir()
            .join(".config")
            .join("ezupload")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("ezupload").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/ezupload/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.confirm_context_menu_upload);
        assert_eq!(config.mode, TransferMode::Auto);
        assert_eq!(config.picker_bind, "127.0.0.1");
        assert_eq!(config.picker_port, 8765);
        assert_eq!(config.picker_ws_port, 8766);
        assert!(config.workspace_roots.is_empty());
    }

    #[test]
    fn config_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            confirm_context_menu_upload = true
            mode = "picker"
            "#,
        )
        .unwrap();
        assert!(config.confirm_context_menu_upload);
        assert_eq!(config.mode, TransferMode::Picker);
        assert_eq!(config.picker_port, 8765);
    }

    #[test]
    fn config_rejects_unknown_mode() {
        assert!(toml::from_str::<Config>(r#"mode = "sometimes""#).is_err());
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("ezupload"));
    }

    #[test]
    fn config_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let config = Config {
            mode: TransferMode::Native,
            workspace_roots: vec!["~/projects".into()],
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }
}
