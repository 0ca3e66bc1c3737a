use std::path::PathBuf;

use gridshell_types::{Error, GridSpec, Result};
use serde::{Deserialize, Serialize};

/// Resolve the shell data directory based on priority:
/// 1. Explicit path from the config file (with tilde expansion)
/// 2. GRIDSHELL_PATH environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. ~/.gridshell (fallback for systems without XDG)
pub fn resolve_data_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("GRIDSHELL_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("gridshell"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".gridshell"));
    }

    Err(Error::PersistenceUnavailable(
        "could not determine data path: no HOME directory or XDG data directory found".to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub autosave_debounce_ms: i64,
    pub default_workspace_name: String,
    pub user_id: String,
    /// Overrides the resolved data directory when set.
    pub data_dir: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            grid_rows: 3,
            grid_cols: 4,
            autosave_debounce_ms: 1_000,
            default_workspace_name: "My Workspace".to_string(),
            user_id: "local".to_string(),
            data_dir: None,
        }
    }
}

impl ShellConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ShellConfig =
            toml::from_str(&content).map_err(|e| Error::PersistenceUnavailable(e.to_string()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::PersistenceUnavailable(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_data_path(None)?.join("config.toml"))
    }

    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.grid_rows, self.grid_cols)
    }

    pub fn autosave_debounce(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.autosave_debounce_ms)
    }

    pub fn workspaces_dir(&self) -> Result<PathBuf> {
        Ok(resolve_data_path(self.data_dir.as_deref())?.join("workspaces"))
    }
}
