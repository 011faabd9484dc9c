use crate::dashboard::model::{Theme, GRID_COLUMNS};
use crate::dashboard::persistence::PersistenceConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    /// Quiet period after the last edit before an automatic save.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Grid columns of the host's widest breakpoint. The host passes it to
    /// `DashboardStore::layout_for`; stored state always uses 12 columns.
    #[serde(default = "default_columns")]
    pub columns: u32,
    /// Enable debug level logging and honour `RUST_LOG`.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Folder used by the file backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Base URL of the dashboard REST service. The file backend is used when unset.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub default_theme: Theme,
}

fn default_debounce_ms() -> u64 {
    5_000
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_columns() -> u32 {
    GRID_COLUMNS
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("dashboards")
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            columns: default_columns(),
            debug_logging: false,
            log_file: None,
            data_dir: default_data_dir(),
            api_base_url: None,
            default_theme: Theme::default(),
        }
    }
}

impl EngineSettings {
    /// Missing or blank files yield the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(&content)?;
        if settings.columns == 0 {
            tracing::warn!("settings specify zero grid columns; using {}", GRID_COLUMNS);
            settings.columns = GRID_COLUMNS;
        }
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings file {}", path.display()))?;
        Ok(())
    }

    pub fn persistence(&self) -> PersistenceConfig {
        PersistenceConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}
