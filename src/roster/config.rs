//! # Configuration
//!
//! List behaviour is configured through [`confique`], which layers values from
//! three places, in priority order:
//!
//! 1. **Environment variables**: `ROSTER_PAGE_SIZE`, `ROSTER_CAPABILITIES`, etc.
//! 2. **Config file**: `roster.toml` in the OS config directory (via
//!    `directories`), or the file given with `--config`.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `page_size` | `20` | Items per page request |
//! | `default_sort_field` | `name` | Sort field sent when no column is active |
//! | `scroll_interval_ms` | `500` | Minimum time between scroll evaluations |
//! | `bottom_threshold_px` | `50` | Distance from the bottom that triggers a fetch |
//! | `overscan_rows` | `10` | Rows materialized beyond the viewport |
//! | `refresh_cooldown_secs` | `15` | Minimum time between user refreshes |
//! | `utc_offset_minutes` | `0` | Offset that typed dates are read in |
//! | `capabilities` | `[]` | Enabled integrations (`telegram`, `discord`, ...) |

use crate::error::Result;
use crate::list::ListSettings;
use crate::query::ParseContext;
use crate::render::RenderSettings;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "roster.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListConfig {
    /// Items per page request.
    #[config(default = 20, env = "ROSTER_PAGE_SIZE")]
    pub page_size: usize,

    #[config(default = "name", env = "ROSTER_DEFAULT_SORT_FIELD")]
    pub default_sort_field: String,

    #[config(default = 500, env = "ROSTER_SCROLL_INTERVAL_MS")]
    pub scroll_interval_ms: u64,

    #[config(default = 50.0, env = "ROSTER_BOTTOM_THRESHOLD_PX")]
    pub bottom_threshold_px: f64,

    #[config(default = 10, env = "ROSTER_OVERSCAN_ROWS")]
    pub overscan_rows: usize,

    #[config(default = 15, env = "ROSTER_REFRESH_COOLDOWN_SECS")]
    pub refresh_cooldown_secs: u64,

    /// Offset from UTC, in minutes, that dates typed into the search box use.
    #[config(default = 0, env = "ROSTER_UTC_OFFSET_MINUTES")]
    pub utc_offset_minutes: i32,

    /// Enabled integrations. Fields gated on anything else are not searchable.
    #[config(
        default = [],
        env = "ROSTER_CAPABILITIES",
        parse_env = confique::env::parse::list_by_comma
    )]
    pub capabilities: Vec<String>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_sort_field: "name".to_string(),
            scroll_interval_ms: 500,
            bottom_threshold_px: 50.0,
            overscan_rows: 10,
            refresh_cooldown_secs: 15,
            utc_offset_minutes: 0,
            capabilities: Vec::new(),
        }
    }
}

impl ListConfig {
    /// Loads from the environment, then `path` (or the default location when
    /// `None`), then compiled defaults. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ListConfig::builder().env();
        if let Some(file) = path.map(Path::to_path_buf).or_else(default_path) {
            builder = builder.file(file);
        }
        Ok(builder.load()?)
    }

    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            page_size: self.page_size.max(1),
            default_sort_field: self.default_sort_field.clone(),
            refresh_cooldown: Duration::from_secs(self.refresh_cooldown_secs),
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            overscan_rows: self.overscan_rows,
            scroll_interval: Duration::from_millis(self.scroll_interval_ms),
            bottom_threshold_px: self.bottom_threshold_px,
        }
    }

    pub fn parse_context(&self) -> ParseContext {
        ParseContext {
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }
}

/// `roster.toml` in the platform config directory.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "roster").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
