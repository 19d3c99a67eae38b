//! Configuration for stackmux.
//!
//! This module provides TOML configuration file loading from
//! `~/.stackmux/config.toml`. Every key is optional; a missing or
//! unparseable file falls back to the defaults.
//!
//! # Configuration File
//!
//! ```toml
//! # Shell to run in new windows (default: $SHELL, then /bin/sh)
//! shell = "/bin/zsh"
//!
//! # Base window title; the window id is appended to it
//! title = "shell"
//!
//! # Titlebar text color: blue, red or green
//! title_color = "blue"
//!
//! # Geometry of new windows, in cells
//! width = 80
//! height = 24
//! x = 1
//! y = 1
//! ```

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ui::surface::Rect;
use crate::wm::{TitleColor, WindowSpec};

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell command for new windows
    pub shell: Option<String>,
    /// Base window title
    pub title: String,
    /// Titlebar text color
    pub title_color: TitleColor,
    /// New window geometry
    pub width: u16,
    pub height: u16,
    pub x: u16,
    pub y: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            title: "shell".to_string(),
            title_color: TitleColor::default(),
            width: 80,
            height: 24,
            x: 1,
            y: 1,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    /// The shell new windows run: config, then $SHELL, then /bin/sh.
    pub fn resolve_shell(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "/bin/sh".to_string())
    }

    /// Parameters for a window opened with the configured defaults.
    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            title: self.title.clone(),
            title_color: self.title_color,
            rect: Rect::new(self.x, self.y, self.width, self.height),
            shell: self.resolve_shell(),
        }
    }

    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        state_dir().map(|dir| dir.join("config.toml"))
    }
}

/// Per-user state directory (`~/.stackmux`), created on first use. Holds
/// the config file and the log.
pub fn state_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from)?;
    let dir = home.join(".stackmux");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}
