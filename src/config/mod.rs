pub mod env;

use crate::event::FeatureId;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Complete client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub geofence: GeofenceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Push channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Listen endpoint; the channel name is appended as a path segment
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Channel to subscribe to on startup
    #[serde(default = "default_channel")]
    pub name: String,
    /// Bound of the intake queue between transport and reconciler
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_base_url() -> String {
    "ws://localhost:7700/listen".to_string()
}

fn default_channel() -> String {
    "objects".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            name: default_channel(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Geofence collection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceConfig {
    /// Layer name that triggers a geofence refresh on layer change
    #[serde(default = "default_layer")]
    pub layer: String,
    /// Boundary color of a geofence nobody is inside
    #[serde(default = "default_neutral_color")]
    pub neutral_color: String,
    /// Geofences known up front (normally loaded from the feature service)
    #[serde(default)]
    pub known_ids: Vec<FeatureId>,
}

fn default_layer() -> String {
    "geofences".to_string()
}

fn default_neutral_color() -> String {
    "blue".to_string()
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            neutral_color: default_neutral_color(),
            known_ids: Vec::new(),
        }
    }
}

/// Status display configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    /// Show every parsed payload, pretty-printed, before applying it
    #[serde(default)]
    pub echo_payloads: bool,
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<SyncConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SyncConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
