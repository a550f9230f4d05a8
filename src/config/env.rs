use super::SyncConfig;

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_VAR: &str = "GEOSYNC_CONFIG";

impl SyncConfig {
    /// Overlay `GEOSYNC_*` environment variables onto this config.
    ///
    /// Unparseable values are ignored and the current value kept.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (environment in production)
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GEOSYNC_WS_BASE") {
            self.channel.base_url = v;
        }
        if let Some(v) = lookup("GEOSYNC_CHANNEL") {
            self.channel.name = v;
        }
        if let Some(v) = lookup("GEOSYNC_QUEUE_CAPACITY") {
            if let Ok(n) = v.parse::<usize>() {
                self.channel.queue_capacity = n;
            }
        }
        if let Some(v) = lookup("GEOSYNC_GEOFENCE_LAYER") {
            self.geofence.layer = v;
        }
        if let Some(v) = lookup("GEOSYNC_ECHO_PAYLOADS") {
            if let Ok(b) = v.parse::<bool>() {
                self.display.echo_payloads = b;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_vars_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GEOSYNC_WS_BASE", "ws://example.com:7700/listen"),
            ("GEOSYNC_CHANNEL", "public"),
            ("GEOSYNC_QUEUE_CAPACITY", "64"),
            ("GEOSYNC_GEOFENCE_LAYER", "zones"),
            ("GEOSYNC_ECHO_PAYLOADS", "true"),
        ]);

        let mut config = SyncConfig::default();
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.channel.base_url, "ws://example.com:7700/listen");
        assert_eq!(config.channel.name, "public");
        assert_eq!(config.channel.queue_capacity, 64);
        assert_eq!(config.geofence.layer, "zones");
        assert!(config.display.echo_payloads);
    }

    #[test]
    fn test_unparseable_values_keep_current() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GEOSYNC_QUEUE_CAPACITY", "lots"),
            ("GEOSYNC_ECHO_PAYLOADS", "maybe"),
        ]);

        let mut config = SyncConfig::default();
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.channel.queue_capacity, 1024);
        assert!(!config.display.echo_payloads);
    }
}
