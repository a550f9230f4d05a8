use anyhow::{Context, Result};
use geosync::client::SyncClient;
use geosync::config::{env::CONFIG_PATH_VAR, load_config, SyncConfig};
use geosync::render::{GeofenceSet, LogDisplay, MarkerStyle, StyleCache};
use geosync::state::EntityChange;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geosync=info".into()),
        )
        .init();

    info!("geosync starting...");

    let mut config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => {
            info!(path = %path, "Using config file");
            load_config(&path)?
        }
        Err(_) => {
            info!("Config file: none given, using defaults");
            SyncConfig::default()
        }
    };
    config.apply_env();

    let layer = GeofenceSet::with_ids(config.geofence.known_ids.iter().cloned());
    let mut client = SyncClient::new(&config, LogDisplay::new(), layer)
        .context("Failed to create sync client")?;

    tokio::spawn(log_entity_changes(client.subscribe()));

    client
        .connect(&config.channel.name)
        .context("Failed to open channel")?;

    client
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;

    let stats = client.stats().snapshot();
    info!(
        frames = stats.frames,
        applied = stats.applied,
        dropped = stats.dropped,
        malformed = stats.malformed,
        unknown = stats.unknown,
        entities = client.reader().len(),
        "geosync stopped"
    );

    Ok(())
}

/// Stand-in renderer: logs every entity change with its marker style
async fn log_entity_changes(mut changes: broadcast::Receiver<EntityChange>) {
    let mut styles: StyleCache<MarkerStyle> = StyleCache::new();

    loop {
        match changes.recv().await {
            Ok(change) => {
                let entity = &change.entity;
                let color = entity.color.as_deref().unwrap_or("grey");
                let style = styles.get_or_insert_with(color, MarkerStyle::for_color);
                let location = entity.location();
                info!(
                    entity_id = %entity.id,
                    created = change.created,
                    x = entity.position.x,
                    y = entity.position.y,
                    longitude = location.longitude,
                    latitude = location.latitude,
                    fill = %style.fill,
                    "Entity moved"
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "Renderer lagged, skipped updates");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
