use super::{FeatureLayer, GeofenceHighlight};
use crate::event::FeatureId;
use std::collections::HashMap;
use tracing::info;

/// In-memory geofence collection with per-fence highlight state.
///
/// Stands in for a map layer: ids are registered up front (normally from the
/// feature service), highlights are remembered per id, and refresh requests
/// are counted so a loader can act on them.
#[derive(Debug, Default)]
pub struct GeofenceSet {
    fences: HashMap<FeatureId, Option<GeofenceHighlight>>,
    refreshes: u64,
}

impl GeofenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from known geofence ids
    pub fn with_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = FeatureId>,
    {
        Self {
            fences: ids.into_iter().map(|id| (id, None)).collect(),
            refreshes: 0,
        }
    }

    pub fn insert(&mut self, id: FeatureId) {
        self.fences.entry(id).or_insert(None);
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    /// Current highlight, `None` if the fence was never highlighted or is unknown
    pub fn highlight_of(&self, id: &FeatureId) -> Option<&GeofenceHighlight> {
        self.fences.get(id).and_then(|h| h.as_ref())
    }

    /// Number of refresh requests received
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }
}

impl FeatureLayer for GeofenceSet {
    fn contains_geofence(&self, id: &FeatureId) -> bool {
        self.fences.contains_key(id)
    }

    fn highlight(&mut self, highlight: &GeofenceHighlight) {
        if let Some(slot) = self.fences.get_mut(&highlight.geofence_id) {
            info!(
                geofence_id = %highlight.geofence_id,
                color = %highlight.color,
                "Geofence highlight changed"
            );
            *slot = Some(highlight.clone());
        }
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
        info!(refreshes = self.refreshes, "Geofence collection refresh requested");
    }
}
