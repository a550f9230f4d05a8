use crate::event::{FeatureId, ObjectChange};
use crate::geo::{LonLat, MercatorPoint};
use serde::Serialize;
use serde_json::{Map, Value};

/// Entity represents one tracked, geolocated object
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entity {
    /// Server-assigned identifier, stable for the entity's lifetime
    pub id: FeatureId,

    /// Position in the map frame (Web Mercator metres)
    pub position: MercatorPoint,

    /// Server event time of the last update (opaque)
    pub timestamp: Option<String>,

    /// Object properties, replaced wholesale on every update
    pub attributes: Map<String, Value>,

    /// Display color
    pub color: Option<String>,
}

impl Entity {
    /// Build a new entity from an object change
    pub fn from_change(change: &ObjectChange) -> Self {
        Self {
            id: change.object_id.clone(),
            position: change.location.to_mercator(),
            timestamp: change.timestamp.clone(),
            attributes: change.attributes.clone(),
            color: change.color.clone(),
        }
    }

    /// Replace position, timestamp, attributes and color in place.
    /// The id is left untouched.
    pub fn apply(&mut self, change: &ObjectChange) {
        self.position = change.location.to_mercator();
        self.timestamp = change.timestamp.clone();
        self.attributes = change.attributes.clone();
        self.color = change.color.clone();
    }

    /// Position back in the wire frame (WGS84 degrees)
    pub fn location(&self) -> LonLat {
        self.position.to_lon_lat()
    }
}

/// Entity change broadcast to renderers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityChange {
    pub entity: Entity,
    /// True when the entity was not in the table before this change
    pub created: bool,
}
