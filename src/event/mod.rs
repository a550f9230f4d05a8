use crate::geo::LonLat;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

mod decoder;

pub use decoder::{classify, decode, parse, pretty, DecodeError};

/// Server-assigned feature identifier.
///
/// Feeds send ids as JSON numbers or strings, and the map collection looks
/// them up by their string form. Ids are canonicalized so `1`, `"1"` and
/// `1.0` all name the same feature: anything whose string form is an
/// integer becomes `Number`, everything else stays `Text`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl FeatureId {
    /// Read an identifier from a JSON value (number or string only)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::from_number(n)),
            Value::String(s) => Some(Self::from_text(s)),
            _ => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return FeatureId::Number(i);
        }
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                FeatureId::Number(f as i64)
            }
            _ => FeatureId::Text(n.to_string()),
        }
    }

    fn from_text(s: &str) -> Self {
        match s.parse::<i64>() {
            // "01" or "+1" are distinct keys from 1
            Ok(i) if i.to_string() == s => FeatureId::Number(i),
            _ => FeatureId::Text(s.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        FeatureId::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid feature id: {}", value)))
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(value: i64) -> Self {
        FeatureId::Number(value)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        FeatureId::from_text(value)
    }
}

/// A classified inbound frame
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedMessage {
    Chat(ChatMessage),
    ObjectChange(ObjectChange),
    LayerChange(LayerChange),
}

impl ParsedMessage {
    /// Short kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedMessage::Chat(_) => "chat",
            ParsedMessage::ObjectChange(_) => "objectchange",
            ParsedMessage::LayerChange(_) => "layerchange",
        }
    }
}

/// Chat line posted to a channel
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub user_name: String,
    pub message: String,
}

impl ChatMessage {
    /// Display form: `[user] text`
    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.user_name, self.message)
    }
}

/// Position/attribute update for one moving object
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectChange {
    pub object_id: FeatureId,

    /// Location in the wire frame (WGS84 degrees)
    pub location: LonLat,

    /// Server event time, passed through untouched
    pub timestamp: Option<String>,

    /// Free-form object properties (`props` on the wire)
    pub attributes: Map<String, Value>,

    pub color: Option<String>,

    /// First geofence transition reported with this update; later entries
    /// are never acted on and are not decoded
    pub geofence_event: Option<GeofenceEvent>,

    /// Length of the wire `events` list
    pub event_count: usize,
}

/// Geofence enter/leave notification attached to an object change
#[derive(Clone, Debug, PartialEq)]
pub struct GeofenceEvent {
    pub action: String,
    pub geofence_id: FeatureId,
    pub geofence_label: Option<String>,
}

impl GeofenceEvent {
    pub fn is_entered(&self) -> bool {
        self.action == "entered"
    }
}

/// Invalidation signal for a whole collection
#[derive(Clone, Debug, PartialEq)]
pub struct LayerChange {
    pub layer: String,
}
