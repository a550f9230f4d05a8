use super::{ChatMessage, FeatureId, GeofenceEvent, LayerChange, ObjectChange, ParsedMessage};
use crate::geo::LonLat;
use serde_json::{Map, Value};
use std::fmt;

/// Tag value marking a layer invalidation payload
const LAYER_CHANGE_TAG: &str = "layerchange";

/// Reasons a frame could not be turned into a [`ParsedMessage`]
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Frame text is not valid JSON; carries the frame verbatim
    MalformedPayload { raw: String },
    /// Valid JSON matching none of the known shapes; carries it pretty-printed
    UnknownShape { pretty: String },
}

impl DecodeError {
    /// Text suitable for a status/log display
    pub fn detail(&self) -> &str {
        match self {
            DecodeError::MalformedPayload { raw } => raw,
            DecodeError::UnknownShape { pretty } => pretty,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MalformedPayload { raw } => {
                write!(f, "unable to parse payload as JSON: {}", raw)
            }
            DecodeError::UnknownShape { pretty } => {
                write!(f, "unknown JSON object on channel: {}", pretty)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Parse and classify one text frame.
///
/// Classification is structural and ordered:
/// - chat: `user_name` + `message` (strings or scalars)
/// - object change: `object_id` + `location.{longitude,latitude}`
/// - layer change: `layer` + (`type == "layerchange"` or `change`/`changed == true`)
///
/// Anything else, including an object change whose `ts`, `props` or `color`
/// has the wrong type, is reported as [`DecodeError::UnknownShape`]. The
/// `events` list is lenient: a bad first entry only drops the geofence event.
pub fn decode(raw: &str) -> Result<ParsedMessage, DecodeError> {
    let value = parse(raw)?;
    classify(&value)
}

/// Step one: structured parse of the frame text
pub fn parse(raw: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(raw).map_err(|_| DecodeError::MalformedPayload {
        raw: raw.to_string(),
    })
}

/// Step two: match an already parsed payload against the known shapes
pub fn classify(value: &Value) -> Result<ParsedMessage, DecodeError> {
    match_shape(value).ok_or_else(|| DecodeError::UnknownShape {
        pretty: pretty(value),
    })
}

/// Pretty-print a parsed payload for display
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn match_shape(value: &Value) -> Option<ParsedMessage> {
    let obj = value.as_object()?;

    if let Some(chat) = as_chat(obj) {
        return Some(ParsedMessage::Chat(chat));
    }
    if let Some(change) = as_object_change(obj) {
        return Some(ParsedMessage::ObjectChange(change));
    }
    as_layer_change(obj).map(ParsedMessage::LayerChange)
}

/// Both keys must be present. Numbers and booleans are shown in their JSON
/// spelling; `null`, arrays and objects do not make a chat line.
fn as_chat(obj: &Map<String, Value>) -> Option<ChatMessage> {
    let user_name = chat_text(obj.get("user_name")?)?;
    let message = chat_text(obj.get("message")?)?;
    Some(ChatMessage { user_name, message })
}

fn chat_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_object_change(obj: &Map<String, Value>) -> Option<ObjectChange> {
    let object_id = FeatureId::from_value(obj.get("object_id")?)?;

    let location = obj.get("location")?.as_object()?;
    let longitude = location.get("longitude")?.as_f64()?;
    let latitude = location.get("latitude")?.as_f64()?;

    let timestamp = match obj.get("ts") {
        None | Some(Value::Null) => None,
        Some(Value::String(ts)) => Some(ts.clone()),
        Some(_) => return None,
    };

    let attributes = match obj.get("props") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(props)) => props.clone(),
        Some(_) => return None,
    };

    let color = match obj.get("color") {
        None | Some(Value::Null) => None,
        Some(Value::String(color)) => Some(color.clone()),
        Some(_) => return None,
    };

    // Only the first entry is ever acted on; the rest are not inspected.
    // A malformed event list never costs the position update.
    let (geofence_event, event_count) = match obj.get("events") {
        Some(Value::Array(items)) => (items.first().and_then(as_geofence_event), items.len()),
        _ => (None, 0),
    };

    Some(ObjectChange {
        object_id,
        location: LonLat::new(longitude, latitude),
        timestamp,
        attributes,
        color,
        geofence_event,
        event_count,
    })
}

fn as_geofence_event(value: &Value) -> Option<GeofenceEvent> {
    let obj = value.as_object()?;
    let action = obj.get("action")?.as_str()?;
    let geofence_id = FeatureId::from_value(obj.get("geofence_id")?)?;
    let geofence_label = obj
        .get("geofence_label")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(GeofenceEvent {
        action: action.to_string(),
        geofence_id,
        geofence_label,
    })
}

fn as_layer_change(obj: &Map<String, Value>) -> Option<LayerChange> {
    let layer = obj.get("layer")?.as_str()?;

    let tagged = obj.get("type").and_then(Value::as_str) == Some(LAYER_CHANGE_TAG);
    let marked = ["change", "changed"]
        .iter()
        .any(|key| obj.get(*key) == Some(&Value::Bool(true)));

    if tagged || marked {
        Some(LayerChange {
            layer: layer.to_string(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod classify_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_values_are_unclassified() {
        assert!(match_shape(&json!([1, 2, 3])).is_none());
        assert!(match_shape(&json!("hello")).is_none());
        assert!(match_shape(&json!(42)).is_none());
        assert!(match_shape(&json!(null)).is_none());
    }

    #[test]
    fn test_layer_change_markers() {
        assert!(match_shape(&json!({"layer": "geofences", "type": "layerchange"})).is_some());
        assert!(match_shape(&json!({"layer": "geofences", "change": true})).is_some());
        assert!(match_shape(&json!({"layer": "geofences", "changed": true})).is_some());
        assert!(match_shape(&json!({"layer": "geofences", "change": false})).is_none());
        assert!(match_shape(&json!({"layer": "geofences", "type": "objectchange"})).is_none());
        assert!(match_shape(&json!({"layer": "geofences"})).is_none());
    }

    #[test]
    fn test_geofence_event_requires_action_and_id() {
        assert!(as_geofence_event(&json!({"action": "entered", "geofence_id": 3})).is_some());
        assert!(as_geofence_event(&json!({"action": "entered"})).is_none());
        assert!(as_geofence_event(&json!({"geofence_id": 3})).is_none());
        assert!(as_geofence_event(&json!({"action": 1, "geofence_id": 3})).is_none());
    }

    #[test]
    fn test_geofence_label_is_optional_text() {
        let labelled = json!({"action": "left", "geofence_id": 3, "geofence_label": "Yard"});
        let event = as_geofence_event(&labelled).unwrap();
        assert_eq!(event.geofence_label.as_deref(), Some("Yard"));

        let numbered = json!({"action": "left", "geofence_id": 3, "geofence_label": 7});
        let event = as_geofence_event(&numbered).unwrap();
        assert_eq!(event.geofence_label, None);
    }

    #[test]
    fn test_chat_text_accepts_scalars_only() {
        assert_eq!(chat_text(&json!("hi")).as_deref(), Some("hi"));
        assert_eq!(chat_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(chat_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(chat_text(&json!(null)), None);
        assert_eq!(chat_text(&json!({"a": 1})), None);
    }
}
