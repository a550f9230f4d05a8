// Collaborator boundary between the reconciliation core and whatever draws the map

mod geofence;
mod log;
mod style;

pub use geofence::GeofenceSet;
pub use log::LogDisplay;
pub use style::{MarkerStyle, StyleCache};

use crate::channel::SessionStatus;
use crate::event::{DecodeError, FeatureId};
use serde::Serialize;

/// Status/log surface for connection state, chat lines and bad frames
pub trait StatusDisplay {
    /// Connection status changed for `channel`
    fn status(&mut self, channel: &str, status: &SessionStatus);

    /// Append a formatted chat line (`[user] text`)
    fn chat_line(&mut self, line: &str);

    /// A frame could not be decoded
    fn decode_error(&mut self, error: &DecodeError);

    /// Echo of a parsed payload, pretty-printed
    fn payload(&mut self, _pretty: &str) {}
}

/// Externally owned feature collection holding the geofences.
///
/// The renderer loads and owns the collection; the core only asks whether an
/// id is present, hands over highlight changes and requests full refreshes.
pub trait FeatureLayer {
    fn contains_geofence(&self, id: &FeatureId) -> bool;

    fn highlight(&mut self, highlight: &GeofenceHighlight);

    /// Re-fetch the whole collection from its source
    fn refresh(&mut self);
}

/// What to do with a geofence's boundary style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightAction {
    /// An object entered: paint the boundary in the object's color
    Entered,
    /// Anything else: back to the neutral boundary color
    Reset,
}

/// Desired boundary color for one geofence
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeofenceHighlight {
    pub geofence_id: FeatureId,
    pub color: String,
    pub action: HighlightAction,
}
