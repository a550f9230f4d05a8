use crate::config::GeofenceConfig;
use crate::error::SyncError;
use crate::event::{
    self, ChatMessage, DecodeError, FeatureId, LayerChange, ObjectChange, ParsedMessage,
};
use crate::render::{FeatureLayer, GeofenceHighlight, HighlightAction, StatusDisplay};
use crate::state::entity::EntityChange;
use crate::state::stats::SyncStats;
use crate::state::table::EntityTable;
use tracing::{debug, warn};

/// Result of handling one frame
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    /// Chat line appended to the display
    ChatLine(String),
    /// Entity created or updated
    Entity {
        change: EntityChange,
        geofence: GeofenceOutcome,
    },
    /// Refresh requested for the named collection
    Refreshed(String),
    /// Layer change for a collection this client does not track
    IgnoredLayer(String),
    /// Frame rejected by the decoder; nothing was mutated
    Rejected(DecodeError),
}

/// What happened to the first geofence event of an object change
#[derive(Clone, Debug, PartialEq)]
pub enum GeofenceOutcome {
    NoEvents,
    Highlighted(GeofenceHighlight),
    /// Geofence not loaded locally; ignored
    Unresolved(FeatureId),
}

/// Applies decoded messages to the entity table and drives the collaborators.
///
/// Owns the table exclusively. All work is synchronous: one frame is fully
/// applied before the next is looked at.
pub struct Reconciler<D, L> {
    table: EntityTable,
    display: D,
    layer: L,
    geofence: GeofenceConfig,
    echo_payloads: bool,
    stats: SyncStats,
}

impl<D, L> Reconciler<D, L>
where
    D: StatusDisplay,
    L: FeatureLayer,
{
    pub fn new(geofence: GeofenceConfig, display: D, layer: L) -> Self {
        Self {
            table: EntityTable::new(),
            display,
            layer,
            geofence,
            echo_payloads: false,
            stats: SyncStats::new(),
        }
    }

    /// Echo every parsed payload to the display before applying it
    pub fn with_echo(mut self, echo_payloads: bool) -> Self {
        self.echo_payloads = echo_payloads;
        self
    }

    /// Decode one raw frame and apply it.
    ///
    /// Decode failures go to the display and leave the table untouched.
    pub fn handle_frame(&mut self, raw: &str) -> Applied {
        self.stats.record_frame();

        let decoded = event::parse(raw).and_then(|value| {
            if self.echo_payloads {
                self.display.payload(&event::pretty(&value));
            }
            event::classify(&value)
        });

        match decoded {
            Ok(message) => self.apply(message),
            Err(err) => self.reject(err),
        }
    }

    /// Apply an already classified message
    pub fn apply(&mut self, message: ParsedMessage) -> Applied {
        debug!(kind = message.kind(), "Applying message");
        self.stats.record_applied();

        match message {
            ParsedMessage::Chat(chat) => self.apply_chat(chat),
            ParsedMessage::ObjectChange(change) => self.apply_object_change(change),
            ParsedMessage::LayerChange(layer) => self.apply_layer_change(layer),
        }
    }

    fn apply_chat(&mut self, chat: ChatMessage) -> Applied {
        let line = chat.display_line();
        self.display.chat_line(&line);
        Applied::ChatLine(line)
    }

    fn apply_object_change(&mut self, change: ObjectChange) -> Applied {
        let entity_change = self.table.upsert(&change);
        let geofence = self.apply_geofence_event(&change);
        Applied::Entity {
            change: entity_change,
            geofence,
        }
    }

    /// Only the first event of a message is acted on.
    fn apply_geofence_event(&mut self, change: &ObjectChange) -> GeofenceOutcome {
        if change.event_count > 1 {
            debug!(
                entity_id = %change.object_id,
                skipped = change.event_count - 1,
                "Only the first geofence event is applied"
            );
        }
        let Some(event) = change.geofence_event.as_ref() else {
            if change.event_count > 0 {
                debug!(entity_id = %change.object_id, "Ignoring malformed geofence event");
            }
            return GeofenceOutcome::NoEvents;
        };

        if let Err(err) = self.resolve_geofence(&event.geofence_id) {
            debug!(entity_id = %change.object_id, error = %err, "Ignoring geofence event");
            return GeofenceOutcome::Unresolved(event.geofence_id.clone());
        }

        let highlight = if event.is_entered() {
            GeofenceHighlight {
                geofence_id: event.geofence_id.clone(),
                color: change
                    .color
                    .clone()
                    .unwrap_or_else(|| self.geofence.neutral_color.clone()),
                action: HighlightAction::Entered,
            }
        } else {
            GeofenceHighlight {
                geofence_id: event.geofence_id.clone(),
                color: self.geofence.neutral_color.clone(),
                action: HighlightAction::Reset,
            }
        };

        self.layer.highlight(&highlight);
        GeofenceOutcome::Highlighted(highlight)
    }

    fn resolve_geofence(&self, id: &FeatureId) -> Result<(), SyncError> {
        if self.layer.contains_geofence(id) {
            Ok(())
        } else {
            Err(SyncError::UnresolvedReference(id.clone()))
        }
    }

    fn apply_layer_change(&mut self, change: LayerChange) -> Applied {
        if change.layer == self.geofence.layer {
            debug!(layer = %change.layer, "Refreshing collection");
            self.layer.refresh();
            Applied::Refreshed(change.layer)
        } else {
            debug!(layer = %change.layer, "Ignoring change for untracked layer");
            Applied::IgnoredLayer(change.layer)
        }
    }

    fn reject(&mut self, err: DecodeError) -> Applied {
        match &err {
            DecodeError::MalformedPayload { .. } => self.stats.record_malformed(),
            DecodeError::UnknownShape { .. } => self.stats.record_unknown(),
        }
        warn!(error = %SyncError::from(err.clone()), "Frame rejected");
        self.display.decode_error(&err);
        Applied::Rejected(err)
    }

    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }
}
