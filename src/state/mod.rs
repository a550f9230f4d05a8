// Entity table and reconciliation of decoded frames

mod entity;
mod reconciler;
mod stats;
mod table;

pub use entity::{Entity, EntityChange};
pub use reconciler::{Applied, GeofenceOutcome, Reconciler};
pub use stats::{StatsSnapshot, SyncStats};
pub use table::{EntityTable, EntityTableReader};
