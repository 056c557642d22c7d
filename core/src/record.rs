use chrono::{DateTime, Utc};

use crate::id::RecordId;

/// A domain record that can live in an [`crate::collection::Collection`].
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &RecordId;

    /// The same record under a different id. Gateways use this to issue server ids.
    fn with_id(self, id: RecordId) -> Self;

    /// Stamp server-side bookkeeping such as `updated_at`. Default does nothing.
    fn touch(&mut self, _at: DateTime<Utc>) {}
}
