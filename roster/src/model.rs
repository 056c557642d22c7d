//! Alliance records as they are stored by the backend.

/// Implements `Record` for a struct with `id`, `created_at` and `updated_at` fields.
macro_rules! stamped_record {
    ($ty:ty) => {
        impl warroom_core::Record for $ty {
            fn id(&self) -> &warroom_core::RecordId { &self.id }

            fn with_id(self, id: warroom_core::RecordId) -> Self { Self { id, ..self } }

            fn touch(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.created_at.get_or_insert(at);
                self.updated_at = Some(at);
            }
        }
    };
}

mod alliance;
mod battlegroup;
mod champion;
mod member;
mod war;

pub use alliance::{Alliance, InvitationCode};
pub use battlegroup::{Battlegroup, BattlegroupMember};
pub use champion::{Champion, ChampionClass, OwnedChampion, Rank, Rarity};
pub use member::{normalize_username, Member};
pub use war::{AttackAssignment, DefenseNode, PathPosition, War, WarResult};
