/*!
Alliance war room screens.

Each screen owns one or more optimistic lists backed by a [`Gateway`](warroom_core::Gateway),
checks the caller's [`Context`](warroom_core::Context) against a
[`PolicyAgent`](warroom_core::PolicyAgent) and the alliance rules, and only then dispatches.
A rule violation is returned synchronously as a [`RosterError`]; everything after the
dispatch is reported through the list's settlement handle and failure channel.
*/

pub mod alliances;
pub mod battlegroups;
pub mod champions;
pub mod error;
pub mod invitations;
pub mod members;
pub mod model;
pub mod screen;
pub mod war_log;
pub mod war_planner;

pub use alliances::{AllianceDesk, AllianceDraft, Founded};
pub use battlegroups::{BattlegroupBoard, BattlegroupSummary};
pub use champions::ChampionRoster;
pub use error::RosterError;
pub use invitations::InvitationCodes;
pub use members::MemberRoster;
pub use screen::List;
pub use war_log::{SeasonStats, WarDraft, WarLog};
pub use war_planner::{AttackPlan, Coverage, WarPlanner};
