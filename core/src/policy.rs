use thiserror::Error;
use tracing::debug;

use crate::{context::Context, id::RecordId};

/// Tables a screen can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Members,
    Champions,
    Battlegroups,
    Wars,
    DefenseNodes,
    AttackAssignments,
    Alliances,
    InvitationCodes,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Resource::Members => "members",
            Resource::Champions => "champions",
            Resource::Battlegroups => "battlegroups",
            Resource::Wars => "wars",
            Resource::DefenseNodes => "defense nodes",
            Resource::AttackAssignments => "attack assignments",
            Resource::Alliances => "alliances",
            Resource::InvitationCodes => "invitation codes",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("Access denied by policy: {0}")]
    ByPolicy(&'static str),
    #[error("Access denied: {resource} owned by {owner} requires an officer")]
    NotOwner { resource: Resource, owner: RecordId },
    #[error("Access denied: {0} requires an officer")]
    OfficerOnly(Resource),
    #[error("Access denied: not a member of an alliance")]
    NoAlliance,
}

/// Decides whether a context may write.
///
/// `owner` is the user a record belongs to, when that matters (a member's own champions,
/// their own defender slot). `None` means an alliance-wide record.
pub trait PolicyAgent: Send + Sync + 'static {
    fn check_write(&self, ctx: &Context, resource: Resource, owner: Option<&RecordId>) -> Result<(), AccessDenied>;

    /// Changing someone's role. By default officers only, and never their own.
    fn check_role_change(&self, ctx: &Context, target: &RecordId) -> Result<(), AccessDenied> {
        if !ctx.is_officer() {
            return Err(AccessDenied::OfficerOnly(Resource::Members));
        }
        if ctx.is_user(target) {
            return Err(AccessDenied::ByPolicy("cannot change your own role"));
        }
        Ok(())
    }

    /// Founding a new alliance. By default only users not already in one.
    fn check_found_alliance(&self, ctx: &Context) -> Result<(), AccessDenied> {
        if ctx.alliance_id.is_some() {
            return Err(AccessDenied::ByPolicy("already in an alliance"));
        }
        Ok(())
    }
}

/// Officers write anything in their alliance; members only what they own.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {}

impl RolePolicy {
    pub fn new() -> Self { Self {} }
}

impl PolicyAgent for RolePolicy {
    fn check_write(&self, ctx: &Context, resource: Resource, owner: Option<&RecordId>) -> Result<(), AccessDenied> {
        if ctx.alliance_id.is_none() {
            return Err(AccessDenied::NoAlliance);
        }
        if ctx.is_officer() {
            return Ok(());
        }
        let result = match (resource, owner) {
            (Resource::Members | Resource::Champions | Resource::DefenseNodes, Some(owner)) if ctx.is_user(owner) => Ok(()),
            (_, Some(owner)) => Err(AccessDenied::NotOwner { resource, owner: owner.clone() }),
            (_, None) => Err(AccessDenied::OfficerOnly(resource)),
        };
        if let Err(denied) = &result {
            debug!(user = %ctx.user_id, %resource, %denied, "write denied");
        }
        result
    }
}

/// Allows every write. For tests and single-user tools.
#[derive(Debug, Clone, Default)]
pub struct PermissiveAgent {}

impl PermissiveAgent {
    pub fn new() -> Self { Self {} }
}

impl PolicyAgent for PermissiveAgent {
    fn check_write(&self, _ctx: &Context, _resource: Resource, _owner: Option<&RecordId>) -> Result<(), AccessDenied> { Ok(()) }
    fn check_role_change(&self, _ctx: &Context, _target: &RecordId) -> Result<(), AccessDenied> { Ok(()) }
    fn check_found_alliance(&self, _ctx: &Context) -> Result<(), AccessDenied> { Ok(()) }
}
