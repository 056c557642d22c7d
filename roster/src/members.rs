use std::sync::Arc;

use tracing::debug;
use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Role, Scope};

use crate::{
    error::RosterError,
    model::{normalize_username, Member},
    screen::{List, Policy},
};

/// The alliance member list.
pub struct MemberRoster {
    members: List<Member>,
    policy: Policy,
}

impl MemberRoster {
    pub fn new(gateway: Arc<dyn Gateway<Member>>, policy: Policy, config: EngineConfig) -> Self {
        Self { members: List::new("members", gateway, config), policy }
    }

    pub fn list(&self) -> &List<Member> { &self.members }

    pub fn members(&self) -> Vec<Member> { self.members.snapshot() }

    pub fn officers(&self) -> Vec<Member> { self.members.snapshot().into_iter().filter(|m| m.role.is_officer()).collect() }

    pub async fn load(&self, ctx: &Context) -> Result<usize, RosterError> {
        let alliance = ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        self.members.load(&Scope::all().eq("alliance_id", alliance).order("username")).await
    }

    pub fn add_member(&self, ctx: &Context, username: &str, role: Role) -> Result<Dispatched<Member>, RosterError> {
        self.policy.check_write(ctx, Resource::Members, None)?;
        let alliance = ctx.alliance_id.clone().ok_or(AccessDenied::NoAlliance)?;
        let username = self.available_username(username, None)?;

        let draft = Member::new(self.members.engine().provisional_id(), username, role).in_alliance(alliance);
        debug!(user = %ctx.user_id, username = %draft.username, "adding member");
        Ok(self.members.create(draft))
    }

    /// Put the caller's existing profile on this alliance's roster with the role `ctx` carries.
    /// Used right after founding, when the founder's context already names the new alliance.
    pub fn enlist(&self, ctx: &Context, profile: Member) -> Result<Dispatched<Member>, RosterError> {
        if !ctx.is_user(&profile.id) {
            return Err(AccessDenied::ByPolicy("only your own profile can be enlisted").into());
        }
        self.policy.check_write(ctx, Resource::Members, Some(&profile.id))?;
        let alliance = ctx.alliance_id.clone().ok_or(AccessDenied::NoAlliance)?;
        if self.members.get(&profile.id).is_some() {
            return Err(RosterError::invalid("member", format!("{} is already on the roster", profile.id)));
        }
        let username = self.available_username(&profile.username, Some(&profile.id))?;

        debug!(user = %ctx.user_id, alliance = %alliance, role = %ctx.role, "enlisting");
        Ok(self.members.adopt(Member { username, role: ctx.role, alliance_id: Some(alliance), ..profile }))
    }

    pub fn remove_member(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<Member>, RosterError> {
        self.policy.check_write(ctx, Resource::Members, None)?;
        self.members.require("member", id)?;
        if ctx.is_user(id) {
            return Err(AccessDenied::ByPolicy("cannot remove yourself").into());
        }
        Ok(self.members.delete(id))
    }

    pub fn set_role(&self, ctx: &Context, id: &RecordId, role: Role) -> Result<Dispatched<Member>, RosterError> {
        self.policy.check_role_change(ctx, id)?;
        self.members.require("member", id)?;
        Ok(self.members.save(id, |m| Member { role, ..m.clone() }))
    }

    /// Members may rename themselves; officers may rename anyone.
    pub fn rename(&self, ctx: &Context, id: &RecordId, username: &str) -> Result<Dispatched<Member>, RosterError> {
        self.policy.check_write(ctx, Resource::Members, Some(id))?;
        self.members.require("member", id)?;
        let username = self.available_username(username, Some(id))?;
        Ok(self.members.save(id, |m| Member { username, ..m.clone() }))
    }

    fn available_username(&self, raw: &str, except: Option<&RecordId>) -> Result<String, RosterError> {
        let username = normalize_username(raw);
        if username.is_empty() {
            return Err(RosterError::invalid("username", "must not be empty"));
        }
        let taken = self.members.snapshot().iter().any(|m| m.username == username && Some(&m.id) != except);
        if taken {
            return Err(RosterError::invalid("username", format!("{username} is already taken")));
        }
        Ok(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warroom_core::{MemoryGateway, RolePolicy, Settlement};

    fn officer() -> Context { Context::new("u1", Role::Officer).in_alliance("a1") }

    fn roster(gateway: Arc<MemoryGateway<Member>>) -> MemberRoster { MemberRoster::new(gateway, Arc::new(RolePolicy::new()), EngineConfig::default()) }

    fn seeded() -> Arc<MemoryGateway<Member>> {
        Arc::new(MemoryGateway::new("profiles").with_unique("username").with_rows([
            Member::new("u1".into(), "boss", Role::Officer).in_alliance("a1".into()),
            Member::new("u2".into(), "bob", Role::Member).in_alliance("a1".into()),
            Member::new("u9".into(), "stranger", Role::Member).in_alliance("a2".into()),
        ]))
    }

    #[tokio::test]
    async fn test_load_scopes_to_alliance() {
        let roster = roster(seeded());
        assert_eq!(roster.load(&officer()).await.unwrap(), 2);
        assert_eq!(roster.members().iter().map(|m| m.username.as_str()).collect::<Vec<_>>(), ["bob", "boss"]);

        let homeless = Context::new("u3", Role::Member);
        assert_eq!(roster.load(&homeless).await, Err(RosterError::AccessDenied(AccessDenied::NoAlliance)));
    }

    #[tokio::test]
    async fn test_add_member_normalizes_and_reconciles() {
        let gateway = seeded();
        let roster = roster(gateway.clone());
        roster.load(&officer()).await.unwrap();

        let dispatched = roster.add_member(&officer(), "  Iron Man ", Role::Member).unwrap();
        let provisional = dispatched.snapshot().last().unwrap().clone();
        assert_eq!(provisional.username, "iron_man");
        assert!(provisional.id.is_provisional());

        let Settlement::Reconciled(Some(confirmed)) = dispatched.settled().await else { panic!("insert did not reconcile") };
        assert!(!confirmed.id.is_provisional());
        assert!(confirmed.created_at.is_some());
        assert_eq!(roster.members().last(), Some(&confirmed));
        assert_eq!(gateway.rows().len(), 4);
    }

    #[tokio::test]
    async fn test_add_member_validation() {
        let roster = roster(seeded());
        roster.load(&officer()).await.unwrap();

        assert!(matches!(roster.add_member(&officer(), "   ", Role::Member), Err(RosterError::Validation { field: "username", .. })));
        assert!(matches!(roster.add_member(&officer(), "BOB", Role::Member), Err(RosterError::Validation { .. })));

        let member = Context::new("u2", Role::Member).in_alliance("a1");
        assert!(matches!(roster.add_member(&member, "newbie", Role::Member), Err(RosterError::AccessDenied(_))));
        assert_eq!(roster.members().len(), 2);
    }

    #[tokio::test]
    async fn test_role_changes() {
        let roster = roster(seeded());
        roster.load(&officer()).await.unwrap();

        assert!(roster.set_role(&officer(), &"u1".into(), Role::Leader).is_err());
        let bob = Context::new("u2", Role::Member).in_alliance("a1");
        assert!(roster.set_role(&bob, &"u1".into(), Role::Member).is_err());

        let dispatched = roster.set_role(&officer(), &"u2".into(), Role::Officer).unwrap();
        assert!(dispatched.settled().await.is_success());
        assert_eq!(roster.officers().len(), 2);
    }

    #[tokio::test]
    async fn test_enlist_own_profile() {
        let gateway = seeded();
        let roster = roster(gateway.clone());
        roster.load(&officer()).await.unwrap();
        let stranger = Member::new("u9".into(), "stranger", Role::Member).in_alliance("a2".into());

        assert!(matches!(roster.enlist(&officer(), stranger.clone()), Err(RosterError::AccessDenied(_))));
        let boss = roster.members().into_iter().find(|m| m.id == "u1").unwrap();
        assert!(matches!(roster.enlist(&officer(), boss), Err(RosterError::Validation { field: "member", .. })));

        let ctx = Context::new("u9", Role::Officer).in_alliance("a1");
        let dispatched = roster.enlist(&ctx, stranger).unwrap();
        assert!(dispatched.snapshot().iter().any(|m| m.id == "u9"));
        assert!(dispatched.settled().await.is_success());

        let stored = gateway.rows().into_iter().find(|m| m.id == "u9").unwrap();
        assert_eq!((stored.alliance_id, stored.role), (Some("a1".into()), Role::Officer));
        assert_eq!(roster.officers().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_own_profile_only() {
        let roster = roster(seeded());
        roster.load(&officer()).await.unwrap();
        let bob = Context::new("u2", Role::Member).in_alliance("a1");

        assert!(roster.rename(&bob, &"u1".into(), "usurper").is_err());
        let dispatched = roster.rename(&bob, &"u2".into(), "Bob Two").unwrap();
        assert_eq!(dispatched.settled().await.record().map(|m| m.username.as_str()), Some("bob_two"));
        assert!(matches!(roster.remove_member(&officer(), &"u1".into()), Err(RosterError::AccessDenied(_))));
        assert!(matches!(roster.remove_member(&officer(), &"zz".into()), Err(RosterError::UnknownRecord { .. })));
    }
}
