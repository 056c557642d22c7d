use std::sync::Arc;

use tracing::info;
use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Role, Scope};

use crate::{
    battlegroups::BattlegroupBoard,
    error::RosterError,
    members::MemberRoster,
    model::{Alliance, Battlegroup, Member},
    screen::{settle_all, List, Policy},
};

pub const MAX_TAG_LENGTH: usize = 5;

/// What a user fills in to found an alliance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllianceDraft {
    pub name: String,
    pub tag: String,
    pub description: Option<String>,
}

impl AllianceDraft {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self { Self { name: name.into(), tag: tag.into(), description: None } }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trimmed name, uppercased tag of at most [`MAX_TAG_LENGTH`] characters, blank description dropped.
    fn into_record(self, id: RecordId) -> Result<Alliance, RosterError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(RosterError::invalid("name", "must not be empty"));
        }
        let tag = self.tag.trim().to_uppercase();
        if tag.is_empty() {
            return Err(RosterError::invalid("tag", "must not be empty"));
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(RosterError::invalid("tag", format!("must be at most {MAX_TAG_LENGTH} characters")));
        }
        let description = self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(str::to_string);
        Ok(Alliance { id, name, tag, description, logo_url: None, created_at: None, updated_at: None })
    }
}

/// Result of founding an alliance.
#[derive(Debug, Clone, PartialEq)]
pub struct Founded {
    pub alliance: Alliance,
    /// the founder's context from now on: officer of the new alliance
    pub context: Context,
    pub battlegroups: Vec<Battlegroup>,
}

/// The caller's alliance, and founding a new one.
pub struct AllianceDesk {
    alliances: List<Alliance>,
    policy: Policy,
}

impl AllianceDesk {
    pub fn new(gateway: Arc<dyn Gateway<Alliance>>, policy: Policy, config: EngineConfig) -> Self {
        Self { alliances: List::new("alliances", gateway, config), policy }
    }

    pub fn list(&self) -> &List<Alliance> { &self.alliances }

    pub fn alliance(&self) -> Option<Alliance> { self.alliances.snapshot().into_iter().next() }

    pub async fn load(&self, ctx: &Context) -> Result<Option<Alliance>, RosterError> {
        let alliance = ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        self.alliances.load(&Scope::all().eq("id", alliance)).await?;
        Ok(self.alliance())
    }

    /// Officers edit the description and logo; name and tag are fixed at founding.
    pub fn update_details(&self, ctx: &Context, description: Option<&str>, logo_url: Option<&str>) -> Result<Dispatched<Alliance>, RosterError> {
        self.policy.check_write(ctx, Resource::Alliances, None)?;
        let id = ctx.alliance_id.clone().ok_or(AccessDenied::NoAlliance)?;
        self.alliances.require("alliance", &id)?;
        let text = |value: Option<&str>| value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        let (description, logo_url) = (text(description), text(logo_url));
        Ok(self.alliances.save(&id, |a| Alliance { description, logo_url, ..a.clone() }))
    }

    /// Found an alliance: create it, enlist `profile` (the caller's own) as its officer, and
    /// seed the default battlegroups. Each step waits for the previous one to be confirmed;
    /// a failed step stops the flow and names itself in [`RosterError::StepFailed`].
    pub async fn create_alliance(
        &self,
        ctx: &Context,
        draft: AllianceDraft,
        profile: Member,
        members: &MemberRoster,
        board: &BattlegroupBoard,
    ) -> Result<Founded, RosterError> {
        self.policy.check_found_alliance(ctx)?;
        if !ctx.is_user(&profile.id) {
            return Err(AccessDenied::ByPolicy("only your own profile can found an alliance").into());
        }
        let provisional = self.alliances.engine().provisional_id();
        let record = draft.into_record(provisional.clone())?;

        let alliance = settle_all("creating alliance", vec![self.alliances.create(record)])
            .await?
            .pop()
            .ok_or_else(|| RosterError::unknown("alliance", &provisional))?;
        info!(alliance = %alliance.id, tag = %alliance.tag, founder = %ctx.user_id, "alliance created");

        let founder = Context::new(ctx.user_id.clone(), Role::Officer).in_alliance(alliance.id.clone());
        members.load(&founder).await?;
        settle_all("enlisting founder", vec![members.enlist(&founder, profile)?]).await?;
        let battlegroups = board.seed_defaults(&founder).await?;

        Ok(Founded { alliance, context: founder, battlegroups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warroom_core::{MemoryGateway, RemoteError, RolePolicy};

    use crate::model::BattlegroupMember;

    struct World {
        desk: AllianceDesk,
        members: MemberRoster,
        board: BattlegroupBoard,
        alliances: Arc<MemoryGateway<Alliance>>,
        profiles: Arc<MemoryGateway<Member>>,
        groups: Arc<MemoryGateway<Battlegroup>>,
    }

    fn world() -> World {
        let policy: Policy = Arc::new(RolePolicy::new());
        let alliances = Arc::new(MemoryGateway::new("alliances").with_unique("tag"));
        let profiles = Arc::new(MemoryGateway::new("profiles").with_unique("username").with_rows([Member::new("u7".into(), "newbie", Role::Member)]));
        let groups = Arc::new(MemoryGateway::new("battlegroups"));
        let placements: Arc<MemoryGateway<BattlegroupMember>> = Arc::new(MemoryGateway::new("battlegroup_members"));
        World {
            desk: AllianceDesk::new(alliances.clone(), policy.clone(), EngineConfig::default()),
            members: MemberRoster::new(profiles.clone(), policy.clone(), EngineConfig::default()),
            board: BattlegroupBoard::new(groups.clone(), placements, policy, EngineConfig::default()),
            alliances,
            profiles,
            groups,
        }
    }

    fn newbie() -> Context { Context::new("u7", Role::Member) }

    fn profile() -> Member { Member::new("u7".into(), "newbie", Role::Member) }

    #[tokio::test]
    async fn test_founding_promotes_creator_and_seeds_battlegroups() {
        let w = world();
        let draft = AllianceDraft::new("  Iron Legion ", "irl").with_description("   ");
        let founded = found(&w, &newbie(), draft, profile()).await.unwrap();

        assert_eq!((founded.alliance.name.as_str(), founded.alliance.tag.as_str()), ("Iron Legion", "IRL"));
        assert_eq!(founded.alliance.description, None);
        assert!(!founded.alliance.id.is_provisional());
        assert_eq!(founded.context, Context::new("u7", Role::Officer).in_alliance(founded.alliance.id.clone()));

        let stored = w.profiles.rows().pop().unwrap();
        assert_eq!((stored.role, stored.alliance_id), (Role::Officer, Some(founded.alliance.id.clone())));
        assert_eq!(w.members.officers().len(), 1);

        let names: Vec<_> = founded.battlegroups.iter().map(|g| g.name.clone()).collect();
        assert_eq!(names, ["Battlegroup 1", "Battlegroup 2", "Battlegroup 3"]);
        assert_eq!(w.groups.rows().len(), 3);
        assert!(w.groups.rows().iter().all(|g| g.alliance_id == founded.alliance.id));

        assert_eq!(w.desk.load(&founded.context).await.unwrap(), Some(founded.alliance));
    }

    async fn found(w: &World, ctx: &Context, draft: AllianceDraft, profile: Member) -> Result<Founded, RosterError> {
        w.desk.create_alliance(ctx, draft, profile, &w.members, &w.board).await
    }

    #[tokio::test]
    async fn test_founding_validation() {
        let w = world();
        let ctx = newbie();
        assert!(matches!(found(&w, &ctx, AllianceDraft::new(" ", "IRL"), profile()).await, Err(RosterError::Validation { field: "name", .. })));
        assert!(matches!(found(&w, &ctx, AllianceDraft::new("Iron", ""), profile()).await, Err(RosterError::Validation { field: "tag", .. })));
        assert!(matches!(found(&w, &ctx, AllianceDraft::new("Iron", "TOOLONG"), profile()).await, Err(RosterError::Validation { field: "tag", .. })));

        let settled = Context::new("u7", Role::Member).in_alliance("a1");
        assert_eq!(
            found(&w, &settled, AllianceDraft::new("Iron", "IRL"), profile()).await.err(),
            Some(RosterError::AccessDenied(AccessDenied::ByPolicy("already in an alliance")))
        );

        let other = Member::new("u8".into(), "other", Role::Member);
        assert!(matches!(found(&w, &ctx, AllianceDraft::new("Iron", "IRL"), other).await, Err(RosterError::AccessDenied(_))));
        assert_eq!(w.alliances.calls().create, 0);
    }

    #[tokio::test]
    async fn test_failed_creation_stops_the_flow() {
        let w = world();
        w.alliances.fail_next(RemoteError::transport("offline"));
        let err = found(&w, &newbie(), AllianceDraft::new("Iron", "IRL"), profile()).await.err();

        assert!(matches!(err, Some(RosterError::StepFailed { step: "creating alliance", .. })));
        assert!(w.desk.alliance().is_none());
        assert_eq!(w.profiles.rows(), vec![profile()]);
        assert_eq!(w.groups.calls().create, 0);
    }

    #[tokio::test]
    async fn test_officers_update_details() {
        let w = world();
        let founded = found(&w, &newbie(), AllianceDraft::new("Iron", "IRL"), profile()).await.unwrap();

        let member = Context::new("u2", Role::Member).in_alliance(founded.alliance.id.clone());
        assert!(matches!(w.desk.update_details(&member, Some("x"), None), Err(RosterError::AccessDenied(_))));

        let dispatched = w.desk.update_details(&founded.context, Some(" We fight on Sundays "), Some("")).unwrap();
        let record = dispatched.settled().await.record().cloned().unwrap();
        assert_eq!(record.description.as_deref(), Some("We fight on Sundays"));
        assert_eq!(record.logo_url, None);
    }
}
