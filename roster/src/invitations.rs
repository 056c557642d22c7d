use std::sync::Arc;

use rand::Rng;
use tracing::debug;
use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Scope};

use crate::{
    error::RosterError,
    model::InvitationCode,
    screen::{List, Policy},
};

pub const CODE_LENGTH: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A random code of [`CODE_LENGTH`] uppercase letters and digits.
pub fn generate_code() -> String { generate_code_with(&mut rand::thread_rng()) }

pub fn generate_code_with(rng: &mut impl Rng) -> String {
    (0..CODE_LENGTH).map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char).collect()
}

/// Sign-up codes an alliance's officers hand out. Officers only, reading included.
pub struct InvitationCodes {
    codes: List<InvitationCode>,
    policy: Policy,
}

impl InvitationCodes {
    pub fn new(gateway: Arc<dyn Gateway<InvitationCode>>, policy: Policy, config: EngineConfig) -> Self {
        Self { codes: List::new("invitation_codes", gateway, config), policy }
    }

    pub fn list(&self) -> &List<InvitationCode> { &self.codes }

    /// Newest first.
    pub fn codes(&self) -> Vec<InvitationCode> { self.codes.snapshot() }

    pub fn available(&self) -> Vec<InvitationCode> { self.codes.snapshot().into_iter().filter(InvitationCode::is_available).collect() }

    pub async fn load(&self, ctx: &Context) -> Result<usize, RosterError> {
        self.policy.check_write(ctx, Resource::InvitationCodes, None)?;
        let alliance = ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        self.codes.load(&Scope::all().eq("alliance_id", alliance).order_desc("created_at")).await
    }

    /// A generated code not already on the list.
    pub fn suggest_code(&self) -> String {
        let codes = self.codes.snapshot();
        loop {
            let code = generate_code();
            if !codes.iter().any(|c| c.code == code) {
                return code;
            }
        }
    }

    /// Codes are trimmed and uppercased; a blank description is dropped.
    pub fn create_code(&self, ctx: &Context, code: &str, description: &str) -> Result<Dispatched<InvitationCode>, RosterError> {
        self.policy.check_write(ctx, Resource::InvitationCodes, None)?;
        let alliance = ctx.alliance_id.clone().ok_or(AccessDenied::NoAlliance)?;
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(RosterError::invalid("code", "must not be empty"));
        }
        if self.codes.snapshot().iter().any(|c| c.code == code) {
            return Err(RosterError::invalid("code", format!("{code} already exists")));
        }
        let description = Some(description.trim()).filter(|d| !d.is_empty()).map(str::to_string);

        let draft = InvitationCode {
            id: self.codes.engine().provisional_id(),
            alliance_id: alliance,
            code,
            description,
            created_by: Some(ctx.user_id.clone()),
            used_at: None,
            used_by: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        debug!(user = %ctx.user_id, code = %draft.code, "creating invitation code");
        Ok(self.codes.create(draft))
    }

    pub fn set_active(&self, ctx: &Context, id: &RecordId, is_active: bool) -> Result<Dispatched<InvitationCode>, RosterError> {
        self.policy.check_write(ctx, Resource::InvitationCodes, None)?;
        self.codes.require("invitation code", id)?;
        Ok(self.codes.save(id, |c| InvitationCode { is_active, ..c.clone() }))
    }

    pub fn delete_code(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<InvitationCode>, RosterError> {
        self.policy.check_write(ctx, Resource::InvitationCodes, None)?;
        self.codes.require("invitation code", id)?;
        Ok(self.codes.delete(id))
    }
}
