//! In-memory [`Gateway`] for reconciliation tests
//!
//! [`MemoryGateway`] keeps a catalog tree in memory, computes `version`
//! fingerprints the way the catalog does, records every call and can be told
//! to fail specific calls.

use std::cell::RefCell;

use chrono::{Duration, Utc};
use scribe_core::{
    Gateway, GatewayError, GatewayResult, PROVIDER_SCHEMA, ProviderFields, ProviderKeys,
    ProviderPatch, ProviderSnapshot, SCRIPT_GROUP_SCHEMA, SCRIPT_SCHEMA, ScriptFields,
    ScriptGroupFields, ScriptGroupPatch, ScriptGroupSnapshot, ScriptGroupSummary, ScriptPatch,
    ScriptSnapshot,
};
use scribe_token::ScriptClaim;
use scribe_types::Identity;
use uuid::Uuid;

use crate::keys::{RSA_PUBLIC_PEM, TokenPayload};

/// Kind of gateway call, used to count calls and inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ReadProvider,
    CreateProvider,
    UpdateProvider,
    ReadScriptGroup,
    CreateScriptGroup,
    UpdateScriptGroup,
    ReadScript,
    CreateScript,
    UpdateScript,
    IssueToken,
    FetchSigningKey,
    ResetKeys,
}

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ReadProvider { alt_id: String },
    CreateProvider { alt_id: String },
    UpdateProvider { id: Uuid, patch: ProviderPatch },
    ReadScriptGroup { alt_id: String },
    CreateScriptGroup { alt_id: String },
    UpdateScriptGroup { id: Uuid, patch: ScriptGroupPatch },
    ReadScript { alt_id: String },
    CreateScript { alt_id: String },
    UpdateScript { id: Uuid, patch: ScriptPatch },
    IssueToken { subscriber_id: String },
    FetchSigningKey,
    ResetKeys { provider: Uuid },
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::ReadProvider { .. } => CallKind::ReadProvider,
            Call::CreateProvider { .. } => CallKind::CreateProvider,
            Call::UpdateProvider { .. } => CallKind::UpdateProvider,
            Call::ReadScriptGroup { .. } => CallKind::ReadScriptGroup,
            Call::CreateScriptGroup { .. } => CallKind::CreateScriptGroup,
            Call::UpdateScriptGroup { .. } => CallKind::UpdateScriptGroup,
            Call::ReadScript { .. } => CallKind::ReadScript,
            Call::CreateScript { .. } => CallKind::CreateScript,
            Call::UpdateScript { .. } => CallKind::UpdateScript,
            Call::IssueToken { .. } => CallKind::IssueToken,
            Call::FetchSigningKey => CallKind::FetchSigningKey,
            Call::ResetKeys { .. } => CallKind::ResetKeys,
        }
    }

    /// Whether the call changes the catalog tree
    pub fn is_write(&self) -> bool {
        matches!(
            self.kind(),
            CallKind::CreateProvider
                | CallKind::UpdateProvider
                | CallKind::CreateScriptGroup
                | CallKind::UpdateScriptGroup
                | CallKind::CreateScript
                | CallKind::UpdateScript
        )
    }

    /// Whether this is an update that only turns visibility off
    pub fn is_retire(&self) -> bool {
        match self {
            Call::UpdateScriptGroup { patch, .. } => *patch == ScriptGroupPatch::visibility(false),
            Call::UpdateScript { patch, .. } => *patch == ScriptPatch::visibility(false),
            Call::UpdateProvider { patch, .. } => *patch == ProviderPatch::visibility(false),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptRecord {
    id: Uuid,
    fields: ScriptFields,
}

#[derive(Debug, Clone)]
struct GroupRecord {
    id: Uuid,
    fields: ScriptGroupFields,
    scripts: Vec<ScriptRecord>,
}

#[derive(Debug, Clone)]
struct ProviderRecord {
    id: Uuid,
    fields: ProviderFields,
    groups: Vec<GroupRecord>,
}

#[derive(Debug, Default)]
struct State {
    providers: Vec<ProviderRecord>,
    calls: Vec<Call>,
    failures: Vec<(CallKind, String)>,
    grants: Vec<(String, ScriptClaim)>,
}

impl State {
    fn provider_mut(&mut self, id: Uuid) -> GatewayResult<&mut ProviderRecord> {
        self.providers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| rejected(format!("unknown provider {id}")))
    }

    fn group_mut(&mut self, provider: Uuid, group: Uuid) -> GatewayResult<&mut GroupRecord> {
        self.provider_mut(provider)?
            .groups
            .iter_mut()
            .find(|g| g.id == group)
            .ok_or_else(|| rejected(format!("unknown script group {group}")))
    }

    fn script_mut(
        &mut self,
        provider: Uuid,
        group: Uuid,
        script: Uuid,
    ) -> GatewayResult<&mut ScriptRecord> {
        self.group_mut(provider, group)?
            .scripts
            .iter_mut()
            .find(|s| s.id == script)
            .ok_or_else(|| rejected(format!("unknown script {script}")))
    }

    fn check_failure(&self, kind: CallKind, target: &str) -> GatewayResult<()> {
        if self.failures.iter().any(|(k, t)| *k == kind && t == target) {
            return Err(rejected(format!("injected failure for {kind:?} on {target}")));
        }
        Ok(())
    }
}

fn rejected(message: String) -> GatewayError {
    GatewayError::Rejected(message)
}

/// In-memory catalog that records every call
///
/// ```rust,no_run
/// use scribe_core::Reconciler;
/// use scribe_test_utils::{CallKind, MemoryGateway};
/// # let manifest: scribe_meta::Manifest = todo!();
///
/// let gateway = MemoryGateway::new();
/// gateway.fail_on(CallKind::CreateScript, "daily_digest");
/// let report = Reconciler::new(&gateway).reconcile(&manifest.provider).unwrap();
/// assert_eq!(report.failures.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RefCell<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call of `kind` whose target has identity `target`
    pub fn fail_on(&self, kind: CallKind, target: &str) {
        self.state
            .borrow_mut()
            .failures
            .push((kind, target.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    /// Entitle `subscriber_id` to a script; issued tokens carry the claim
    pub fn grant(&self, subscriber_id: &str, claim: ScriptClaim) {
        self.state
            .borrow_mut()
            .grants
            .push((subscriber_id.to_string(), claim));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    /// Recorded calls that changed the catalog tree
    pub fn writes(&self) -> Vec<Call> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    /// Store a provider directly, without recording a call
    pub fn seed_provider(&self, fields: ProviderFields) -> Uuid {
        let id = Uuid::new_v4();
        self.state.borrow_mut().providers.push(ProviderRecord {
            id,
            fields,
            groups: Vec::new(),
        });
        id
    }

    /// Store a script group directly, without recording a call
    pub fn seed_script_group(&self, provider: Uuid, fields: ScriptGroupFields) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.borrow_mut();
        let record = state.provider_mut(provider).expect("seeded provider");
        record.groups.push(GroupRecord {
            id,
            fields,
            scripts: Vec::new(),
        });
        id
    }

    /// Store a script directly, without recording a call
    pub fn seed_script(&self, provider: Uuid, group: Uuid, fields: ScriptFields) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.borrow_mut();
        let record = state.group_mut(provider, group).expect("seeded script group");
        record.scripts.push(ScriptRecord { id, fields });
        id
    }

    /// Stored fields of a script, looked up by identity path
    pub fn script_fields(&self, provider: &str, group: &str, script: &str) -> Option<ScriptFields> {
        let state = self.state.borrow();
        state
            .providers
            .iter()
            .find(|p| p.fields.alt_id == *provider)?
            .groups
            .iter()
            .find(|g| g.fields.alt_id == *group)?
            .scripts
            .iter()
            .find(|s| s.fields.alt_id == *script)
            .map(|s| s.fields.clone())
    }

    /// Stored fields of a script group, looked up by identity path
    pub fn script_group_fields(&self, provider: &str, group: &str) -> Option<ScriptGroupFields> {
        let state = self.state.borrow();
        state
            .providers
            .iter()
            .find(|p| p.fields.alt_id == *provider)?
            .groups
            .iter()
            .find(|g| g.fields.alt_id == *group)
            .map(|g| g.fields.clone())
    }

    pub fn provider_fields(&self, provider: &str) -> Option<ProviderFields> {
        self.state
            .borrow()
            .providers
            .iter()
            .find(|p| p.fields.alt_id == *provider)
            .map(|p| p.fields.clone())
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn script_snapshot(record: &ScriptRecord) -> ScriptSnapshot {
    ScriptSnapshot {
        id: record.id,
        alt_id: record.fields.alt_id.to_string(),
        version: SCRIPT_SCHEMA.compute(&record.fields).to_string(),
        public: record.fields.public,
    }
}

fn apply_provider_patch(fields: &mut ProviderFields, patch: &ProviderPatch) {
    if let Some(v) = &patch.alt_id {
        fields.alt_id = v.clone();
    }
    if let Some(v) = &patch.name {
        fields.name = v.clone();
    }
    if let Some(v) = &patch.description {
        fields.description = v.clone();
    }
    if let Some(v) = &patch.category {
        fields.category = v.clone();
    }
    if let Some(v) = &patch.logo_url {
        fields.logo_url = v.clone();
    }
    if let Some(v) = &patch.banner_url {
        fields.banner_url = v.clone();
    }
    if let Some(v) = &patch.url {
        fields.url = v.clone();
    }
    if let Some(v) = &patch.color {
        fields.color = v.clone();
    }
    if let Some(v) = patch.public {
        fields.public = v;
    }
    if let Some(v) = patch.account_service {
        fields.account_service = v;
    }
}

fn apply_group_patch(fields: &mut ScriptGroupFields, patch: &ScriptGroupPatch) {
    if let Some(v) = &patch.alt_id {
        fields.alt_id = v.clone();
    }
    if let Some(v) = &patch.name {
        fields.name = v.clone();
    }
    if let Some(v) = &patch.description {
        fields.description = v.clone();
    }
    if let Some(v) = patch.public {
        fields.public = v;
    }
}

fn apply_script_patch(fields: &mut ScriptFields, patch: &ScriptPatch) {
    if let Some(v) = &patch.alt_id {
        fields.alt_id = v.clone();
    }
    if let Some(v) = &patch.name {
        fields.name = v.clone();
    }
    if let Some(v) = &patch.description {
        fields.description = v.clone();
    }
    if let Some(v) = patch.recurrence {
        fields.recurrence = v;
    }
    if let Some(v) = patch.price_in_cents {
        fields.price_in_cents = v;
    }
    if let Some(v) = patch.sla_sec {
        fields.sla_sec = v;
    }
    if let Some(v) = patch.token_lifetime_sec {
        fields.token_lifetime_sec = v;
    }
    if let Some(v) = patch.public {
        fields.public = v;
    }
}

impl Gateway for MemoryGateway {
    fn read_provider_profile(
        &self,
        provider: &Identity,
    ) -> GatewayResult<Option<ProviderSnapshot>> {
        self.record(Call::ReadProvider {
            alt_id: provider.to_string(),
        });
        let state = self.state.borrow();
        state.check_failure(CallKind::ReadProvider, provider.as_str())?;

        Ok(state
            .providers
            .iter()
            .find(|p| p.fields.alt_id == *provider)
            .map(|p| ProviderSnapshot {
                id: p.id,
                alt_id: Some(p.fields.alt_id.to_string()),
                version: PROVIDER_SCHEMA.compute(&p.fields).to_string(),
                public: p.fields.public,
                script_groups: p
                    .groups
                    .iter()
                    .map(|g| ScriptGroupSummary {
                        id: g.id,
                        alt_id: g.fields.alt_id.to_string(),
                        public: g.fields.public,
                    })
                    .collect(),
            }))
    }

    fn create_provider(&self, fields: &ProviderFields) -> GatewayResult<Uuid> {
        self.record(Call::CreateProvider {
            alt_id: fields.alt_id.to_string(),
        });
        self.state
            .borrow()
            .check_failure(CallKind::CreateProvider, fields.alt_id.as_str())?;
        Ok(self.seed_provider(fields.clone()))
    }

    fn update_provider(&self, provider: Uuid, patch: &ProviderPatch) -> GatewayResult<Uuid> {
        self.record(Call::UpdateProvider {
            id: provider,
            patch: patch.clone(),
        });
        let mut state = self.state.borrow_mut();
        let alt_id = state.provider_mut(provider)?.fields.alt_id.to_string();
        state.check_failure(CallKind::UpdateProvider, &alt_id)?;
        apply_provider_patch(&mut state.provider_mut(provider)?.fields, patch);
        Ok(provider)
    }

    fn read_script_group(
        &self,
        provider: Uuid,
        group: &Identity,
    ) -> GatewayResult<Option<ScriptGroupSnapshot>> {
        self.record(Call::ReadScriptGroup {
            alt_id: group.to_string(),
        });
        let mut state = self.state.borrow_mut();
        state.check_failure(CallKind::ReadScriptGroup, group.as_str())?;

        Ok(state
            .provider_mut(provider)?
            .groups
            .iter()
            .find(|g| g.fields.alt_id == *group)
            .map(|g| ScriptGroupSnapshot {
                id: g.id,
                alt_id: g.fields.alt_id.to_string(),
                version: SCRIPT_GROUP_SCHEMA.compute(&g.fields).to_string(),
                public: g.fields.public,
                scripts: g.scripts.iter().map(script_snapshot).collect(),
            }))
    }

    fn create_script_group(
        &self,
        provider: Uuid,
        fields: &ScriptGroupFields,
    ) -> GatewayResult<Uuid> {
        self.record(Call::CreateScriptGroup {
            alt_id: fields.alt_id.to_string(),
        });
        let mut state = self.state.borrow_mut();
        state.check_failure(CallKind::CreateScriptGroup, fields.alt_id.as_str())?;

        let id = Uuid::new_v4();
        state.provider_mut(provider)?.groups.push(GroupRecord {
            id,
            fields: fields.clone(),
            scripts: Vec::new(),
        });
        Ok(id)
    }

    fn update_script_group(
        &self,
        provider: Uuid,
        group: Uuid,
        patch: &ScriptGroupPatch,
    ) -> GatewayResult<Uuid> {
        self.record(Call::UpdateScriptGroup {
            id: group,
            patch: patch.clone(),
        });
        let mut state = self.state.borrow_mut();
        let alt_id = state.group_mut(provider, group)?.fields.alt_id.to_string();
        state.check_failure(CallKind::UpdateScriptGroup, &alt_id)?;
        apply_group_patch(&mut state.group_mut(provider, group)?.fields, patch);
        Ok(group)
    }

    fn read_script(
        &self,
        provider: Uuid,
        group: Uuid,
        script: &Identity,
    ) -> GatewayResult<Option<ScriptSnapshot>> {
        self.record(Call::ReadScript {
            alt_id: script.to_string(),
        });
        let mut state = self.state.borrow_mut();
        state.check_failure(CallKind::ReadScript, script.as_str())?;

        Ok(state
            .group_mut(provider, group)?
            .scripts
            .iter()
            .find(|s| s.fields.alt_id == *script)
            .map(script_snapshot))
    }

    fn create_script(
        &self,
        provider: Uuid,
        group: Uuid,
        fields: &ScriptFields,
    ) -> GatewayResult<Uuid> {
        self.record(Call::CreateScript {
            alt_id: fields.alt_id.to_string(),
        });
        let mut state = self.state.borrow_mut();
        state.check_failure(CallKind::CreateScript, fields.alt_id.as_str())?;

        let id = Uuid::new_v4();
        state.group_mut(provider, group)?.scripts.push(ScriptRecord {
            id,
            fields: fields.clone(),
        });
        Ok(id)
    }

    fn update_script(
        &self,
        provider: Uuid,
        group: Uuid,
        script: Uuid,
        patch: &ScriptPatch,
    ) -> GatewayResult<Uuid> {
        self.record(Call::UpdateScript {
            id: script,
            patch: patch.clone(),
        });
        let mut state = self.state.borrow_mut();
        let alt_id = state
            .script_mut(provider, group, script)?
            .fields
            .alt_id
            .to_string();
        state.check_failure(CallKind::UpdateScript, &alt_id)?;
        apply_script_patch(&mut state.script_mut(provider, group, script)?.fields, patch);
        Ok(script)
    }

    fn issue_subscriber_token(&self, subscriber_id: &str) -> GatewayResult<String> {
        self.record(Call::IssueToken {
            subscriber_id: subscriber_id.to_string(),
        });
        let state = self.state.borrow();
        state.check_failure(CallKind::IssueToken, subscriber_id)?;

        if subscriber_id.is_empty() {
            return Err(rejected("subscriber id is required".to_string()));
        }

        let claims: Vec<ScriptClaim> = state
            .grants
            .iter()
            .filter(|(s, _)| s == subscriber_id)
            .map(|(_, c)| c.clone())
            .collect();

        Ok(TokenPayload::new(subscriber_id)
            .script_claims(&claims)
            .expires_at(Utc::now() + Duration::hours(1))
            .sign_rs256())
    }

    fn fetch_signing_public_key(&self) -> GatewayResult<String> {
        self.record(Call::FetchSigningKey);
        self.state
            .borrow()
            .check_failure(CallKind::FetchSigningKey, "")?;
        Ok(RSA_PUBLIC_PEM.to_string())
    }

    fn reset_provider_keys(&self, provider: Uuid) -> GatewayResult<ProviderKeys> {
        self.record(Call::ResetKeys { provider });
        let mut state = self.state.borrow_mut();
        let alt_id = state.provider_mut(provider)?.fields.alt_id.to_string();
        state.check_failure(CallKind::ResetKeys, &alt_id)?;
        Ok(ProviderKeys {
            api_key: Uuid::new_v4().simple().to_string(),
            secret_key: Uuid::new_v4().simple().to_string(),
        })
    }
}
