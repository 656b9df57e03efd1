//! Payloads exchanged with a [`Gateway`](super::Gateway)

use scribe_meta::{ProviderSpec, ScriptGroupSpec, ScriptSpec};
use scribe_types::{Count, Identity, MoneyValue, Recurrence};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Remote provider as last stored by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub id: Uuid,
    #[serde(default)]
    pub alt_id: Option<String>,
    /// Server-computed fingerprint of the stored fields
    pub version: String,
    pub public: bool,
    #[serde(default)]
    pub script_groups: Vec<ScriptGroupSummary>,
}

/// Entry in a provider profile's list of script groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptGroupSummary {
    pub id: Uuid,
    pub alt_id: String,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptGroupSnapshot {
    pub id: Uuid,
    pub alt_id: String,
    pub version: String,
    pub public: bool,
    #[serde(default)]
    pub scripts: Vec<ScriptSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSnapshot {
    pub id: Uuid,
    pub alt_id: String,
    pub version: String,
    pub public: bool,
}

/// Full field set sent when creating a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFields {
    pub alt_id: Identity,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
    pub public: bool,
    pub account_service: bool,
}

impl From<&ProviderSpec> for ProviderFields {
    fn from(spec: &ProviderSpec) -> Self {
        Self {
            alt_id: spec.alt_id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            category: spec.category.clone(),
            logo_url: spec.logo_url.clone(),
            banner_url: spec.banner_url.clone(),
            url: spec.url.clone(),
            color: spec.color.clone(),
            public: spec.public,
            account_service: spec.account_service,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptGroupFields {
    pub alt_id: Identity,
    pub name: String,
    pub description: String,
    pub public: bool,
}

impl From<&ScriptGroupSpec> for ScriptGroupFields {
    fn from(spec: &ScriptGroupSpec) -> Self {
        Self {
            alt_id: spec.alt_id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            public: spec.public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFields {
    pub alt_id: Identity,
    pub name: String,
    pub description: String,
    pub recurrence: Recurrence,
    pub price_in_cents: MoneyValue,
    pub sla_sec: Count,
    pub token_lifetime_sec: Count,
    pub public: bool,
}

impl From<&ScriptSpec> for ScriptFields {
    fn from(spec: &ScriptSpec) -> Self {
        Self {
            alt_id: spec.alt_id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            recurrence: spec.recurrence,
            price_in_cents: spec.price,
            sla_sec: spec.sla_sec,
            token_lifetime_sec: spec.token_lifetime_sec,
            public: spec.public,
        }
    }
}

/// Partial provider update; unset fields are left alone by the catalog
///
/// Optional catalog fields take `Some(None)` to clear the stored value,
/// which serializes as an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub banner_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_service: Option<bool>,
}

impl ProviderPatch {
    /// Patch that only changes visibility
    pub fn visibility(public: bool) -> Self {
        Self {
            public: Some(public),
            ..Self::default()
        }
    }
}

impl From<&ProviderFields> for ProviderPatch {
    fn from(fields: &ProviderFields) -> Self {
        Self {
            alt_id: Some(fields.alt_id.clone()),
            name: Some(fields.name.clone()),
            description: Some(fields.description.clone()),
            category: Some(fields.category.clone()),
            logo_url: Some(fields.logo_url.clone()),
            banner_url: Some(fields.banner_url.clone()),
            url: Some(fields.url.clone()),
            color: Some(fields.color.clone()),
            public: Some(fields.public),
            account_service: Some(fields.account_service),
        }
    }
}

/// Keeps a present `null` distinct from an absent field
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptGroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl ScriptGroupPatch {
    pub fn visibility(public: bool) -> Self {
        Self {
            public: Some(public),
            ..Self::default()
        }
    }
}

impl From<&ScriptGroupFields> for ScriptGroupPatch {
    fn from(fields: &ScriptGroupFields) -> Self {
        Self {
            alt_id: Some(fields.alt_id.clone()),
            name: Some(fields.name.clone()),
            description: Some(fields.description.clone()),
            public: Some(fields.public),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_in_cents: Option<MoneyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_sec: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_lifetime_sec: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl ScriptPatch {
    pub fn visibility(public: bool) -> Self {
        Self {
            public: Some(public),
            ..Self::default()
        }
    }
}

impl From<&ScriptFields> for ScriptPatch {
    fn from(fields: &ScriptFields) -> Self {
        Self {
            alt_id: Some(fields.alt_id.clone()),
            name: Some(fields.name.clone()),
            description: Some(fields.description.clone()),
            recurrence: Some(fields.recurrence),
            price_in_cents: Some(fields.price_in_cents),
            sla_sec: Some(fields.sla_sec),
            token_lifetime_sec: Some(fields.token_lifetime_sec),
            public: Some(fields.public),
        }
    }
}

/// Fresh provider credentials returned by a key reset
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderKeys {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderKeys")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
