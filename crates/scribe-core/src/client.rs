//! Catalog client facade
//!
//! Ties a [`Gateway`] to reconciliation and subscriber token handling. The
//! client owns the signing key cache, so validating tokens takes `&mut self`.

use scribe_meta::{Manifest, ProviderSpec, Settings};
use scribe_token::{SigningKeyCache, SubscriberToken, TokenValidator};
use scribe_types::{EntityKind, Identity};
use uuid::Uuid;

use crate::gateway::{
    Gateway, ProviderFields, ProviderKeys, ProviderPatch, ScriptGroupSnapshot, ScriptSnapshot,
};
use crate::reconcile::{IdentityPath, Operation, ReconcileOptions, ReconcileReport, Reconciler};
use crate::{Error, Result};

pub struct CatalogClient<G: Gateway> {
    gateway: G,
    options: ReconcileOptions,
    validator: TokenValidator,
    keys: SigningKeyCache,
}

impl<G: Gateway> CatalogClient<G> {
    /// Create a client with default options
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            options: ReconcileOptions::default(),
            validator: TokenValidator::default(),
            keys: SigningKeyCache::new(),
        }
    }

    /// Create a client configured from resolved settings
    pub fn with_settings(gateway: G, settings: &Settings) -> Self {
        Self {
            gateway,
            options: ReconcileOptions::from(&settings.sync),
            validator: TokenValidator::from_settings(&settings.tokens),
            keys: SigningKeyCache::new(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Reconcile the manifest's provider tree with the configured options
    pub fn reconcile(&self, manifest: &Manifest) -> Result<ReconcileReport> {
        Reconciler::with_options(&self.gateway, self.options).reconcile(&manifest.provider)
    }

    /// Report what a reconcile would do without writing anything
    pub fn plan(&self, manifest: &Manifest) -> Result<ReconcileReport> {
        let options = ReconcileOptions {
            dry_run: true,
            ..self.options
        };
        Reconciler::with_options(&self.gateway, options).reconcile(&manifest.provider)
    }

    /// Create a provider profile and issue its first API and secret keys
    ///
    /// Child script groups are not created; run [`CatalogClient::reconcile`]
    /// afterwards.
    pub fn register_provider(&self, provider: &ProviderSpec) -> Result<(Uuid, ProviderKeys)> {
        let path = IdentityPath::root(provider.alt_id.as_str());
        let id = self
            .gateway
            .create_provider(&ProviderFields::from(provider))
            .map_err(|source| Error::Gateway {
                kind: EntityKind::Provider,
                path,
                operation: Operation::Create,
                source,
            })?;

        let keys = self
            .gateway
            .reset_provider_keys(id)
            .map_err(|e| Error::remote("reset provider keys", e))?;

        tracing::info!(identity = %provider.alt_id, canonical_id = %id, "Registered provider");
        Ok((id, keys))
    }

    /// Rotate a provider's API key and secret key
    pub fn reset_provider_keys(&self, provider_id: Uuid) -> Result<ProviderKeys> {
        self.gateway
            .reset_provider_keys(provider_id)
            .map_err(|e| Error::remote("reset provider keys", e))
    }

    /// Turn a provider's visibility on or off
    pub fn set_provider_public(&self, provider_id: Uuid, public: bool) -> Result<Uuid> {
        self.gateway
            .update_provider(provider_id, &ProviderPatch::visibility(public))
            .map_err(|e| Error::remote("update provider visibility", e))
    }

    pub fn read_script_group(
        &self,
        provider_id: Uuid,
        group: &Identity,
    ) -> Result<Option<ScriptGroupSnapshot>> {
        self.gateway
            .read_script_group(provider_id, group)
            .map_err(|e| Error::remote("read script group", e))
    }

    pub fn read_script(
        &self,
        provider_id: Uuid,
        group_id: Uuid,
        script: &Identity,
    ) -> Result<Option<ScriptSnapshot>> {
        self.gateway
            .read_script(provider_id, group_id, script)
            .map_err(|e| Error::remote("read script", e))
    }

    /// Ask the catalog to mint a subscriber token
    pub fn issue_subscriber_token(&self, subscriber_id: &str) -> Result<String> {
        let token = self
            .gateway
            .issue_subscriber_token(subscriber_id)
            .map_err(|e| Error::remote("issue subscriber token", e))?;
        tracing::debug!(subscriber = subscriber_id, "Issued subscriber token");
        Ok(token)
    }

    /// Validate a subscriber token against the catalog's signing key
    ///
    /// The public key is fetched on first use and cached for the lifetime of
    /// the client.
    pub fn validate_subscriber_token(&mut self, token: &str) -> Result<SubscriberToken> {
        let gateway = &self.gateway;
        let key = self.keys.get_or_fetch(|| {
            gateway
                .fetch_signing_public_key()
                .map_err(|e| Error::remote("fetch signing public key", e))
        })?;
        Ok(self.validator.validate(token, key)?)
    }

    /// Forget the cached signing key so the next validation fetches it again
    pub fn refresh_signing_key(&mut self) {
        self.keys.invalidate();
    }
}
