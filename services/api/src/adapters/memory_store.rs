//! services/api/src/adapters/memory_store.rs
//!
//! In-memory implementation of the `FormPublishingService` port. Holds the
//! working draft of each campaign and every definition published from it.

use async_trait::async_trait;
use parking_lot::RwLock;
use recruitment_forms_core::{
    AddressToken, FormDefinition, FormPublishingService, PortError, PortResult, PublishedForm,
};
use std::collections::HashMap;

#[derive(Default)]
struct StoreInner {
    drafts: HashMap<String, FormDefinition>,
    published: HashMap<AddressToken, PublishedForm>,
    /// Tokens per campaign in publication order.
    by_campaign: HashMap<String, Vec<AddressToken>>,
}

/// A process-local form store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryFormStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormPublishingService for InMemoryFormStore {
    async fn publish(&self, form: &PublishedForm) -> PortResult<()> {
        let mut inner = self.inner.write();
        if inner.published.contains_key(&form.token) {
            return Err(PortError::Rejected(format!(
                "token {} is already published",
                form.token
            )));
        }
        inner.published.insert(form.token.clone(), form.clone());
        inner
            .by_campaign
            .entry(form.campaign_id.clone())
            .or_default()
            .push(form.token.clone());
        Ok(())
    }

    async fn get_published(&self, token: &AddressToken) -> PortResult<PublishedForm> {
        self.inner
            .read()
            .published
            .get(token)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Form {} not found", token)))
    }

    async fn list_published(&self, campaign_id: &str) -> PortResult<Vec<PublishedForm>> {
        let inner = self.inner.read();
        let forms = inner
            .by_campaign
            .get(campaign_id)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter_map(|token| inner.published.get(token).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(forms)
    }

    async fn get_draft(&self, campaign_id: &str) -> PortResult<Option<FormDefinition>> {
        Ok(self.inner.read().drafts.get(campaign_id).cloned())
    }

    async fn save_draft(&self, campaign_id: &str, definition: &FormDefinition) -> PortResult<()> {
        self.inner
            .write()
            .drafts
            .insert(campaign_id.to_string(), definition.clone());
        Ok(())
    }
}
