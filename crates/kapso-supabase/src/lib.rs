//! Supabase-backed [`LeadStore`].
//!
//! Talks to the PostgREST endpoint Supabase exposes under `/rest/v1`,
//! authenticating with the project's service-role key.

use async_trait::async_trait;
use kapso_leads::{ConversationState, LeadRecord, LeadStore, LeadUpdate, StoreError};
use serde::Serialize;
use tracing::{debug, instrument};

/// Table holding one row per lead.
pub const DEFAULT_TABLE: &str = "leads";

/// PostgREST client for the leads table.
#[derive(Clone, Debug)]
pub struct SupabaseLeadStore {
    /// Project URL, e.g. `https://xyz.supabase.co`; override for testing.
    pub base_url: String,
    service_key: String,
    pub table: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct NewLead<'a> {
    phone_number: &'a str,
    conversation_state: &'a ConversationState,
}

#[derive(Debug, Serialize)]
struct UpsertLead<'a> {
    phone_number: &'a str,
    #[serde(flatten)]
    update: &'a LeadUpdate,
}

impl SupabaseLeadStore {
    pub fn new<S: Into<String>>(base_url: S, service_key: S) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            table: DEFAULT_TABLE.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        )
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let message = res.text().await.unwrap_or_default();
        Err(StoreError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(res: reqwest::Response) -> Result<Vec<LeadRecord>, StoreError> {
        let res = Self::check(res).await?;
        let text = res
            .text()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LeadStore for SupabaseLeadStore {
    #[instrument(skip(self))]
    async fn find_by_phone(&self, phone: &str) -> Result<Option<LeadRecord>, StoreError> {
        let filter = format!("eq.{phone}");
        let res = self
            .request(reqwest::Method::GET)
            .query(&[
                ("phone_number", filter.as_str()),
                ("select", "*"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        let mut rows = Self::rows(res).await?;
        debug!(found = !rows.is_empty(), "lead lookup");
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    #[instrument(skip(self, state))]
    async fn create(
        &self,
        phone: &str,
        state: &ConversationState,
    ) -> Result<LeadRecord, StoreError> {
        let res = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(&NewLead {
                phone_number: phone,
                conversation_state: state,
            })
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Self::rows(res)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unexpected("insert returned no row".into()))
    }

    #[instrument(skip(self, update), fields(step = %update.conversation_state.step))]
    async fn upsert(&self, phone: &str, update: &LeadUpdate) -> Result<(), StoreError> {
        let res = self
            .request(reqwest::Method::POST)
            .query(&[("on_conflict", "phone_number")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&UpsertLead {
                phone_number: phone,
                update,
            })
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Self::check(res).await?;
        Ok(())
    }
}
