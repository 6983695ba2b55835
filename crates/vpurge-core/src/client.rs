use crate::config::Config;
use crate::error::{PurgeError, Result};
use crate::executor::DeleteTransport;
use crate::lister::{parse_listing, Inventory, ResourceLister};
use crate::session::Session;
use crate::types::ResourceKind;
use reqwest::blocking::Client;
use std::time::Duration;

/// Blocking HTTP client for the Command public API.
///
/// Session headers are installed once as client defaults, so every list
/// and delete call carries them.
#[derive(Debug, Clone)]
pub struct CommandClient {
    http: Client,
    base_url: String,
    org_id: String,
}

impl CommandClient {
    pub fn new(
        base_url: impl Into<String>,
        org_id: impl Into<String>,
        session: &Session,
        timeout: Duration,
    ) -> Result<Self> {
        let org_id = org_id.into();
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(session.headers(&org_id)?)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            org_id,
        })
    }

    pub fn from_config(config: &Config, session: &Session) -> Result<Self> {
        Self::new(
            config.api.base_url.clone(),
            config.org_id.clone(),
            session,
            config.api.timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ResourceLister for CommandClient {
    fn list(&self, kind: ResourceKind) -> Result<Inventory> {
        let response = self
            .http
            .get(self.url(kind.list_path()))
            .query(&[("org_id", self.org_id.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                "error with retrieving {kind}. status code {}",
                status.as_u16()
            );
            return Err(PurgeError::Fetch {
                kind,
                status: status.as_u16(),
            });
        }

        let text = response.text()?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| PurgeError::MalformedListing {
                kind,
                reason: e.to_string(),
            })?;
        let inventory = parse_listing(kind, &body)?;
        if inventory.is_empty() {
            tracing::warn!("{kind} listing returned zero records");
        }
        Ok(inventory)
    }
}

impl DeleteTransport for CommandClient {
    fn delete(&self, kind: ResourceKind, id: &str) -> Result<u16> {
        let response = self
            .http
            .delete(self.url(kind.delete_path()))
            .query(&[("org_id", self.org_id.as_str()), (kind.id_field(), id)])
            .send()?;
        Ok(response.status().as_u16())
    }
}
