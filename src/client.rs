//! Usage-limit client for the Claude web API
//!
//! Fetches the per-window utilization for the signed-in organization. The
//! organization id is resolved once and reused; the HTTP client carries a
//! bounded request timeout so a hung request never outlives a refresh tick.

use crate::errors::FetchError;
use crate::models::{UsageLimit, UsageSnapshot};
use crate::session::AuthSession;
use chrono::Utc;
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, COOKIE, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const MAX_IDLE_PER_HOST: usize = 1;
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Source of usage snapshots.
///
/// Implementations must be safe to call concurrently with themselves and
/// must bound their own latency.
pub trait UsageSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<UsageSnapshot, FetchError>>;
}

/// Wire format of `GET /organizations/{id}/usage`
#[derive(Debug, Deserialize)]
struct UsageResponse {
    five_hour: Option<UsageLimit>,
    seven_day: Option<UsageLimit>,
    seven_day_opus: Option<UsageLimit>,
}

pub struct ClaudeUsageClient {
    http: reqwest::Client,
    base_url: String,
    session_key: String,
    organization_id: OnceCell<String>,
}

impl ClaudeUsageClient {
    pub fn new(
        session_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_key: session_key.into(),
            organization_id: OnceCell::new(),
        })
    }

    /// Build a client from a stored session, reusing its organization id
    pub fn from_session(
        session: &AuthSession,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Self::new(session.session_key.clone(), base_url, timeout)?;
        if let Some(org) = session.organization_id.as_ref().filter(|o| !o.is_empty()) {
            // Freshly created cell, cannot already be set
            let _ = client.organization_id.set(org.clone());
        }
        Ok(client)
    }

    /// The organization id, once known
    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.get().map(String::as_str)
    }

    /// Fetch real-time usage limits
    pub async fn get_usage_limits(&self) -> Result<UsageSnapshot, FetchError> {
        let org = self
            .organization_id
            .get_or_try_init(|| self.fetch_organization_id())
            .await?;

        let url = format!("{}/organizations/{}/usage", self.base_url, org);
        let response = self.authorized_get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthFailed {
                status: status.as_u16(),
            });
        }

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let usage: UsageResponse = serde_json::from_slice(&body)?;

        debug!(organization = %org, "Fetched usage limits");

        Ok(UsageSnapshot {
            five_hour: usage.five_hour,
            seven_day: usage.seven_day,
            seven_day_opus: usage.seven_day_opus,
            fetched_at: Utc::now(),
        })
    }

    /// Check that the session key is accepted, resolving the organization id
    /// on the way
    pub async fn test_session(&self) -> Result<UsageSnapshot, FetchError> {
        self.get_usage_limits().await.map_err(|e| {
            if e.is_auth_failure() {
                FetchError::SessionExpired
            } else {
                e
            }
        })
    }

    async fn fetch_organization_id(&self) -> Result<String, FetchError> {
        let url = format!("{}/organizations", self.base_url);
        let response = self.authorized_get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthFailed {
                status: status.as_u16(),
            });
        }

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let value: Value = serde_json::from_slice(&body)?;
        let org = extract_organization_id(&value).ok_or(FetchError::OrganizationNotFound)?;

        info!(organization = %org, "Resolved organization ID");
        Ok(org)
    }

    fn authorized_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(COOKIE, format!("sessionKey={}", self.session_key))
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .header(ACCEPT, "application/json")
    }
}

impl UsageSource for ClaudeUsageClient {
    fn fetch(&self) -> BoxFuture<'_, Result<UsageSnapshot, FetchError>> {
        Box::pin(self.get_usage_limits())
    }
}

/// The organizations endpoint returns either a list or a single object; the
/// first entry's `uuid` wins over its `id`.
fn extract_organization_id(value: &Value) -> Option<String> {
    let org = match value {
        Value::Array(orgs) => orgs.first()?,
        Value::Object(_) => value,
        _ => return None,
    };

    ["uuid", "id"]
        .iter()
        .find_map(|key| org.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_org_id_from_array_prefers_uuid() {
        let value = json!([{"id": "legacy", "uuid": "org-uuid"}, {"uuid": "second"}]);
        assert_eq!(extract_organization_id(&value).as_deref(), Some("org-uuid"));
    }

    #[test]
    fn test_org_id_from_object_falls_back_to_id() {
        let value = json!({"id": "org-id", "name": "Personal"});
        assert_eq!(extract_organization_id(&value).as_deref(), Some("org-id"));
    }

    #[test]
    fn test_org_id_missing() {
        assert!(extract_organization_id(&json!([])).is_none());
        assert!(extract_organization_id(&json!([{"name": "x"}])).is_none());
        assert!(extract_organization_id(&json!("org")).is_none());
        assert!(extract_organization_id(&json!({"uuid": 42})).is_none());
    }

    #[test]
    fn test_usage_response_ignores_other_windows() {
        let body = r#"{
            "five_hour": {"utilization": 42.3, "resets_at": "2025-09-30T14:00:00Z"},
            "seven_day": {"utilization": 12.0, "resets_at": null},
            "seven_day_oauth_apps": null,
            "seven_day_opus": null,
            "iguana_necktie": null
        }"#;
        let usage: UsageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(usage.five_hour.unwrap().utilization, 42.3);
        assert!(usage.seven_day.unwrap().resets_at.is_none());
        assert!(usage.seven_day_opus.is_none());
    }

    #[test]
    fn test_session_org_id_is_reused() {
        let session = AuthSession {
            session_key: "sk-test".to_string(),
            organization_id: Some("org-1".to_string()),
            saved_at: None,
        };
        let client =
            ClaudeUsageClient::from_session(&session, "https://example.invalid/api/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.organization_id(), Some("org-1"));
        assert_eq!(client.base_url, "https://example.invalid/api");
    }
}
