use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{info, warn};

use pulseops_core::config::AppConfig;
use pulseops_core::domain::alert::AlertStatus;
use pulseops_core::domain::client::ClientId;
use pulseops_core::domain::session::{DashboardRole, SessionContext, UserProfile};
use pulseops_core::normalize::{normalize_clients, RawRecord};
use pulseops_core::store::{ClientStore, PortfolioStats, StoreError};

const SERVICE_USERNAME: &str = "pulseops-service";
const SERVICE_EMAIL: &str = "service@pulseops.local";

/// Client for the REST backend that owns the portfolio.
///
/// Authenticated requests carry the token of the attached session. The
/// session is touched before every request and renewed once it has been idle
/// past its timeout.
#[derive(Clone)]
pub struct ApiClientStore {
    client: Client,
    base_url: String,
    session: Option<Arc<Mutex<SessionContext>>>,
}

impl ApiClientStore {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(timeout_secs.max(1))).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url, session: None })
    }

    /// Opens a service session from `api.token` with `session.idle_timeout_secs`.
    /// A blank or missing token leaves requests unauthenticated.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let store = Self::new(config.api.base_url.clone(), config.api.timeout_secs)?;
        let session = config.api.token.as_ref().and_then(|token| {
            config.session.start(token.expose_secret(), service_user(), Utc::now()).ok()
        });
        Ok(match session {
            Some(session) => store.with_session(session),
            None => store,
        })
    }

    /// Sends requests with this session's token.
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = Some(Arc::new(Mutex::new(session)));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Token of the live session at `now`, renewing a lapsed one first.
    fn session_token(&self, now: DateTime<Utc>) -> Result<Option<SecretString>, StoreError> {
        let Some(session) = &self.session else {
            return Ok(None);
        };
        let mut session = session
            .lock()
            .map_err(|_| StoreError::Unavailable("api session lock poisoned".to_string()))?;

        if session.touch(now).is_err() {
            let renewed = session.renewed(now);
            info!(
                event_name = "store.api.session_renewed",
                expired_session = %session.session_id,
                session_id = %renewed.session_id,
                "api session renewed after idle timeout"
            );
            *session = renewed;
        }
        Ok(Some(session.token().clone()))
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        Ok(match self.session_token(Utc::now())? {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        self.authorize(request)?.send().await.map_err(|error| {
            warn!(event_name = "store.api.request_failed", error = %error, "api request failed");
            StoreError::Unavailable(error.to_string())
        })
    }
}

fn service_user() -> UserProfile {
    UserProfile {
        email: SERVICE_EMAIL.to_string(),
        username: SERVICE_USERNAME.to_string(),
        role: DashboardRole::Msp,
        company_name: None,
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|payload| payload.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    if status.is_client_error() {
        Err(StoreError::Rejected(format!("{status}: {detail}")))
    } else {
        Err(StoreError::Unavailable(format!("{status}: {detail}")))
    }
}

async fn read_record(response: Response) -> Result<RawRecord, StoreError> {
    match response.json::<Value>().await.map_err(|error| StoreError::Decode(error.to_string()))? {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::Decode(format!("expected a json object, got {other}"))),
    }
}

async fn read_records(response: Response) -> Result<Vec<RawRecord>, StoreError> {
    let payload =
        response.json::<Value>().await.map_err(|error| StoreError::Decode(error.to_string()))?;
    records_from_payload(payload)
}

/// Accepts a bare array or a paginated `{"results": [...]}` envelope.
fn records_from_payload(payload: Value) -> Result<Vec<RawRecord>, StoreError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(Value::Array(items)) => items,
            _ => return Err(StoreError::Decode("expected a json array of records".to_string())),
        },
        other => return Err(StoreError::Decode(format!("expected a json array, got {other}"))),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect())
}

#[async_trait::async_trait]
impl ClientStore for ApiClientStore {
    async fn get_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        let response = self.send(self.client.get(self.endpoint("clients/"))).await?;
        read_records(check(response).await?).await
    }

    async fn get_by_id(&self, id: &ClientId) -> Result<Option<RawRecord>, StoreError> {
        let response =
            self.send(self.client.get(self.endpoint(&format!("clients/{}", id.0)))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_record(check(response).await?).await.map(Some)
    }

    async fn create(&self, raw: RawRecord) -> Result<RawRecord, StoreError> {
        let response = self.send(self.client.post(self.endpoint("clients/")).json(&raw)).await?;
        read_record(check(response).await?).await
    }

    async fn update(
        &self,
        id: &ClientId,
        patch: RawRecord,
    ) -> Result<Option<RawRecord>, StoreError> {
        let request = self.client.put(self.endpoint(&format!("clients/{}", id.0))).json(&patch);
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_record(check(response).await?).await.map(Some)
    }

    async fn get_stats(&self) -> Result<PortfolioStats, StoreError> {
        let clients = self.get_all().await?;
        Ok(PortfolioStats::from_records(&normalize_clients(&clients)))
    }

    async fn get_alerts(&self, status: AlertStatus) -> Result<Vec<RawRecord>, StoreError> {
        let request =
            self.client.get(self.endpoint("alerts")).query(&[("status", status.as_str())]);
        let response = self.send(request).await?;
        read_records(check(response).await?).await
    }
}
