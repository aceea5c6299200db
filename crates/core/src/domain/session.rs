//! Explicit session context for dashboard users.
//!
//! Callers pass the context to handlers and check expiry with a supplied
//! clock value; nothing here reads ambient time or storage.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 10 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardRole {
    Msp,
    ItAdmin,
}

impl DashboardRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Msp => "MSP",
            Self::ItAdmin => "IT",
        }
    }
}

impl std::str::FromStr for DashboardRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "msp" => Ok(Self::Msp),
            "it" | "it_admin" | "it-admin" => Ok(Self::ItAdmin),
            other => Err(format!("unsupported dashboard role `{other}` (expected msp|it)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    pub role: DashboardRole,
    pub company_name: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.company_name.as_deref().filter(|name| !name.trim().is_empty()).unwrap_or(&self.username)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {session_id} expired after {idle_secs}s of inactivity")]
    Expired { session_id: Uuid, idle_secs: i64 },
    #[error("session token is empty")]
    MissingToken,
}

#[derive(Clone, Debug)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub user: UserProfile,
    token: SecretString,
    last_activity: DateTime<Utc>,
    idle_timeout: Duration,
}

impl SessionContext {
    pub fn start(
        token: impl Into<String>,
        user: UserProfile,
        now: DateTime<Utc>,
        idle_timeout_secs: u64,
    ) -> Result<Self, SessionError> {
        let token: String = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::MissingToken);
        }

        Ok(Self {
            session_id: Uuid::new_v4(),
            user,
            token: token.into(),
            last_activity: now,
            idle_timeout: Duration::seconds(idle_timeout_secs.min(u64::from(u32::MAX)) as i64),
        })
    }

    pub fn role(&self) -> DashboardRole {
        self.user.role
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// A session stays valid while the idle time is strictly below the timeout.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_activity) >= self.idle_timeout
    }

    /// Records user activity, failing if the session already lapsed.
    pub fn touch(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.is_expired(now) {
            return Err(SessionError::Expired {
                session_id: self.session_id,
                idle_secs: now.signed_duration_since(self.last_activity).num_seconds(),
            });
        }
        if now > self.last_activity {
            self.last_activity = now;
        }
        Ok(())
    }

    /// Fresh session for the same user and token, idle from `now`.
    pub fn renewed(&self, now: DateTime<Utc>) -> Self {
        Self { session_id: Uuid::new_v4(), last_activity: now, ..self.clone() }
    }

    /// Restores a persisted session when it is still within its idle window.
    pub fn restore(mut self, now: DateTime<Utc>) -> Option<Self> {
        self.touch(now).ok()?;
        Some(self)
    }
}
