pub mod alerts;
pub mod assistant;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod errors;
pub mod format;
pub mod metrics;
pub mod normalize;
pub mod portfolio;
pub mod recommendations;
pub mod scoring;
pub mod store;
pub mod validation;

pub use alerts::{fallback_alerts, AlertFeed, AlertSource};
pub use assistant::{FaqAnswer, FaqAssistant, MatchKind};
pub use dashboard::{AtRiskView, ClientDetail, ClientLookup, DashboardService, LicenseView};
pub use domain::alert::{AlertRecord, AlertStatus, AlertType, Priority};
pub use domain::client::{ChurnRiskLevel, ClientId, ClientRecord, ClientStatus};
pub use domain::session::{DashboardRole, SessionContext, SessionError, UserProfile};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use normalize::{normalize_alert, normalize_client, normalize_clients, RawRecord};
pub use portfolio::{LicenseSummary, PortfolioSummary, RiskCohorts};
pub use recommendations::Recommendation;
pub use scoring::{recalculate, RecalcTrigger};
pub use store::{ClientStore, PortfolioStats, StoreError};
pub use validation::{ClientDraft, ClientUpdate, ValidationError};
