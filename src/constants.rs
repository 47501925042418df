//! # System Constants
//!
//! Names shared across modules: environment variables and the keys deletion
//! pipelines store in their flow data.

/// Environment variables read outside the `ORCHESTRATOR__` override namespace
pub mod env {
    /// Deployment environment, checked before `APP_ENV`
    pub const ORCHESTRATOR_ENV: &str = "ORCHESTRATOR_ENV";
    pub const APP_ENV: &str = "APP_ENV";
    pub const DEFAULT_ENVIRONMENT: &str = "development";
    /// `json` switches console logging to JSON lines
    pub const LOG_FORMAT: &str = "ORCHESTRATOR_LOG_FORMAT";
}

/// Keys of the shared flow data of deletion pipelines
pub mod flow_keys {
    pub const RESOURCE_ID: &str = "resource_id";
    pub const DELETION_MODE: &str = "mode";
    /// State before `mark-pending-delete`, restored on rollback
    pub const PRIOR_STATE: &str = "prior_state";
    pub const PRIOR_UPDATED_AT: &str = "prior_updated_at";
}
