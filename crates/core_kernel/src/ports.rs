//! Ports and Adapters Infrastructure
//!
//! ```text
//!        BillingService / CatalogService / AccessGuard
//!                             │
//!                             ▼
//!     MembershipPort · CatalogPort · BillingStore (per domain crate)
//!                  ▲                          ▲
//!        ┌─────────┴─────────┐      ┌─────────┴─────────┐
//!        │ infra_db          │      │ in-memory         │
//!        │ (PostgreSQL)      │      │ (`mock` feature)  │
//!        └───────────────────┘      └───────────────────┘
//! ```
//!
//! Port traits extend [`DomainPort`] and [`HealthCheckable`]. Every adapter
//! reports failures as [`PortError`], whatever its backing store.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Failure reported by any port adapter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The store rejected the data itself (check or foreign key)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// A uniqueness rule rejected the write
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Connection loss or timeout; the same call may succeed later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if a uniqueness rule rejected the write
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker for port traits; adapters are shared across tasks
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of one adapter health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    /// Round trip of the check
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Adapters that can check their backing store
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

/// Caller context passed along with port calls for tracing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMetadata {
    /// Principal on whose behalf the call is made
    pub initiated_by: Option<String>,
}

impl OperationMetadata {
    pub fn initiated_by(mut self, principal: impl fmt::Display) -> Self {
        self.initiated_by = Some(principal.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Bill", "123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Bill"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_port_error_classification() {
        let timeout = PortError::Timeout {
            operation: "insert_bill".to_string(),
            duration_ms: 5000,
        };
        assert!(timeout.is_transient());

        let conflict = PortError::conflict("bill_number BILL-2024-000001 already exists");
        assert!(conflict.is_conflict());
        assert!(!conflict.is_transient());

        let validation = PortError::validation("name is required");
        assert!(!validation.is_transient());
        assert!(!validation.is_conflict());
    }

    #[test]
    fn test_health_check_result() {
        let result = HealthCheckResult::unhealthy("postgres-billing", 12, "pool closed");
        assert_eq!(result.status, AdapterHealth::Unhealthy);
        assert!(!result.is_healthy());
        assert_eq!(result.message.as_deref(), Some("pool closed"));
    }

    #[test]
    fn test_operation_metadata() {
        let metadata = OperationMetadata::default().initiated_by("USR-42");
        assert_eq!(metadata.initiated_by.as_deref(), Some("USR-42"));
    }
}
