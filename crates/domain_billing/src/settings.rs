//! Billing configuration

use serde::{Deserialize, Serialize};

use core_kernel::{CoreError, Currency};

/// Tunables for bill creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    /// Leading segment of every bill number
    pub bill_number_prefix: String,
    /// Upper bound on bill-number candidates and conflict restarts per create
    pub max_allocation_attempts: u32,
    /// Currency bills are issued in
    pub currency: Currency,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            bill_number_prefix: "BILL".to_string(),
            max_allocation_attempts: 10,
            currency: Currency::USD,
        }
    }
}

impl BillingSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.bill_number_prefix.trim().is_empty() {
            return Err(CoreError::configuration("billing.bill_number_prefix must not be empty"));
        }
        if self.max_allocation_attempts == 0 {
            return Err(CoreError::configuration(
                "billing.max_allocation_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = BillingSettings::default();
        assert_eq!(settings.bill_number_prefix, "BILL");
        assert_eq!(settings.max_allocation_attempts, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let settings = BillingSettings {
            max_allocation_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let settings: BillingSettings =
            serde_json::from_str(r#"{"currency": "INR"}"#).unwrap();
        assert_eq!(settings.currency, Currency::INR);
        assert_eq!(settings.bill_number_prefix, "BILL");
    }
}
