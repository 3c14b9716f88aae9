//! Billing cycle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// How often a subscription is charged.
///
/// Only two cycles exist. Text outside them is rejected when parsed, so a
/// `BillingCycle` value can never hold anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// Number of calendar months in one cycle
    pub fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(DomainError::InvalidCycle(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_cycles() {
        assert_eq!("monthly".parse::<BillingCycle>(), Ok(BillingCycle::Monthly));
        assert_eq!("yearly".parse::<BillingCycle>(), Ok(BillingCycle::Yearly));
    }

    #[test]
    fn test_parse_rejects_other_values() {
        for input in ["weekly", "", "Monthly", " monthly"] {
            let err = input.parse::<BillingCycle>().unwrap_err();
            assert_eq!(err, DomainError::InvalidCycle(input.to_string()));
        }
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&BillingCycle::Yearly).unwrap();
        assert_eq!(json, "\"yearly\"");

        let cycle: BillingCycle = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(cycle, BillingCycle::Monthly);
    }
}
