use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Month,
    Year,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Month => "month",
            BillingCycle::Year => "year",
        }
    }

    /// Accepts the canonical names plus the `monthly`/`yearly` spellings some callers send.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "month" | "monthly" => Some(BillingCycle::Month),
            "year" | "yearly" => Some(BillingCycle::Year),
            _ => None,
        }
    }

    /// Number of calendar months one cycle spans.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Month => 1,
            BillingCycle::Year => 12,
        }
    }
}

impl Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
