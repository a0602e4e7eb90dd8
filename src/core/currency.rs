//! Supported currencies and the quoted pairs between them

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Brl,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Brl, Currency::Usd, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Brl => "R$",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Currency::Brl => "Brazilian Real",
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(anyhow::anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// A directly quoted rate: one unit of `base` expressed in `quote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RatePair {
    #[serde(rename = "USDBRL")]
    UsdBrl,
    #[serde(rename = "EURBRL")]
    EurBrl,
    #[serde(rename = "EURUSD")]
    EurUsd,
    #[serde(rename = "USDEUR")]
    UsdEur,
}

impl RatePair {
    pub const ALL: [RatePair; 4] = [
        RatePair::UsdBrl,
        RatePair::EurBrl,
        RatePair::EurUsd,
        RatePair::UsdEur,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RatePair::UsdBrl => "USDBRL",
            RatePair::EurBrl => "EURBRL",
            RatePair::EurUsd => "EURUSD",
            RatePair::UsdEur => "USDEUR",
        }
    }

    pub fn base(&self) -> Currency {
        match self {
            RatePair::UsdBrl | RatePair::UsdEur => Currency::Usd,
            RatePair::EurBrl | RatePair::EurUsd => Currency::Eur,
        }
    }

    pub fn quote(&self) -> Currency {
        match self {
            RatePair::UsdBrl | RatePair::EurBrl => Currency::Brl,
            RatePair::EurUsd => Currency::Usd,
            RatePair::UsdEur => Currency::Eur,
        }
    }

    /// Rate used when no live quote is available for this pair.
    pub fn fallback_rate(&self) -> f64 {
        match self {
            RatePair::UsdBrl => 5.10,
            RatePair::EurBrl => 5.55,
            RatePair::EurUsd => 1.09,
            RatePair::UsdEur => 0.92,
        }
    }
}

impl Display for RatePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base(), self.quote())
    }
}
