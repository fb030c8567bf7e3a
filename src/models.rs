use serde::{Deserialize, Serialize};

/// Response of the NSE `option-chain-indices` endpoint at one point in time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub records: Option<Records>,
}

/// Records section: spot, listed expiries and every strike across all expiries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(rename = "underlyingValue", default)]
    pub underlying_value: Option<f64>,

    #[serde(rename = "expiryDates", default)]
    pub expiry_dates: Vec<String>,

    #[serde(default)]
    pub data: Option<Vec<StrikeRecord>>,
}

/// One strike for one expiry. Records missing either key are kept on the
/// wire and skipped by the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRecord {
    #[serde(rename = "strikePrice", default)]
    pub strike_price: Option<f64>,

    #[serde(rename = "expiryDate", alias = "expiryDates", default)]
    pub expiry_date: Option<String>,

    #[serde(rename = "CE", default)]
    pub call: Option<ContractQuote>,

    #[serde(rename = "PE", default)]
    pub put: Option<ContractQuote>,
}

/// Quote for a call or put leg. Counts are `f64` since NSE sometimes
/// sends them as `1000.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractQuote {
    #[serde(rename = "lastPrice")]
    pub last_price: Option<f64>,

    #[serde(rename = "openInterest")]
    pub open_interest: Option<f64>,

    #[serde(rename = "changeinOpenInterest")]
    pub change_in_oi: Option<f64>,

    #[serde(rename = "totalTradedVolume")]
    pub total_traded_volume: Option<f64>,

    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Option<f64>,

    #[serde(rename = "underlyingValue")]
    pub underlying_value: Option<f64>,
}

impl StrikeRecord {
    /// Strike as shown to users: `23500` for whole strikes, `23512.5` otherwise
    pub fn strike_label(&self) -> String {
        self.strike_price.map(format_number).unwrap_or_default()
    }

    pub fn is_expiry(&self, expiry_date: &str) -> bool {
        self.expiry_date.as_deref() == Some(expiry_date)
    }
}

/// Whole numbers without a fraction, everything else as-is
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

impl ChainSnapshot {
    pub fn underlying_value(&self) -> Option<f64> {
        self.records.as_ref().and_then(|r| r.underlying_value)
    }

    pub fn expiry_dates(&self) -> &[String] {
        self.records
            .as_ref()
            .map(|r| r.expiry_dates.as_slice())
            .unwrap_or(&[])
    }

    /// All strike records, `None` when the response carried no data list
    pub fn strike_records(&self) -> Option<&[StrikeRecord]> {
        self.records
            .as_ref()
            .and_then(|r| r.data.as_deref())
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.records.as_ref().and_then(|r| r.timestamp.as_deref())
    }
}
