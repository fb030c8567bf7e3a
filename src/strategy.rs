use crate::models::{ContractQuote, StrikeRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// IV above this widens the target band
pub const HIGH_IV_THRESHOLD: f64 = 25.0;
/// IV below this narrows the target band
pub const LOW_IV_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionSide {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionSide {
    pub fn code(&self) -> &'static str {
        match self {
            OptionSide::Call => "CE",
            OptionSide::Put => "PE",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Price band as `(min, max)`. Not guaranteed ascending: the put default
/// target is `[LTP×0.95, LTP×0.90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    fn from_ltp(ltp: f64, min_factor: f64, max_factor: f64) -> Self {
        Self {
            min: round2(ltp * min_factor),
            max: round2(ltp * max_factor),
        }
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2}-{:.2}", self.min, self.max)
    }
}

/// The single contract picked from a filtered set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub side: OptionSide,
    pub strike_price: f64,
    pub entry_range: PriceBand,
    pub stop_loss_range: PriceBand,
    pub target_range: PriceBand,
    /// Open interest × implied volatility of the winning leg
    pub score: f64,
    pub last_price: f64,
    pub implied_volatility: f64,
}

/// Leg values the scorer needs; all three must be present
#[derive(Debug, Clone, Copy)]
struct ScoredLeg {
    last_price: f64,
    implied_volatility: f64,
    score: f64,
}

impl ScoredLeg {
    fn from_quote(quote: &ContractQuote) -> Option<Self> {
        let last_price = quote.last_price?;
        let open_interest = quote.open_interest?;
        let implied_volatility = quote.implied_volatility?;

        Some(Self {
            last_price,
            implied_volatility,
            score: open_interest * implied_volatility,
        })
    }
}

/// Pick the best call or put by OI × IV, gated by market direction.
///
/// A record participates only when both legs carry LTP, OI and IV. The call
/// leg's echoed underlying value is the current price: above the strike
/// scores the call, below scores the put, equal scores nothing. The running
/// best is replaced only by a strictly greater score.
pub fn decide_option_strategy(filtered: &[StrikeRecord]) -> Option<Recommendation> {
    let mut best: Option<Recommendation> = None;

    for record in filtered {
        let (Some(ce), Some(pe)) = (&record.call, &record.put) else {
            continue;
        };
        let (Some(ce_leg), Some(pe_leg)) = (ScoredLeg::from_quote(ce), ScoredLeg::from_quote(pe))
        else {
            continue;
        };

        let Some(current_price) = ce.underlying_value else {
            continue;
        };
        let Some(strike) = record.strike_price else {
            continue;
        };

        let (side, leg) = if current_price > strike {
            // Bullish, focus on CE
            (OptionSide::Call, ce_leg)
        } else if current_price < strike {
            // Bearish, focus on PE
            (OptionSide::Put, pe_leg)
        } else {
            continue;
        };

        let beats_best = match &best {
            Some(current) => leg.score > current.score,
            None => !leg.score.is_nan(),
        };

        if beats_best {
            best = Some(build_recommendation(side, strike, leg));
        }
    }

    best
}

fn build_recommendation(side: OptionSide, strike_price: f64, leg: ScoredLeg) -> Recommendation {
    let ltp = leg.last_price;
    let iv = leg.implied_volatility;

    Recommendation {
        side,
        strike_price,
        entry_range: PriceBand::from_ltp(ltp, 0.995, 1.005),
        stop_loss_range: stop_loss_band(side, ltp),
        target_range: target_band(side, ltp, iv),
        score: leg.score,
        last_price: ltp,
        implied_volatility: iv,
    }
}

fn stop_loss_band(side: OptionSide, ltp: f64) -> PriceBand {
    match side {
        OptionSide::Call => PriceBand::from_ltp(ltp, 0.97, 0.98),
        OptionSide::Put => PriceBand::from_ltp(ltp, 1.02, 1.03),
    }
}

fn target_band(side: OptionSide, ltp: f64, iv: f64) -> PriceBand {
    let (min_factor, max_factor) = match side {
        OptionSide::Call if iv > HIGH_IV_THRESHOLD => (1.10, 1.15),
        OptionSide::Call if iv < LOW_IV_THRESHOLD => (1.03, 1.05),
        OptionSide::Call => (1.05, 1.10),
        OptionSide::Put if iv > HIGH_IV_THRESHOLD => (0.90, 0.85),
        OptionSide::Put if iv < LOW_IV_THRESHOLD => (0.98, 0.95),
        OptionSide::Put => (0.95, 0.90),
    };
    PriceBand::from_ltp(ltp, min_factor, max_factor)
}

/// Round half away from zero to 2 decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
