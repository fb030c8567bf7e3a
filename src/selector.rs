use crate::models::{ChainSnapshot, StrikeRecord};
use tracing::{debug, info};

/// Records for `expiry_date` whose strike lies within `window` listed strikes of ATM.
///
/// The neighborhood is computed over the distinct strikes of *all* expiries,
/// so the band does not depend on which expiry is selected. Output keeps the
/// snapshot order. Records without a strike or an expiry are skipped.
/// Returns an empty set when the snapshot has no records or no spot price.
pub fn select_strikes(
    snapshot: &ChainSnapshot,
    expiry_date: &str,
    window: usize,
) -> Vec<StrikeRecord> {
    let (Some(records), Some(spot_price)) = (snapshot.strike_records(), snapshot.underlying_value())
    else {
        debug!("Snapshot has no records or spot price, nothing to select");
        return Vec::new();
    };

    // Step 1: Sorted distinct strikes across every expiry
    let strikes = distinct_strikes(records);

    // Step 2: ATM strike and its index
    let Some(atm_index) = find_atm_index(&strikes, spot_price) else {
        return Vec::new();
    };
    let atm_strike = strikes[atm_index];
    info!(spot_price, atm_strike, "Spot Price: {}, ATM Strike Price: {}", spot_price, atm_strike);

    // Step 3: Clamp the band to the listed range
    let (start, end) = band_bounds(atm_index, window, strikes.len());
    let (low, high) = (strikes[start], strikes[end]);

    // Step 4: Stable filter on expiry and band
    records
        .iter()
        .filter(|r| {
            r.is_expiry(expiry_date)
                && r.strike_price.is_some_and(|strike| strike >= low && strike <= high)
        })
        .cloned()
        .collect()
}

/// Sorted, de-duplicated strike prices
pub fn distinct_strikes(records: &[StrikeRecord]) -> Vec<f64> {
    let mut strikes: Vec<f64> = records
        .iter()
        .filter_map(|r| r.strike_price)
        .filter(|s| !s.is_nan())
        .collect();
    strikes.sort_by(|a, b| a.total_cmp(b));
    strikes.dedup();
    strikes
}

/// Find ATM strike (closest to spot, prefer floor on exact ties)
pub fn find_atm_strike(sorted_strikes: &[f64], spot_price: f64) -> Option<f64> {
    find_atm_index(sorted_strikes, spot_price).map(|idx| sorted_strikes[idx])
}

fn find_atm_index(sorted_strikes: &[f64], spot_price: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, &strike) in sorted_strikes.iter().enumerate() {
        let distance = (strike - spot_price).abs();

        // Strictly closer only, so the lower strike keeps an exact tie
        match best {
            Some((_, min_distance)) if distance >= min_distance => {}
            _ if distance.is_nan() => {}
            _ => best = Some((idx, distance)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Inclusive index range `[atm - window, atm + window]` clamped to `[0, len - 1]`
fn band_bounds(atm_index: usize, window: usize, len: usize) -> (usize, usize) {
    let start = atm_index.saturating_sub(window);
    let end = atm_index.saturating_add(window).min(len - 1);
    (start, end)
}
