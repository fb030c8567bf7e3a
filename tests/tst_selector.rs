use nse_chain_watcher::models::{ChainSnapshot, Records, StrikeRecord};
use nse_chain_watcher::selector::{distinct_strikes, find_atm_strike, select_strikes};

const NEAR: &str = "26-Dec-2024";
const FAR: &str = "02-Jan-2025";

fn record(strike: f64, expiry: &str) -> StrikeRecord {
    StrikeRecord {
        strike_price: Some(strike),
        expiry_date: Some(expiry.to_string()),
        call: None,
        put: None,
    }
}

fn snapshot(spot: Option<f64>, data: Option<Vec<StrikeRecord>>) -> ChainSnapshot {
    ChainSnapshot {
        records: Some(Records {
            timestamp: None,
            underlying_value: spot,
            expiry_dates: vec![NEAR.to_string(), FAR.to_string()],
            data,
        }),
    }
}

/// Strikes 100, 101, ... for the near expiry
fn ladder(from: u32, count: u32) -> Vec<StrikeRecord> {
    (from..from + count).map(|s| record(s as f64, NEAR)).collect()
}

fn strikes_of(records: &[StrikeRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.strike_price).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atm_on_five_point_ladder() {
        let strikes = vec![90.0, 95.0, 100.0, 105.0, 110.0];
        assert_eq!(find_atm_strike(&strikes, 100.0), Some(100.0));
    }

    #[test]
    fn test_atm_exact_match() {
        let strikes = distinct_strikes(&ladder(90, 21));
        assert_eq!(find_atm_strike(&strikes, 100.0), Some(100.0));
    }

    #[test]
    fn test_atm_tie_prefers_lower_strike() {
        let strikes = vec![100.0, 102.0];
        assert_eq!(find_atm_strike(&strikes, 101.0), Some(100.0));
        assert_eq!(find_atm_strike(&strikes, 101.5), Some(102.0));
        assert_eq!(find_atm_strike(&[], 101.0), None);
    }

    #[test]
    fn test_window_around_atm() {
        let snap = snapshot(Some(100.0), Some(ladder(80, 41)));
        let selected = select_strikes(&snap, NEAR, 10);

        assert_eq!(selected.len(), 21);
        assert_eq!(selected.first().and_then(|r| r.strike_price), Some(90.0));
        assert_eq!(selected.last().and_then(|r| r.strike_price), Some(110.0));
    }

    #[test]
    fn test_window_clamped_at_lower_edge() {
        // ATM is the first listed strike: band is indices 0..=10
        let snap = snapshot(Some(99.0), Some(ladder(100, 21)));
        let selected = select_strikes(&snap, NEAR, 10);

        assert_eq!(strikes_of(&selected), (100..=110).map(|s| s as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_clamped_at_upper_edge() {
        let snap = snapshot(Some(500.0), Some(ladder(100, 21)));
        let selected = select_strikes(&snap, NEAR, 3);

        assert_eq!(strikes_of(&selected), vec![117.0, 118.0, 119.0, 120.0]);
    }

    #[test]
    fn test_only_requested_expiry() {
        let data = vec![
            record(100.0, NEAR),
            record(100.0, FAR),
            record(101.0, FAR),
            record(101.0, NEAR),
        ];
        let snap = snapshot(Some(100.0), Some(data));

        let near = select_strikes(&snap, NEAR, 10);
        assert_eq!(near.len(), 2);
        assert!(near.iter().all(|r| r.is_expiry(NEAR)));

        let far = select_strikes(&snap, FAR, 10);
        assert!(far.iter().all(|r| r.is_expiry(FAR)));
        assert!(select_strikes(&snap, "30-Jan-2025", 10).is_empty());
    }

    #[test]
    fn test_band_uses_strikes_of_all_expiries() {
        // 103 only exists for the far expiry but still counts as a band step
        let data = vec![
            record(100.0, NEAR),
            record(101.0, NEAR),
            record(102.0, NEAR),
            record(103.0, FAR),
            record(104.0, NEAR),
        ];
        let snap = snapshot(Some(100.0), Some(data));
        let selected = select_strikes(&snap, NEAR, 3);

        assert_eq!(strikes_of(&selected), vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_keeps_snapshot_order() {
        let data = vec![record(102.0, NEAR), record(100.0, NEAR), record(101.0, NEAR)];
        let snap = snapshot(Some(101.0), Some(data));
        let selected = select_strikes(&snap, NEAR, 10);

        assert_eq!(strikes_of(&selected), vec![102.0, 100.0, 101.0]);
    }

    #[test]
    fn test_empty_when_spot_or_records_missing() {
        assert!(select_strikes(&snapshot(None, Some(ladder(100, 5))), NEAR, 10).is_empty());
        assert!(select_strikes(&snapshot(Some(100.0), None), NEAR, 10).is_empty());
        assert!(select_strikes(&snapshot(Some(100.0), Some(Vec::new())), NEAR, 10).is_empty());
        assert!(select_strikes(&ChainSnapshot::default(), NEAR, 10).is_empty());
    }

    #[test]
    fn test_zero_window_is_atm_only() {
        let snap = snapshot(Some(102.2), Some(ladder(100, 5)));
        let selected = select_strikes(&snap, NEAR, 0);
        assert_eq!(strikes_of(&selected), vec![102.0]);
    }

    #[test]
    fn test_float_counts_still_select() {
        let raw = r#"{
            "records": {
                "expiryDates": ["26-Dec-2024"],
                "underlyingValue": 100.4,
                "data": [
                    {"strikePrice": 100, "expiryDate": "26-Dec-2024",
                     "CE": {"openInterest": 1000.0, "changeinOpenInterest": 5.0, "totalTradedVolume": 20.0},
                     "PE": {"openInterest": 800, "changeinOpenInterest": -3, "totalTradedVolume": 9}},
                    {"strikePrice": 101, "expiryDate": "26-Dec-2024",
                     "CE": {"openInterest": 1500.0}}
                ]
            }
        }"#;

        let snap: ChainSnapshot = serde_json::from_str(raw).unwrap();
        let selected = select_strikes(&snap, NEAR, 10);

        assert_eq!(strikes_of(&selected), vec![100.0, 101.0]);
        let ce = selected[0].call.as_ref().unwrap();
        assert_eq!(ce.open_interest, Some(1000.0));
    }

    #[test]
    fn test_records_without_strike_or_expiry_are_skipped() {
        let raw = r#"{
            "records": {
                "expiryDates": ["26-Dec-2024"],
                "underlyingValue": 100,
                "data": [
                    {"expiryDate": "26-Dec-2024"},
                    {"strikePrice": 100},
                    {"strikePrice": 100, "expiryDate": "26-Dec-2024"},
                    {"strikePrice": 101, "expiryDates": "26-Dec-2024"}
                ]
            }
        }"#;

        let snap: ChainSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap.strike_records().map(|r| r.len()), Some(4));

        let selected = select_strikes(&snap, NEAR, 10);
        assert_eq!(strikes_of(&selected), vec![100.0, 101.0]);
        assert!(selected.iter().all(|r| r.is_expiry(NEAR)));
    }
}
