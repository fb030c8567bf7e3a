use nse_chain_watcher::models::{ContractQuote, StrikeRecord};
use nse_chain_watcher::strategy::{decide_option_strategy, OptionSide, PriceBand};

fn quote(ltp: f64, oi: i64, iv: f64, underlying: f64) -> ContractQuote {
    ContractQuote {
        last_price: Some(ltp),
        open_interest: Some(oi as f64),
        change_in_oi: Some(0.0),
        total_traded_volume: Some(0.0),
        implied_volatility: Some(iv),
        underlying_value: Some(underlying),
    }
}

fn record(strike: f64, call: Option<ContractQuote>, put: Option<ContractQuote>) -> StrikeRecord {
    StrikeRecord {
        strike_price: Some(strike),
        expiry_date: Some("26-Dec-2024".to_string()),
        call,
        put,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_fixture() {
        let mut put = quote(40.0, 2000, 30.0, 110.0);
        put.underlying_value = None;
        let filtered = vec![record(100.0, Some(quote(50.0, 1000, 20.0, 110.0)), Some(put))];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.side, OptionSide::Call);
        assert_eq!(rec.strike_price, 100.0);
        assert_eq!(rec.entry_range, PriceBand { min: 49.75, max: 50.25 });
        assert_eq!(rec.stop_loss_range, PriceBand { min: 48.5, max: 49.0 });
        assert_eq!(rec.target_range, PriceBand { min: 52.5, max: 55.0 });
        assert_eq!(rec.score, 20000.0);
    }

    #[test]
    fn test_bullish_call_recommendation() {
        let filtered = vec![record(
            100.0,
            Some(quote(50.0, 1000, 20.0, 105.0)),
            Some(quote(10.0, 5000, 18.0, 105.0)),
        )];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.side, OptionSide::Call);
        assert_eq!(rec.strike_price, 100.0);
        assert_eq!(rec.entry_range, PriceBand { min: 49.75, max: 50.25 });
        assert_eq!(rec.stop_loss_range, PriceBand { min: 48.5, max: 49.0 });
        assert_eq!(rec.target_range, PriceBand { min: 52.5, max: 55.0 });
        assert_eq!(rec.score, 20000.0);
    }

    #[test]
    fn test_bearish_put_recommendation() {
        let filtered = vec![record(
            110.0,
            Some(quote(2.0, 9000, 30.0, 105.0)),
            Some(quote(40.0, 500, 20.0, 105.0)),
        )];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.side, OptionSide::Put);
        assert_eq!(rec.strike_price, 110.0);
        assert_eq!(rec.score, 10000.0);
        assert_eq!(rec.stop_loss_range, PriceBand { min: 40.8, max: 41.2 });
        // Default put target stays inverted: min above max
        assert_eq!(rec.target_range, PriceBand { min: 38.0, max: 36.0 });
    }

    #[test]
    fn test_only_directional_leg_is_scored() {
        // Huge put score is ignored while the market is above the strike
        let filtered = vec![
            record(100.0, Some(quote(5.0, 100, 10.0, 105.0)), Some(quote(1.0, 1_000_000, 50.0, 105.0))),
            record(102.0, Some(quote(4.0, 200, 10.0, 105.0)), Some(quote(1.0, 1_000_000, 50.0, 105.0))),
        ];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.side, OptionSide::Call);
        assert_eq!(rec.strike_price, 102.0);
        assert_eq!(rec.score, 2000.0);
    }

    #[test]
    fn test_score_tie_keeps_first() {
        let filtered = vec![
            record(100.0, Some(quote(5.0, 100, 20.0, 105.0)), Some(quote(1.0, 1, 1.0, 105.0))),
            record(101.0, Some(quote(6.0, 200, 10.0, 105.0)), Some(quote(1.0, 1, 1.0, 105.0))),
        ];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.strike_price, 100.0);
    }

    #[test]
    fn test_empty_set_has_no_recommendation() {
        assert!(decide_option_strategy(&[]).is_none());
    }

    #[test]
    fn test_missing_leg_is_excluded() {
        let filtered = vec![
            record(100.0, Some(quote(50.0, 100_000, 40.0, 105.0)), None),
            record(101.0, Some(quote(40.0, 10, 20.0, 105.0)), Some(quote(1.0, 10, 20.0, 105.0))),
        ];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.strike_price, 101.0);
    }

    #[test]
    fn test_incomplete_quote_is_excluded() {
        let mut ce = quote(50.0, 1000, 20.0, 105.0);
        ce.implied_volatility = None;
        let filtered = vec![record(100.0, Some(ce), Some(quote(10.0, 10, 10.0, 105.0)))];

        assert!(decide_option_strategy(&filtered).is_none());
    }

    #[test]
    fn test_record_without_strike_is_excluded() {
        let mut unpriced = record(0.0, Some(quote(50.0, 100_000, 40.0, 105.0)), Some(quote(1.0, 1, 1.0, 105.0)));
        unpriced.strike_price = None;
        let filtered = vec![
            unpriced,
            record(101.0, Some(quote(40.0, 10, 20.0, 105.0)), Some(quote(1.0, 10, 20.0, 105.0))),
        ];

        let rec = decide_option_strategy(&filtered).unwrap();
        assert_eq!(rec.strike_price, 101.0);
    }

    #[test]
    fn test_price_at_strike_scores_nothing() {
        let filtered = vec![record(
            105.0,
            Some(quote(5.0, 1000, 20.0, 105.0)),
            Some(quote(5.0, 1000, 20.0, 105.0)),
        )];

        assert!(decide_option_strategy(&filtered).is_none());
    }

    #[test]
    fn test_high_and_low_iv_call_targets() {
        let high = vec![record(100.0, Some(quote(100.0, 10, 30.0, 105.0)), Some(quote(1.0, 1, 1.0, 105.0)))];
        let rec = decide_option_strategy(&high).unwrap();
        assert_eq!(rec.target_range, PriceBand { min: 110.0, max: 115.0 });

        let low = vec![record(100.0, Some(quote(100.0, 10, 12.0, 105.0)), Some(quote(1.0, 1, 1.0, 105.0)))];
        let rec = decide_option_strategy(&low).unwrap();
        assert_eq!(rec.target_range, PriceBand { min: 103.0, max: 105.0 });
    }
}
