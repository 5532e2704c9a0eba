//! 리스크 비율 속성 테스트.

use flagbot_risk::{kelly_fraction, losing_streak_length, risk_fraction, RiskParams};
use proptest::prelude::*;

fn params_strategy() -> impl Strategy<Value = RiskParams> {
    (1u32..40, 0.0f64..0.2, 0.5f64..0.999, 0.01f64..1.0).prop_map(
        |(trades_daily, dd_daily, confidence, kelly_scale)| RiskParams {
            min_prob: 0.3,
            trades_daily,
            dd_daily,
            confidence,
            kelly_scale,
        },
    )
}

proptest! {
    #[test]
    fn prop_risk_fraction_bounded(
        p in 0.0f64..1.0,
        rr in 0.1f64..10.0,
        params in params_strategy(),
    ) {
        let fraction = risk_fraction(p, rr, &params);
        let cap = (0.005 * params.trades_daily as f64).min(0.0125);

        prop_assert!(fraction >= 0.0);
        prop_assert!(fraction <= cap + 1e-15);
        prop_assert!(fraction <= params.dd_daily + 1e-15);
    }

    #[test]
    fn prop_negative_edge_yields_no_risk(
        p in 0.31f64..0.99,
        rr in 0.1f64..10.0,
        params in params_strategy(),
    ) {
        prop_assume!(p * rr <= 1.0 - p);
        prop_assert!(kelly_fraction(p, rr) <= 0.0);
        prop_assert_eq!(risk_fraction(p, rr, &params), 0.0);
    }

    #[test]
    fn prop_streak_length_within_trades(p in 0.01f64..0.99, trades in 1u32..100, confidence in 0.5f64..0.999) {
        let k = losing_streak_length(p, trades, confidence);
        prop_assert!(k >= 1);
        prop_assert!(k <= trades);
    }
}

#[test]
fn test_streak_risk_binds_when_budget_small() {
    let params = RiskParams {
        min_prob: 0.3,
        trades_daily: 10,
        dd_daily: 0.001,
        confidence: 0.98,
        kelly_scale: 1.0,
    };
    let k = losing_streak_length(0.6, 10, 0.98);
    let fraction = risk_fraction(0.6, 2.0, &params);
    assert!((fraction - 0.001 / f64::from(k)).abs() < 1e-15);
}
