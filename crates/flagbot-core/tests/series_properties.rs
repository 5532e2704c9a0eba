//! 가격 시리즈 극값 속성 테스트.

use chrono::{Duration, TimeZone, Utc};
use flagbot_core::{Bar, EdgePolicy, PriceSeries};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn build(values: &[(i64, i64)], policy: EdgePolicy) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bars = values
        .iter()
        .enumerate()
        .map(|(i, (low, spread))| {
            Bar::new(
                start + Duration::minutes(i as i64),
                Decimal::from(low + spread),
                Decimal::from(*low),
            )
        })
        .collect();
    PriceSeries::new(bars, policy).unwrap()
}

fn bars_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..50, 0i64..10), 0..60)
}

// ============================================================================
// 극값 정의
// ============================================================================

proptest! {
    #[test]
    fn prop_edges_never_extreme_when_excluded(values in bars_strategy()) {
        let series = build(&values, EdgePolicy::Exclude);
        if let Some(last) = series.len().checked_sub(1) {
            prop_assert!(!series.is_local_max(0));
            prop_assert!(!series.is_local_min(0));
            prop_assert!(!series.is_local_max(last));
            prop_assert!(!series.is_local_min(last));
        }
    }

    #[test]
    fn prop_both_extremes_only_for_outside_bar(values in bars_strategy()) {
        let series = build(&values, EdgePolicy::Exclude);
        for i in 1..series.len().saturating_sub(1) {
            if series.is_local_max(i) && series.is_local_min(i) {
                // 양쪽 이웃을 모두 감싸는 봉
                prop_assert!(series.high(i) > series.high(i - 1));
                prop_assert!(series.high(i) > series.high(i + 1));
                prop_assert!(series.low(i) < series.low(i - 1));
                prop_assert!(series.low(i) < series.low(i + 1));
            }
        }
    }

    #[test]
    fn prop_extend_matches_fresh_build(values in bars_strategy(), split in 0usize..60) {
        let split = split.min(values.len());
        let full = build(&values, EdgePolicy::Exclude);

        let mut partial = build(&values[..split], EdgePolicy::Exclude);
        partial.extend(full.bars()[split..].to_vec());

        prop_assert_eq!(partial, full);
    }
}

#[test]
fn test_adversarial_outside_bar_is_both() {
    // 가운데 봉이 양 이웃의 고가와 저가를 모두 벗어남
    let series = build(&[(10, 2), (5, 20), (10, 2)], EdgePolicy::Exclude);
    assert!(series.is_local_max(1));
    assert!(series.is_local_min(1));
}

#[test]
fn test_wrap_single_bar_is_not_extreme() {
    let series = build(&[(10, 2)], EdgePolicy::Wrap);
    assert!(!series.is_local_max(0));
    assert!(!series.is_local_min(0));
}
