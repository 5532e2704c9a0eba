//! 플래그 탐지 통합 테스트.

use chrono::{Duration, TimeZone, Utc};
use flagbot_core::{Bar, Direction, EdgePolicy, PriceSeries};
use flagbot_detector::FlagDetector;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn build(values: &[(i64, i64)]) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 5, 6, 5, 0, 0).unwrap();
    let bars = values
        .iter()
        .enumerate()
        .map(|(i, (h, l))| {
            Bar::new(
                start + Duration::minutes(15 * i as i64),
                Decimal::from(*h),
                Decimal::from(*l),
            )
        })
        .collect();
    PriceSeries::new(bars, EdgePolicy::Exclude).unwrap()
}

/// 40봉 시나리오: 인덱스 5의 극점(110), 30까지 110 이하 조정, 31에서 돌파.
fn forty_bars() -> Vec<(i64, i64)> {
    let mut v = vec![(100, 95), (101, 97), (106, 99), (108, 103), (107, 102), (110, 104)];
    for i in 6..=30 {
        v.push(if i == 15 { (105, 100) } else { (105, 101) });
    }
    v.push((115, 108));
    for k in 0..8 {
        v.push((120 + k, 116 + k));
    }
    v
}

// ============================================================================
// 40봉 시나리오
// ============================================================================

#[test]
fn test_forty_bar_single_bullish_flag() {
    let series = build(&forty_bars());
    assert_eq!(series.len(), 40);

    let outcome = FlagDetector::default().detect(&series);
    assert_eq!(outcome.flags.len(), 1);

    let flag = &outcome.flags[0];
    assert_eq!(flag.direction, Direction::Bullish);
    assert_eq!(flag.anchor_index, 5);
    assert_eq!(flag.end_index, 31);
    assert_eq!(flag.start_index, 2);
    assert_eq!(flag.pole_point.price, Some(Decimal::from(110)));
    assert_eq!(flag.trough_point.index, Some(15));
    assert_eq!(flag.unique_point, series.time(5));
    assert_eq!(flag.el_start_index, Some(32));
}

#[test]
fn test_forty_bar_decision_points() {
    let series = build(&forty_bars());
    let flag = FlagDetector::default().detect(&series).flags.remove(0);

    // FTC: 극점~돌파 구간 [5, 31]
    let ftc = &flag.ftc;
    assert_eq!(ftc.weight, 1);
    assert_eq!(ftc.low.index, Some(15));
    assert_eq!(ftc.high.index, Some(31));
    assert!(ftc.low.index >= Some(flag.anchor_index));
    assert!(ftc.high.index <= Some(flag.end_index));
    assert_eq!(ftc.first_valid_trade_time, Some(series.time(31)));
    assert!(ftc.is_related_dp_used);
    assert_eq!(ftc.related_dp_ids.len(), 2);

    // EL: 극점 이전 구간, 반대 방향 스윙
    let el = &flag.el;
    assert_eq!(el.weight, 1);
    assert_eq!(el.swing_direction, Direction::Bearish);
    assert_eq!(el.trade_direction, Direction::Bullish);
    assert_eq!(el.high.index, Some(3));
    assert_eq!(el.low.index, Some(4));
    assert!(el.high.index < Some(flag.anchor_index));
    assert_eq!(el.number_used_candle, 2);
    assert_eq!(el.related_dp_ids, vec![flag.mpl.id().unwrap()]);

    // MPL: 극점 ~ EL 고점
    let mpl = &flag.mpl;
    assert_eq!(mpl.weight, 1);
    assert_eq!(mpl.high, flag.pole_point);
    assert_eq!(mpl.low, el.high);
}

#[test]
fn test_detection_is_deterministic() {
    let series = build(&forty_bars());
    let detector = FlagDetector::default();

    let a = serde_json::to_string(&detector.detect(&series).flags).unwrap();
    let b = serde_json::to_string(&detector.detect(&series).flags).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// 속성 테스트
// ============================================================================

fn random_walk() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((-3i64..=3, 0i64..4), 20..120).prop_map(|steps| {
        let mut level = 1000i64;
        steps
            .into_iter()
            .map(|(step, spread)| {
                level += step;
                (level + spread, level)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_active_dps_have_consistent_geometry(values in random_walk()) {
        let series = build(&values);
        for flag in FlagDetector::default().detect(&series).flags {
            prop_assert!(flag.end_index - flag.anchor_index > 15);
            prop_assert!(flag.start_index < flag.anchor_index);
            for dp in flag.decision_points() {
                if dp.is_active() {
                    prop_assert!(dp.has_consistent_geometry());
                    prop_assert!(dp.id().is_some());
                }
            }
        }
    }

    #[test]
    fn prop_detection_deterministic(values in random_walk()) {
        let series = build(&values);
        let detector = FlagDetector::default();
        let a = serde_json::to_string(&detector.detect(&series).flags).unwrap();
        let b = serde_json::to_string(&detector.detect(&series).flags).unwrap();
        prop_assert_eq!(a, b);
    }
}
