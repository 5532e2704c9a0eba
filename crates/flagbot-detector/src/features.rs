//! DP 사용 특성 추출.

use flagbot_core::{DecimalExt, DecisionPoint, Direction, Price, PriceSeries};

/// DP의 사용 특성을 계산합니다.
///
/// 스윙이 완성된 봉 다음부터 `scan_end`(포함)까지 훑으며, 상승 거래는 저가가,
/// 하락 거래는 고가가 DP 범위 안에 들어온 봉을 셉니다. `length`가 없는 DP는
/// 부모 필드만 채워집니다.
pub fn apply_features(
    dp: &mut DecisionPoint,
    series: &PriceSeries,
    scan_end: usize,
    flag_range: Option<Price>,
    flag_length: Option<i64>,
) {
    dp.parent_length = flag_length;
    if dp.length.is_none() {
        return;
    }

    let (Some(high), Some(low), Some(range)) = (dp.high.price, dp.low.price, dp.range()) else {
        return;
    };
    dp.ratio_to_flag = flag_range.and_then(|fr| range.ratio_to(fr));

    let pivot = dp.high.index.max(dp.low.index).unwrap_or(0);
    let last = scan_end.min(series.len().saturating_sub(1));

    let mut count = 0usize;
    let mut deepest = 0.0f64;
    for bar in series.bars().iter().take(last + 1).skip(pivot + 1) {
        let (touch, depth) = match dp.trade_direction {
            Direction::Bullish => (bar.low, high - bar.low),
            Direction::Bearish => (bar.high, bar.high - low),
            Direction::Undefined => break,
        };
        if touch < low || touch > high {
            continue;
        }
        count += 1;
        if let Some(ratio) = depth.ratio_to(range) {
            deepest = deepest.max(ratio);
        }
    }

    dp.number_used_candle = count;
    dp.used_ratio = deepest;
    dp.is_used_half = deepest >= 0.5;
    // TODO: is_golfed 판정 기준을 확정한 뒤 계산 추가 (현재 항상 false)
    dp.is_golfed = false;
}

/// FTC/EL/MPL 사이의 연관 관계를 설정합니다.
///
/// FTC는 [EL, MPL]을, EL은 [MPL]을 참조합니다. 식별자가 없는 DP는 빠집니다.
pub fn link_related(ftc: &mut DecisionPoint, el: &mut DecisionPoint, mpl: &DecisionPoint) {
    ftc.related_dp_ids = [el.id(), mpl.id()].into_iter().flatten().collect();
    el.related_dp_ids = mpl.id().into_iter().collect();

    ftc.is_related_dp_used = match ftc.trade_direction {
        Direction::Bullish => matches!(
            (ftc.low.price, el.high.price),
            (Some(ftc_low), Some(el_high)) if ftc_low <= el_high
        ),
        Direction::Bearish => matches!(
            (ftc.high.price, el.low.price),
            (Some(ftc_high), Some(el_low)) if ftc_high >= el_low
        ),
        Direction::Undefined => false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use flagbot_core::{Bar, DpKind, EdgePolicy, Point};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn series(values: &[(i64, i64)]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, (h, l))| {
                Bar::new(
                    start + Duration::minutes(i as i64),
                    Decimal::from(*h),
                    Decimal::from(*l),
                )
            })
            .collect();
        PriceSeries::new(bars, EdgePolicy::Exclude).unwrap()
    }

    fn bullish_dp(s: &PriceSeries, low_idx: usize, high_idx: usize) -> DecisionPoint {
        DecisionPoint::from_points(
            DpKind::Ftc,
            Point::new(s.high(high_idx), s.time(high_idx), high_idx),
            Point::new(s.low(low_idx), s.time(low_idx), low_idx),
            Direction::Bullish,
            Direction::Bullish,
        )
    }

    #[test]
    fn test_used_candles_and_ratio() {
        // DP: 저점 100 (idx 1), 고점 120 (idx 2). 이후 저가 115, 108, 125
        let s = series(&[(110, 105), (104, 100), (120, 110), (118, 115), (116, 108), (130, 125)]);
        let mut dp = bullish_dp(&s, 1, 2);
        apply_features(&mut dp, &s, 5, Some(dec!(40)), Some(90));

        assert_eq!(dp.number_used_candle, 2);
        assert!((dp.used_ratio - 0.6).abs() < 1e-9);
        assert!(dp.is_used_half);
        assert_eq!(dp.ratio_to_flag, Some(0.5));
        assert_eq!(dp.parent_length, Some(90));
        assert!(!dp.is_golfed);
    }

    #[test]
    fn test_untouched_dp() {
        let s = series(&[(110, 105), (104, 100), (120, 110), (130, 125)]);
        let mut dp = bullish_dp(&s, 1, 2);
        apply_features(&mut dp, &s, 3, None, None);

        assert_eq!(dp.number_used_candle, 0);
        assert_eq!(dp.used_ratio, 0.0);
        assert!(!dp.is_used_half);
        assert_eq!(dp.ratio_to_flag, None);
    }

    #[test]
    fn test_link_related() {
        let s = series(&[(110, 105), (104, 100), (120, 110), (118, 115)]);
        let mut ftc = bullish_dp(&s, 1, 2);
        let mut el = DecisionPoint::from_points(
            DpKind::El,
            Point::new(dec!(103), s.time(0), 0),
            Point::new(dec!(101), s.time(1), 1),
            Direction::Bullish,
            Direction::Bearish,
        );
        let mpl = DecisionPoint::invalid(DpKind::Mpl, Direction::Bullish, Direction::Bullish);

        link_related(&mut ftc, &mut el, &mpl);

        assert_eq!(ftc.related_dp_ids, vec![el.id().unwrap()]);
        assert!(el.related_dp_ids.is_empty());
        // FTC 저점 100 <= EL 고점 103
        assert!(ftc.is_related_dp_used);
    }
}
