//! 의사결정 포인트 탐지.
//!
//! 하나의 구간 안에서 지배적인 스윙을 찾습니다. 상승 스윙은 가장 낮은 로컬 최저점과
//! 그 이후의 최고가, 하락 스윙은 가장 높은 로컬 최고점과 그 이후의 최저가입니다.
//! 동률이면 항상 마지막 인덱스를 택합니다.

use crate::polarity::Polarity;
use flagbot_core::{DecisionPoint, Direction, DpKind, Point, PriceSeries};
use std::ops::Range;
use tracing::debug;

/// 구간 내 스윙을 탐지해 DP를 생성합니다.
///
/// - `window`: 시리즈 인덱스 구간 (끝 제외). 시리즈 길이를 넘으면 잘립니다.
/// - `swing`: 기하 구조를 찾을 방향. `Undefined`이면 무효 DP.
/// - `trade_direction`: 소속 플래그의 방향.
///
/// 첫 극값 후보에서 구간의 마지막 봉은 제외됩니다.
pub fn detect_swing(
    series: &PriceSeries,
    window: Range<usize>,
    swing: Direction,
    kind: DpKind,
    trade_direction: Direction,
) -> DecisionPoint {
    let invalid = || DecisionPoint::invalid(kind, trade_direction, swing);

    let Some(polarity) = Polarity::of(swing) else {
        return invalid();
    };

    let end = window.end.min(series.len());
    let start = window.start;
    if start + 1 >= end {
        debug!(%kind, start, end, "Window too small for swing");
        return invalid();
    }

    let bars = series.bars();

    // 반대쪽 극값: 상승 스윙이면 가장 낮은 로컬 최저점
    let mut first: Option<usize> = None;
    for k in start..end - 1 {
        if !polarity.opposite().is_anchor(series, k) {
            continue;
        }
        let value = polarity.counter(&bars[k]);
        let replace = first.map_or(true, |best| !polarity.beyond(value, polarity.counter(&bars[best])));
        if replace {
            first = Some(k);
        }
    }

    let Some(first) = first else {
        debug!(%kind, %swing, start, end, "No local extreme in window");
        return invalid();
    };

    // 그 이후의 극점 쪽 최대값
    let mut second: Option<usize> = None;
    for k in first + 1..end {
        let value = polarity.pole(&bars[k]);
        let replace = second.map_or(true, |best| !polarity.beyond(polarity.pole(&bars[best]), value));
        if replace {
            second = Some(k);
        }
    }

    let Some(second) = second else {
        debug!(%kind, %swing, first, "No bars after swing origin");
        return invalid();
    };

    let first_point = Point::new(polarity.counter(&bars[first]), bars[first].time, first);
    let second_point = Point::new(polarity.pole(&bars[second]), bars[second].time, second);

    let (high, low) = match polarity {
        Polarity::Up => (second_point, first_point),
        Polarity::Down => (first_point, second_point),
    };

    let mut dp = DecisionPoint::from_points(kind, high, low, trade_direction, swing);
    dp.enforce_geometry();
    dp
}

/// MPL을 구성합니다.
///
/// 상승 플래그는 {고점 = 플래그 극점, 저점 = EL 고점},
/// 하락 플래그는 {고점 = EL 저점, 저점 = 플래그 극점}입니다.
/// EL 포인트가 없거나 방향이 미정이면 무효입니다.
pub fn build_mpl(direction: Direction, pole: &Point, el: &DecisionPoint) -> DecisionPoint {
    let (high, low) = match direction {
        Direction::Bullish => (pole.clone(), el.high.clone()),
        Direction::Bearish => (el.low.clone(), pole.clone()),
        Direction::Undefined => {
            return DecisionPoint::invalid(DpKind::Mpl, direction, direction);
        }
    };

    if !high.has_identity() || !low.has_identity() {
        return DecisionPoint::invalid(DpKind::Mpl, direction, direction);
    }

    let mut mpl = DecisionPoint::from_points(DpKind::Mpl, high, low, direction, direction);
    mpl.enforce_geometry();
    mpl
}
