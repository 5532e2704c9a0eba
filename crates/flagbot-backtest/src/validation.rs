//! 의사결정 포인트 검증 엔진.
//!
//! 같은 시리즈 스냅샷에 대해 여러 DP를 동시에 검증해도 안전한 순수 함수입니다.
//! 한 DP의 결과는 `Tradeable` 또는 (가중치 변경, 결과 라벨) 중 하나입니다.

use flagbot_core::{
    BacktestLabel, DecimalExt, DecisionPoint, Direction, Flag, FlagError, FlagResult, Price,
    PriceSeries, WeightUpdate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 단일 DP 검증 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// 이미 비활성 상태라 검증하지 않음
    Skipped,
    /// 아직 가격에 닿지 않아 거래 가능
    Tradeable(String),
    /// 가격에 닿아 소진됨
    Invalidated {
        update: WeightUpdate,
        label: BacktestLabel,
    },
}

/// 검증 실패 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFaultRecord {
    pub dp_id: String,
    pub reason: String,
}

/// 한 사이클의 검증 결과 모음.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// 거래 가능한 DP 식별자
    pub tradeable: Vec<String>,
    /// 가중치 변경 목록
    pub weight_updates: Vec<WeightUpdate>,
    /// 백테스트 결과 라벨
    pub labels: Vec<BacktestLabel>,
    /// 개별 DP 검증 실패
    pub faults: Vec<ValidationFaultRecord>,
}

impl ValidationReport {
    /// 단일 DP 결과를 병합합니다.
    pub fn absorb(&mut self, result: FlagResult<ValidationOutcome>) {
        match result {
            Ok(ValidationOutcome::Skipped) => {}
            Ok(ValidationOutcome::Tradeable(id)) => self.tradeable.push(id),
            Ok(ValidationOutcome::Invalidated { update, label }) => {
                self.weight_updates.push(update);
                self.labels.push(label);
            }
            Err(FlagError::ValidationFault { dp_id, reason }) => {
                warn!(%dp_id, %reason, "DP validation fault");
                self.faults.push(ValidationFaultRecord { dp_id, reason });
            }
            Err(other) => {
                warn!(error = %other, "DP validation failed");
                self.faults.push(ValidationFaultRecord {
                    dp_id: String::new(),
                    reason: other.to_string(),
                });
            }
        }
    }

    /// 다른 보고서를 뒤에 이어 붙입니다.
    pub fn merge(&mut self, other: ValidationReport) {
        self.tradeable.extend(other.tradeable);
        self.weight_updates.extend(other.weight_updates);
        self.labels.extend(other.labels);
        self.faults.extend(other.faults);
    }

    pub fn is_empty(&self) -> bool {
        self.tradeable.is_empty()
            && self.weight_updates.is_empty()
            && self.labels.is_empty()
            && self.faults.is_empty()
    }
}

/// 검증에 필요한 DP 기하 정보.
struct Geometry {
    id: String,
    high: Price,
    low: Price,
    range: Price,
    direction: Direction,
}

fn geometry(dp: &DecisionPoint) -> FlagResult<Geometry> {
    let fault = |dp_id: String, reason: &str| FlagError::ValidationFault {
        dp_id,
        reason: reason.to_string(),
    };

    let id = dp
        .id()
        .ok_or_else(|| fault(format!("{}:<none>", dp.kind), "missing point identity"))?;
    let (Some(high), Some(low)) = (dp.high.price, dp.low.price) else {
        return Err(fault(id, "missing price"));
    };
    let range = high - low;
    if range <= Price::ZERO {
        return Err(fault(id, "non-positive range"));
    }
    if !dp.trade_direction.is_defined() {
        return Err(fault(id, "undefined trade direction"));
    }

    Ok(Geometry {
        id,
        high,
        low,
        range,
        direction: dp.trade_direction,
    })
}

/// `from` 인덱스부터 진입/손절을 찾아 보상 비율을 계산합니다.
///
/// 진입이 없으면 `None`. 진입 이후 스캔 구간이 비면 보상은 -1입니다.
fn scan_reward(geo: &Geometry, series: &PriceSeries, from: usize) -> Option<(usize, f64)> {
    let bars = series.bars();
    let n = bars.len();

    let (entry, stop) = match geo.direction {
        Direction::Bearish => {
            let entry = (from..n).find(|&k| bars[k].high >= geo.low)?;
            let stop = (entry..n).find(|&k| bars[k].high >= geo.high);
            (entry, stop)
        }
        _ => {
            let entry = (from..n).find(|&k| bars[k].low <= geo.high)?;
            let stop = (entry..n).find(|&k| bars[k].low <= geo.low);
            (entry, stop)
        }
    };

    let window = &bars[entry..stop.unwrap_or(n)];
    let reward = match geo.direction {
        Direction::Bearish => window
            .iter()
            .map(|b| b.low)
            .min()
            .and_then(|best| (geo.high - best).ratio_to(geo.range)),
        _ => window
            .iter()
            .map(|b| b.high)
            .max()
            .and_then(|best| (best - geo.high).ratio_to(geo.range)),
    }
    .unwrap_or(-1.0);

    Some((entry, reward))
}

/// 단일 DP를 검증합니다.
///
/// 비활성 DP는 `Skipped`. 식별자/범위/방향이 없으면 `ValidationFault`.
pub fn validate_dp(dp: &DecisionPoint, series: &PriceSeries) -> FlagResult<ValidationOutcome> {
    if !dp.is_active() {
        return Ok(ValidationOutcome::Skipped);
    }

    let geo = geometry(dp)?;
    let valid_from = dp.first_valid_trade_time.ok_or_else(|| FlagError::ValidationFault {
        dp_id: geo.id.clone(),
        reason: "missing first valid trade time".to_string(),
    })?;

    let Some(from) = series.first_index_after(valid_from) else {
        return Ok(ValidationOutcome::Tradeable(geo.id));
    };

    match scan_reward(&geo, series, from) {
        None => Ok(ValidationOutcome::Tradeable(geo.id)),
        Some((entry, reward)) => {
            debug!(dp_id = %geo.id, entry, reward, "DP consumed by price");
            Ok(ValidationOutcome::Invalidated {
                update: WeightUpdate {
                    dp_id: geo.id.clone(),
                    weight: 0,
                },
                label: BacktestLabel {
                    dp_id: geo.id,
                    kind: dp.kind,
                    trade_direction: dp.trade_direction,
                    reward,
                    flag_weight: dp.parent_weight,
                },
            })
        }
    }
}

/// 여러 DP를 순서대로 검증해 하나의 보고서로 병합합니다.
pub fn validate_all<'a>(
    dps: impl IntoIterator<Item = &'a DecisionPoint>,
    series: &PriceSeries,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    for dp in dps {
        report.absorb(validate_dp(dp, series));
    }
    report
}

/// 플래그 EL 구간 시작 봉부터 측정한 EL 반응.
///
/// EL 구간이 정의되지 않았거나 EL이 무효이거나 가격이 닿지 않았으면 `None`.
pub fn el_reaction(flag: &Flag, series: &PriceSeries) -> Option<f64> {
    let from = flag.el_start_index?;
    if !flag.el.is_active() {
        return None;
    }
    let geo = geometry(&flag.el).ok()?;
    scan_reward(&geo, series, from).map(|(_, reward)| reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use flagbot_core::{Bar, DpKind, EdgePolicy, Point};
    use rust_decimal::Decimal;

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

    /// 고점 110, 저점 100, 인덱스 1 이후부터 유효한 DP.
    fn dp(s: &PriceSeries, direction: Direction) -> DecisionPoint {
        let mut dp = DecisionPoint::from_points(
            DpKind::Ftc,
            Point::new(Decimal::from(110), s.time(0), 0),
            Point::new(Decimal::from(100), s.time(0) - Duration::minutes(5), 0),
            direction,
            direction,
        );
        dp.first_valid_trade_time = Some(s.time(1));
        dp.parent_weight = 2.0;
        dp
    }

    #[test]
    fn test_tradeable_when_not_reached() {
        let s = series(&[(120, 112), (125, 115), (126, 116), (124, 111)]);
        let result = validate_dp(&dp(&s, Direction::Bullish), &s).unwrap();
        assert!(matches!(result, ValidationOutcome::Tradeable(_)));
    }

    #[test]
    fn test_tradeable_when_no_bars_after() {
        let s = series(&[(120, 112), (125, 115)]);
        let d = dp(&s, Direction::Bullish);
        // 인덱스 1 이후 봉이 없음
        assert!(matches!(
            validate_dp(&d, &s).unwrap(),
            ValidationOutcome::Tradeable(_)
        ));
    }

    #[test]
    fn test_bullish_consumed_with_reward() {
        // 인덱스 3에서 진입 (저가 109 <= 110), 이후 최고가 125, 손절 없음
        let s = series(&[(120, 112), (125, 115), (118, 112), (115, 109), (125, 112), (121, 111)]);
        let result = validate_dp(&dp(&s, Direction::Bullish), &s).unwrap();

        let ValidationOutcome::Invalidated { update, label } = result else {
            panic!("expected invalidation");
        };
        assert_eq!(update.weight, 0);
        assert_eq!(update.dp_id, label.dp_id);
        assert!((label.reward - 1.5).abs() < 1e-12);
        assert_eq!(label.flag_weight, 2.0);
    }

    #[test]
    fn test_bullish_stop_limits_window() {
        // 진입 3, 손절 5 (저가 99). 구간 [3,5)의 최고가 118
        let s = series(&[(120, 112), (125, 115), (118, 112), (115, 109), (118, 105), (130, 99)]);
        let ValidationOutcome::Invalidated { label, .. } =
            validate_dp(&dp(&s, Direction::Bullish), &s).unwrap()
        else {
            panic!("expected invalidation");
        };
        assert!((label.reward - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_reward_is_minus_one() {
        // 진입 봉이 곧바로 손절 조건도 만족
        let s = series(&[(120, 112), (125, 115), (112, 95)]);
        let ValidationOutcome::Invalidated { label, .. } =
            validate_dp(&dp(&s, Direction::Bullish), &s).unwrap()
        else {
            panic!("expected invalidation");
        };
        assert_eq!(label.reward, -1.0);
    }

    #[test]
    fn test_bearish_label_from_stop_boundary() {
        // 진입 3 (고가 101 >= 100), 이후 최저가 85, 손절 없음
        let s = series(&[(98, 90), (95, 88), (97, 92), (101, 93), (96, 85), (99, 90)]);
        let ValidationOutcome::Invalidated { label, .. } =
            validate_dp(&dp(&s, Direction::Bearish), &s).unwrap()
        else {
            panic!("expected invalidation");
        };
        // (110 - 85) / 10
        assert!((label.reward - 2.5).abs() < 1e-12);
        assert_eq!(label.trade_direction, Direction::Bearish);
    }

    #[test]
    fn test_inactive_skipped() {
        let s = series(&[(120, 112), (125, 115), (112, 95)]);
        let mut d = dp(&s, Direction::Bullish);
        d.mark_consumed();
        assert_eq!(validate_dp(&d, &s).unwrap(), ValidationOutcome::Skipped);
    }

    #[test]
    fn test_missing_identity_is_fault() {
        let s = series(&[(120, 112), (125, 115)]);
        let mut d = dp(&s, Direction::Bullish);
        d.low.time = None;
        assert!(matches!(
            validate_dp(&d, &s),
            Err(FlagError::ValidationFault { .. })
        ));
    }

    #[test]
    fn test_validate_all_partitions_and_collects_faults() {
        let s = series(&[(120, 112), (125, 115), (118, 112), (115, 109), (125, 112), (121, 111)]);
        let consumed = dp(&s, Direction::Bullish);
        let mut untouched = dp(&s, Direction::Bullish);
        untouched.high.price = Some(Decimal::from(105));
        untouched.low.price = Some(Decimal::from(95));
        let mut broken = dp(&s, Direction::Bullish);
        broken.high.price = Some(Decimal::from(100));

        let report = validate_all([&consumed, &untouched, &broken], &s);
        assert_eq!(report.tradeable, vec![untouched.id().unwrap()]);
        assert_eq!(report.weight_updates.len(), 1);
        assert_eq!(report.labels.len(), 1);
        assert_eq!(report.faults.len(), 1);
    }
}
