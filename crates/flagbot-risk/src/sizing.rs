//! 거래당 리스크 비율과 로트 크기 계산.
//!
//! 리스크 비율은 두 값 중 작은 쪽입니다:
//! - 일일 드로다운 예산 / 신뢰 수준에서의 최악 연속 손실 길이
//! - 축소된 켈리 비율 (상한 `min(0.005·N, 0.0125)`)

use crate::error::{SizingError, SizingResult};
use flagbot_core::{decimal_from_f64, Price, Quantity, RiskConfig, SymbolSpec};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 리스크 비율 계산 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    /// 이 확률 이하이면 거래하지 않음
    pub min_prob: f64,
    /// 일일 예상 거래 수 (N)
    pub trades_daily: u32,
    /// 일일 드로다운 예산 (D)
    pub dd_daily: f64,
    /// 연속 손실 신뢰 수준
    pub confidence: f64,
    /// 켈리 축소 계수
    pub kelly_scale: f64,
}

impl RiskParams {
    /// 설정에서 파라미터를 만듭니다.
    pub fn from_config(config: &RiskConfig) -> Self {
        Self {
            min_prob: config.min_prob,
            trades_daily: config.max_trades_daily,
            dd_daily: config.dd_daily(),
            confidence: config.confidence,
            kelly_scale: config.kelly_scale,
        }
    }

    /// 켈리 리스크 상한.
    pub fn max_kelly_risk(&self) -> f64 {
        (0.005 * self.trades_daily as f64).min(0.0125)
    }
}

impl Default for RiskParams {
    fn default() -> Self {
        Self::from_config(&RiskConfig::default())
    }
}

/// 신뢰 수준에서 허용되는 최악의 연속 손실 길이를 이진 탐색으로 구합니다.
///
/// `N`번의 거래 중 길이 `k` 이상의 연속 손실이 나올 확률의 근사
/// `1 − exp((N−k+1)·ln(1 − (1−p)^k))`가 `1 − confidence` 이하가 되는 가장 작은 `k`.
/// 계산이 유한하지 않으면 확률 1로 취급합니다.
pub fn losing_streak_length(p: f64, trades: u32, confidence: f64) -> u32 {
    let alpha = 1.0 - confidence;
    let (mut low, mut high) = (1u32, trades.max(1));

    while low < high {
        let mid = (low + high) / 2;
        let inner = (1.0 - p).powi(mid as i32);
        let log_prob = f64::from(trades - mid + 1) * (-inner).ln_1p();
        let streak_prob = if log_prob.is_finite() {
            1.0 - log_prob.exp()
        } else {
            1.0
        };

        if streak_prob <= alpha {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    low
}

/// 켈리 비율 `μ/σ²`. 분산이 0이면 0.
pub fn kelly_fraction(p: f64, rr: f64) -> f64 {
    let q = 1.0 - p;
    let mu = p * rr - q;
    let sigma2 = p * (rr - mu).powi(2) + q * (-1.0 - mu).powi(2);
    if sigma2 == 0.0 {
        0.0
    } else {
        mu / sigma2
    }
}

/// 거래당 리스크 비율 (잔고 대비, 0.01 = 1%).
///
/// `N < 1`, `p ≤ min_prob`, `p ≥ 1`이면 0을 반환합니다.
pub fn risk_fraction(p: f64, rr: f64, params: &RiskParams) -> f64 {
    if params.trades_daily < 1 || !p.is_finite() || p <= params.min_prob || p >= 1.0 {
        return 0.0;
    }

    let streak = losing_streak_length(p, params.trades_daily, params.confidence);
    let streak_risk = params.dd_daily / f64::from(streak);

    let kelly = kelly_fraction(p, rr);
    let kelly_risk = (params.kelly_scale * kelly)
        .min(params.max_kelly_risk())
        .max(0.0);

    let fraction = kelly_risk.min(streak_risk);
    debug!(p, rr, streak, streak_risk, kelly, kelly_risk, fraction, "Risk fraction computed");
    fraction
}

/// 리스크 퍼센트에 맞는 로트 크기를 계산합니다.
///
/// `volume = (risk_pct/100 · balance) / (|entry − stop| / tick_size · tick_value)`를
/// 거래량 단위로 반올림한 뒤 `[volume_min, volume_max]`로 자릅니다.
pub fn lot_size(
    entry: Price,
    stop: Price,
    risk_pct: f64,
    balance: Decimal,
    spec: &SymbolSpec,
) -> SizingResult<Quantity> {
    if spec.tick_size.is_zero() {
        return Err(SizingError::ZeroTickSize(spec.symbol.clone()));
    }
    if spec.tick_value.is_zero() {
        return Err(SizingError::ZeroTickValue(spec.symbol.clone()));
    }
    if spec.volume_step.is_zero() {
        return Err(SizingError::ZeroVolumeStep(spec.symbol.clone()));
    }

    let distance = (entry - stop).abs();
    if distance.is_zero() {
        return Err(SizingError::ZeroStopDistance);
    }

    let loss_per_lot = distance / spec.tick_size * spec.tick_value;
    if loss_per_lot.is_zero() {
        return Err(SizingError::ZeroLossPerLot);
    }

    let risk_pct = decimal_from_f64(risk_pct)
        .filter(|r| !r.is_sign_negative())
        .ok_or_else(|| SizingError::InvalidRisk(risk_pct.to_string()))?;
    let risk_amount = risk_pct / Decimal::ONE_HUNDRED * balance;

    let raw = risk_amount / loss_per_lot;
    let stepped = (raw / spec.volume_step).round() * spec.volume_step;
    let volume = stepped.min(spec.volume_max).max(spec.volume_min);

    debug!(
        symbol = %spec.symbol,
        %risk_amount,
        %loss_per_lot,
        %raw,
        %volume,
        "Lot size computed"
    );
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eurusd() -> SymbolSpec {
        SymbolSpec {
            symbol: "EURUSD".to_string(),
            tick_size: dec!(0.00001),
            tick_value: dec!(1),
            volume_min: dec!(0.01),
            volume_max: dec!(100),
            volume_step: dec!(0.01),
        }
    }

    fn params() -> RiskParams {
        RiskParams {
            min_prob: 0.35,
            trades_daily: 5,
            dd_daily: 0.01,
            confidence: 0.98,
            kelly_scale: 0.1,
        }
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        let p = params();
        assert_eq!(risk_fraction(0.35, 2.0, &p), 0.0);
        assert_eq!(risk_fraction(1.0, 2.0, &p), 0.0);
        assert_eq!(risk_fraction(f64::NAN, 2.0, &p), 0.0);
        let none = RiskParams {
            trades_daily: 0,
            ..p
        };
        assert_eq!(risk_fraction(0.6, 2.0, &none), 0.0);
    }

    #[test]
    fn test_streak_length_monotone_in_probability() {
        let weak = losing_streak_length(0.4, 20, 0.98);
        let strong = losing_streak_length(0.8, 20, 0.98);
        assert!(weak >= strong);
        assert!(strong >= 1);
        assert!(weak <= 20);
    }

    #[test]
    fn test_kelly_fraction_values() {
        // p=0.5, RR=2: μ=0.5, σ²=0.5·2.25+0.5·2.25=2.25
        assert!((kelly_fraction(0.5, 2.0) - 0.5 / 2.25).abs() < 1e-12);
        assert!(kelly_fraction(0.3, 1.0) < 0.0);
    }

    #[test]
    fn test_risk_fraction_capped_by_kelly_max() {
        let p = RiskParams {
            dd_daily: 1.0,
            kelly_scale: 1.0,
            ..params()
        };
        let fraction = risk_fraction(0.9, 3.0, &p);
        assert!((fraction - 0.0125).abs() < 1e-12);
    }

    #[test]
    fn test_lot_size_basic() {
        // 손절 200틱 → 로트당 손실 200, 리스크 1% of 10000 = 100
        let volume = lot_size(dec!(1.10000), dec!(1.09800), 1.0, dec!(10000), &eurusd()).unwrap();
        assert_eq!(volume, dec!(0.5));
    }

    #[test]
    fn test_lot_size_clamped() {
        let tiny = lot_size(dec!(1.10000), dec!(1.09800), 0.01, dec!(10000), &eurusd()).unwrap();
        assert_eq!(tiny, dec!(0.01));

        let huge = lot_size(dec!(1.10000), dec!(1.09999), 50.0, dec!(10000000), &eurusd()).unwrap();
        assert_eq!(huge, dec!(100));
    }

    #[test]
    fn test_lot_size_errors() {
        let mut spec = eurusd();
        assert_eq!(
            lot_size(dec!(1.1), dec!(1.1), 1.0, dec!(1000), &spec),
            Err(SizingError::ZeroStopDistance)
        );

        spec.tick_size = Decimal::ZERO;
        assert!(matches!(
            lot_size(dec!(1.1), dec!(1.0), 1.0, dec!(1000), &spec),
            Err(SizingError::ZeroTickSize(_))
        ));

        let mut spec = eurusd();
        spec.tick_value = Decimal::ZERO;
        assert!(matches!(
            lot_size(dec!(1.1), dec!(1.0), 1.0, dec!(1000), &spec),
            Err(SizingError::ZeroTickValue(_))
        ));
    }
}
