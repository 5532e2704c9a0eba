//! 가격 계산을 위한 Decimal 유틸리티.
//!
//! 가격과 거래량은 `Decimal`로, 확률과 비율은 `f64`로 다룹니다.
//! 두 영역이 만나는 지점의 변환은 이 모듈에 모아 둡니다.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// 가격 타입.
pub type Price = Decimal;

/// 거래량(로트) 타입.
pub type Quantity = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// `f64`로 변환합니다. 표현할 수 없으면 `NaN`을 반환합니다.
    fn to_f64_lossy(&self) -> f64;

    /// 후행 0을 제거한 정규화 문자열을 반환합니다 (예: `1.2300` → `"1.23"`).
    fn to_canonical_string(&self) -> String;

    /// 다른 값에 대한 비율을 `f64`로 반환합니다. 분모가 0이면 `None`.
    fn ratio_to(&self, denominator: Decimal) -> Option<f64>;
}

impl DecimalExt for Decimal {
    fn to_f64_lossy(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    fn to_canonical_string(&self) -> String {
        self.normalize().to_string()
    }

    fn ratio_to(&self, denominator: Decimal) -> Option<f64> {
        if denominator.is_zero() {
            return None;
        }
        (*self / denominator).to_f64()
    }
}

/// `f64`를 Decimal로 변환합니다. 유한하지 않은 값은 `None`.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}
