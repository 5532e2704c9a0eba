//! 의사결정 포인트 (FTC / EL / MPL).
//!
//! 각 DP는 하나의 플래그에 속하며 탐지 시 한 번 생성됩니다.
//! 생성 이후에는 가중치와 백테스트 결과 필드만 변경됩니다.

use super::{Direction, Point};
use crate::types::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 의사결정 포인트 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DpKind {
    /// First-Trade-Confirmation
    #[serde(rename = "FTC")]
    Ftc,
    /// Entry-Level
    #[serde(rename = "EL")]
    El,
    /// Mid-Point-Level
    #[serde(rename = "MPL")]
    Mpl,
}

impl DpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DpKind::Ftc => "FTC",
            DpKind::El => "EL",
            DpKind::Mpl => "MPL",
        }
    }
}

impl fmt::Display for DpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 의사결정 포인트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPoint {
    /// 종류
    pub kind: DpKind,
    /// 고점
    pub high: Point,
    /// 저점
    pub low: Point,
    /// 1 = 가격 미접촉, 0 = 무효화/소진
    pub weight: u8,
    /// 거래 방향 (소속 플래그의 방향)
    pub trade_direction: Direction,
    /// 기하 구조를 탐지할 때 사용한 방향 (EL은 플래그의 반대 방향)
    pub swing_direction: Direction,
    /// 이 시각 이후의 봉부터 거래 및 검증 대상
    pub first_valid_trade_time: Option<DateTime<Utc>>,
    /// 고점과 저점 사이 분
    pub length: Option<i64>,
    /// DP 범위 / 플래그 범위
    pub ratio_to_flag: Option<f64>,
    /// 범위 안으로 들어온 봉 수
    pub number_used_candle: usize,
    /// 가장 깊은 침투 깊이 / DP 범위
    pub used_ratio: f64,
    /// 연관 DP가 이미 사용되었는지
    pub is_related_dp_used: bool,
    pub is_golfed: bool,
    /// `used_ratio >= 0.5`
    pub is_used_half: bool,
    /// 소속 플래그의 길이 (분)
    pub parent_length: Option<i64>,
    /// 소속 플래그의 가중치
    pub parent_weight: f64,
    /// 연관 DP 식별자 (0~2개)
    pub related_dp_ids: Vec<String>,
    /// 백테스트로 실현된 최대 보상 비율
    pub backtest_reward: Option<f64>,
}

impl DecisionPoint {
    /// 무효(가중치 0) DP를 생성합니다.
    pub fn invalid(kind: DpKind, trade_direction: Direction, swing_direction: Direction) -> Self {
        Self {
            kind,
            high: Point::empty(),
            low: Point::empty(),
            weight: 0,
            trade_direction,
            swing_direction,
            first_valid_trade_time: None,
            length: None,
            ratio_to_flag: None,
            number_used_candle: 0,
            used_ratio: 0.0,
            is_related_dp_used: false,
            is_golfed: false,
            is_used_half: false,
            parent_length: None,
            parent_weight: 0.0,
            related_dp_ids: Vec::new(),
            backtest_reward: None,
        }
    }

    /// 고점과 저점으로 활성 DP를 생성합니다.
    pub fn from_points(
        kind: DpKind,
        high: Point,
        low: Point,
        trade_direction: Direction,
        swing_direction: Direction,
    ) -> Self {
        let length = match (high.time, low.time) {
            (Some(h), Some(l)) => Some((h - l).num_minutes().abs()),
            _ => None,
        };
        Self {
            high,
            low,
            weight: 1,
            length,
            ..Self::invalid(kind, trade_direction, swing_direction)
        }
    }

    /// 결정적 식별자 `"{kind}:{high_id}:{low_id}"`.
    ///
    /// 고점과 저점이 모두 식별자를 가질 때만 존재합니다.
    pub fn id(&self) -> Option<String> {
        let high = self.high.id()?;
        let low = self.low.id()?;
        Some(format!("{}:{}:{}", self.kind, high, low))
    }

    /// 아직 가격에 의해 소진되지 않았는지 확인합니다.
    pub fn is_active(&self) -> bool {
        self.weight > 0
    }

    /// 고점 가격 - 저점 가격.
    pub fn range(&self) -> Option<Price> {
        Some(self.high.price? - self.low.price?)
    }

    /// 고점/저점 인덱스 순서가 탐지 방향과 일치하는지 확인합니다.
    ///
    /// 상승 스윙은 저점 뒤에 고점이, 하락 스윙은 고점 뒤에 저점이 와야 합니다.
    pub fn has_consistent_geometry(&self) -> bool {
        let (Some(high), Some(low)) = (self.high.index, self.low.index) else {
            return false;
        };
        match self.swing_direction {
            Direction::Bullish => high > low,
            Direction::Bearish => low > high,
            Direction::Undefined => false,
        }
    }

    /// 기하 조건이 맞지 않으면 가중치를 0으로 만듭니다.
    pub fn enforce_geometry(&mut self) {
        if self.weight > 0 && !self.has_consistent_geometry() {
            self.weight = 0;
        }
    }

    /// 가격에 의해 소진되었음을 표시합니다.
    pub fn mark_consumed(&mut self) {
        self.weight = 0;
    }
}

/// 가중치 변경 (저장소로 전달).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightUpdate {
    pub dp_id: String,
    pub weight: u8,
}

/// 소진된 DP의 백테스트 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestLabel {
    /// DP 식별자
    pub dp_id: String,
    /// DP 종류
    pub kind: DpKind,
    /// 거래 방향
    pub trade_direction: Direction,
    /// 실현된 최대 보상 비율 (스캔 구간이 비면 -1)
    pub reward: f64,
    /// 소속 플래그 가중치
    pub flag_weight: f64,
}
