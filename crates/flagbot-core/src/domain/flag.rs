//! 플래그 패턴.

use super::{DecisionPoint, Direction, DpKind, Point};
use crate::types::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 탐지된 플래그.
///
/// 탐지 이후 불변이며 세 개의 DP(FTC/EL/MPL)를 소유합니다.
/// `unique_point`(극점 봉 시각)가 재탐지 중복 제거 키입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub direction: Direction,
    /// 방향성 극점 (상승: 고점, 하락: 저점)
    pub pole_point: Point,
    /// 조정 구간의 반대 극점 (상승: 최저점, 하락: 최고점)
    pub trough_point: Point,
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 극점 봉 시각
    pub unique_point: DateTime<Utc>,
    /// 극점 봉 인덱스
    pub anchor_index: usize,
    /// EL 구간 시작 인덱스 (정의되지 않으면 `None`)
    pub el_start_index: Option<usize>,
    pub el_start_time: Option<DateTime<Utc>>,
    /// 지속 기간 기반 가중치
    pub weight: f64,
    /// 극점과 반대 극점 사이 분
    pub length: Option<i64>,
    pub ftc: DecisionPoint,
    pub el: DecisionPoint,
    pub mpl: DecisionPoint,
}

impl Flag {
    /// 극점과 반대 극점 사이의 가격 범위 (항상 0 이상).
    pub fn range(&self) -> Option<Price> {
        let pole = self.pole_point.price?;
        let trough = self.trough_point.price?;
        Some((pole - trough).abs())
    }

    /// 세 DP를 순서대로 반환합니다.
    pub fn decision_points(&self) -> [&DecisionPoint; 3] {
        [&self.ftc, &self.el, &self.mpl]
    }

    /// 종류로 DP를 찾습니다.
    pub fn decision_point(&self, kind: DpKind) -> &DecisionPoint {
        match kind {
            DpKind::Ftc => &self.ftc,
            DpKind::El => &self.el,
            DpKind::Mpl => &self.mpl,
        }
    }

    /// 지속 기간 (극점부터 종료 봉까지의 봉 수).
    pub fn duration(&self) -> usize {
        self.end_index - self.anchor_index
    }
}
