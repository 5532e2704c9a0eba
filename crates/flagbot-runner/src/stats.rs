//! 사이클 통계 구조체.

use flagbot_core::Timeframe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 한 타임프레임 사이클의 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleStats {
    /// 타임프레임
    pub timeframe: Option<Timeframe>,
    /// 새로 추가된 봉 수
    pub new_bars: usize,
    /// 탐지된 플래그 수
    pub detected_flags: usize,
    /// 처음 저장된 플래그 수
    pub new_flags: usize,
    /// 거부된 후보 수
    pub rejections: usize,
    /// 검증한 DP 수
    pub validated: usize,
    /// 거래 가능한 DP 수
    pub tradeable: usize,
    /// 소진된 DP 수
    pub invalidated: usize,
    /// 검증 실패 수
    pub faults: usize,
    /// 배치된 주문 수
    pub orders_placed: usize,
    /// 사이징 단계를 건너뛴 이유
    pub decision_skipped: Option<String>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleStats {
    /// 새 통계 객체 생성
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe: Some(timeframe),
            ..Self::default()
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        let timeframe = self.timeframe.map(|tf| tf.as_str()).unwrap_or("-");
        tracing::info!(
            timeframe,
            new_bars = self.new_bars,
            detected_flags = self.detected_flags,
            new_flags = self.new_flags,
            rejections = self.rejections,
            validated = self.validated,
            tradeable = self.tradeable,
            invalidated = self.invalidated,
            faults = self.faults,
            orders_placed = self.orders_placed,
            decision_skipped = self.decision_skipped.as_deref().unwrap_or("-"),
            elapsed = format!("{:.2}s", self.elapsed.as_secs_f64()),
            "Cycle completed"
        );
    }
}
