//! 확률 모델 점수.

use serde::{Deserialize, Serialize};

/// 점수 가중치.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub winrate: f64,
    pub pnl: f64,
    /// 거래 수 신뢰도 감쇠 상수
    pub trades: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            winrate: 0.4,
            pnl: 0.6,
            trades: 50.0,
        }
    }
}

/// 확률 모델의 백테스트 성과 점수.
///
/// 거래당 손익을 거래당 드로다운 예산(`dd_daily / max_trades_daily`)으로 나누어
/// 정규화하고, 거래 수가 적을수록 `1 − exp(−n / w)`로 깎습니다.
/// 거래가 없으면 -1.
pub fn model_score(
    winrate: f64,
    pnl_percent: f64,
    num_trades: u32,
    dd_daily: f64,
    max_trades_daily: u32,
    weights: ScoreWeights,
) -> f64 {
    if num_trades == 0 {
        return -1.0;
    }

    let n = f64::from(num_trades);
    let pnl_per_trade = pnl_percent / n;
    let confidence = 1.0 - (-n / weights.trades).exp();
    let budget = dd_daily / f64::from(max_trades_daily.max(1));

    winrate * weights.winrate + (pnl_per_trade / budget) * weights.pnl * confidence
}
