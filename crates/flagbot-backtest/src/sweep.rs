//! 보상 비율 스윕.
//!
//! 소진된 DP들의 실현 보상 라벨을 가지고 보상 비율(RR)별로 고정 위험 `R`을
//! 걸었을 때의 손익과 승률을 계산합니다. 라벨이 RR을 넘으면 `+R·RR·w`,
//! 아니면 `−R·w`이며 거래마다 수수료를 뺍니다.

use flagbot_core::{decimal_from_f64, BacktestLabel, DecimalExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// RR 하나의 스윕 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub rr: f64,
    /// 누적 손익 (계좌 통화)
    pub profit: Decimal,
    /// 잔고 대비 손익 (%)
    pub profit_pct: f64,
    /// 승률 (0~1)
    pub win_rate: f64,
}

/// 스윕 결과.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub points: Vec<SweepPoint>,
    /// 최대 손익을 낸 RR 목록
    pub best_rr: Vec<f64>,
    /// 집계에 사용된 거래 수
    pub trades: usize,
}

/// RR 목록에 대해 손익과 승률을 계산합니다.
///
/// 유한하지 않은 라벨은 건너뜁니다. 거래가 없으면 `best_rr`는 비어 있습니다.
pub fn sweep_reward_ratios(
    labels: &[BacktestLabel],
    rr_levels: &[f64],
    commission: Decimal,
    risk_amount: Decimal,
    balance: Decimal,
) -> SweepReport {
    let samples: Vec<&BacktestLabel> = labels.iter().filter(|l| l.reward.is_finite()).collect();
    let trades = samples.len();

    let points: Vec<SweepPoint> = rr_levels
        .iter()
        .map(|&rr| {
            let mut profit = Decimal::ZERO;
            let mut losses = 0usize;
            for label in &samples {
                let weight = decimal_from_f64(label.flag_weight).unwrap_or(Decimal::ZERO);
                if label.reward <= rr {
                    losses += 1;
                    profit -= risk_amount * weight;
                } else {
                    let multiple = decimal_from_f64(rr).unwrap_or(Decimal::ZERO);
                    profit += risk_amount * multiple * weight;
                }
                profit -= commission;
            }

            let win_rate = if trades == 0 {
                0.0
            } else {
                1.0 - losses as f64 / trades as f64
            };
            let profit_pct = profit.ratio_to(balance).map_or(0.0, |r| r * 100.0);

            SweepPoint {
                rr,
                profit,
                profit_pct,
                win_rate,
            }
        })
        .collect();

    let best_rr = match points.iter().map(|p| p.profit).max() {
        Some(max) if trades > 0 => points
            .iter()
            .filter(|p| p.profit == max)
            .map(|p| p.rr)
            .collect(),
        _ => Vec::new(),
    };

    info!(trades, levels = rr_levels.len(), best = ?best_rr, "Reward ratio sweep complete");

    SweepReport {
        points,
        best_rr,
        trades,
    }
}
