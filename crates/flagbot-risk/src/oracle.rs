//! 보상 비율별 승률 추정 오라클과 거래 선택 규칙.

use async_trait::async_trait;
use flagbot_core::{BacktestLabel, DecisionPoint, DpKind, FlagError, FlagResult};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

/// 보상 비율별 승률 추정기.
///
/// 반환되는 벡터는 `rr_levels`와 같은 길이와 순서입니다.
#[async_trait]
pub trait ProbabilityOracle: Send + Sync {
    /// DP에 대해 각 보상 비율의 승률을 추정합니다.
    async fn estimate(&self, dp: &DecisionPoint, rr_levels: &[f64]) -> FlagResult<Vec<f64>>;

    /// 새로 확정된 백테스트 라벨을 전달받습니다. 기본 구현은 무시합니다.
    fn observe(&self, _labels: &[BacktestLabel]) {}

    /// 오라클 이름.
    fn name(&self) -> &str;
}

/// 소진된 DP의 백테스트 라벨에서 `P(label > RR)`를 추정하는 오라클.
///
/// 같은 종류(FTC/EL/MPL)의 라벨만 사용합니다.
#[derive(Debug, Default)]
pub struct EmpiricalOracle {
    labels: RwLock<Vec<BacktestLabel>>,
    min_samples: usize,
}

impl EmpiricalOracle {
    /// 새 오라클을 생성합니다.
    pub fn new(min_samples: usize) -> Self {
        Self {
            labels: RwLock::new(Vec::new()),
            min_samples,
        }
    }

    /// 초기 라벨을 설정합니다.
    pub fn with_labels(self, labels: Vec<BacktestLabel>) -> Self {
        self.replace(labels);
        self
    }

    /// 라벨 전체를 교체합니다.
    pub fn replace(&self, labels: Vec<BacktestLabel>) {
        *self.write_labels() = labels;
    }

    /// 라벨을 추가합니다.
    pub fn extend(&self, labels: impl IntoIterator<Item = BacktestLabel>) {
        self.write_labels().extend(labels);
    }

    /// 쓰기 잠금. 오염된 잠금은 경고 후 복구합니다.
    fn write_labels(&self) -> RwLockWriteGuard<'_, Vec<BacktestLabel>> {
        self.labels.write().unwrap_or_else(|poisoned| {
            warn!("Label store lock poisoned, recovering");
            self.labels.clear_poison();
            poisoned.into_inner()
        })
    }

    /// 종류별 유효 표본 수.
    pub fn sample_count(&self, kind: DpKind) -> usize {
        self.labels
            .read()
            .map(|l| l.iter().filter(|x| x.kind == kind && x.reward.is_finite()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProbabilityOracle for EmpiricalOracle {
    async fn estimate(&self, dp: &DecisionPoint, rr_levels: &[f64]) -> FlagResult<Vec<f64>> {
        let rewards: Vec<f64> = self
            .labels
            .read()
            .map_err(|_| FlagError::OracleUnavailable("label store poisoned".to_string()))?
            .iter()
            .filter(|l| l.kind == dp.kind && l.reward.is_finite())
            .map(|l| l.reward)
            .collect();

        if rewards.is_empty() || rewards.len() < self.min_samples {
            return Err(FlagError::OracleUnavailable(format!(
                "{} samples for {} (need {})",
                rewards.len(),
                dp.kind,
                self.min_samples
            )));
        }

        let n = rewards.len() as f64;
        Ok(rr_levels
            .iter()
            .map(|&rr| rewards.iter().filter(|&&r| r > rr).count() as f64 / n)
            .collect())
    }

    fn observe(&self, labels: &[BacktestLabel]) {
        self.extend(labels.iter().cloned());
    }

    fn name(&self) -> &str {
        "empirical"
    }
}

/// 선택된 거래 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub rr: f64,
    pub probability: f64,
}

/// 거래 후보가 거부된 이유.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SelectionRejection {
    /// 확률 개수가 RR 개수와 다름
    LengthMismatch,
    /// 확률 곡선이 허용 오차를 넘어 증가함
    NotMonotonic { index: usize },
    /// 첫 RR부터 최소 확률 이하
    BelowThreshold,
}

/// 확률 곡선에서 거래할 RR을 고릅니다.
///
/// 곡선은 허용 오차 안에서 단조 감소해야 합니다 (`p[i+1] ≤ p[i] + tolerance`).
/// 곡선이 `min_prob` 아래로 내려가기 직전의 마지막 RR을 택합니다.
pub fn select_reward_ratio(
    rr_levels: &[f64],
    probabilities: &[f64],
    min_prob: f64,
    tolerance: f64,
) -> Result<TradeDecision, SelectionRejection> {
    if rr_levels.len() != probabilities.len() || rr_levels.is_empty() {
        return Err(SelectionRejection::LengthMismatch);
    }

    if let Some(index) = probabilities
        .windows(2)
        .position(|w| w[1] > w[0] + tolerance)
    {
        debug!(index, "Probability curve not monotonic");
        return Err(SelectionRejection::NotMonotonic { index: index + 1 });
    }

    rr_levels
        .iter()
        .zip(probabilities)
        .take_while(|(_, p)| **p > min_prob)
        .last()
        .map(|(&rr, &probability)| TradeDecision { rr, probability })
        .ok_or(SelectionRejection::BelowThreshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagbot_core::Direction;

    fn label(kind: DpKind, reward: f64) -> BacktestLabel {
        BacktestLabel {
            dp_id: format!("{kind}:{reward}"),
            kind,
            trade_direction: Direction::Bullish,
            reward,
            flag_weight: 1.0,
        }
    }

    fn ftc() -> DecisionPoint {
        DecisionPoint::invalid(DpKind::Ftc, Direction::Bullish, Direction::Bullish)
    }

    #[tokio::test]
    async fn test_labels_survive_poisoned_lock() {
        let oracle = std::sync::Arc::new(EmpiricalOracle::new(1));
        let writer = std::sync::Arc::clone(&oracle);
        let _ = std::thread::spawn(move || {
            let _guard = writer.labels.write().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(oracle.labels.is_poisoned());

        oracle.extend(vec![label(DpKind::Ftc, 2.0)]);
        assert_eq!(oracle.sample_count(DpKind::Ftc), 1);
        assert!(oracle.estimate(&ftc(), &[1.0]).await.is_ok());
    }

    #[tokio::test]
    async fn test_empirical_estimate() {
        let oracle = EmpiricalOracle::new(4).with_labels(vec![
            label(DpKind::Ftc, 0.5),
            label(DpKind::Ftc, 1.5),
            label(DpKind::Ftc, 2.5),
            label(DpKind::Ftc, 3.5),
            label(DpKind::El, 9.0),
        ]);

        let probs = oracle.estimate(&ftc(), &[1.0, 2.0, 3.0, 4.0]).await.unwrap();
        assert_eq!(probs, vec![0.75, 0.5, 0.25, 0.0]);
        assert_eq!(oracle.sample_count(DpKind::El), 1);
    }

    #[tokio::test]
    async fn test_empirical_unavailable_without_samples() {
        let oracle = EmpiricalOracle::new(10).with_labels(vec![label(DpKind::Ftc, 1.0)]);
        let result = oracle.estimate(&ftc(), &[1.0]).await;
        assert!(matches!(result, Err(FlagError::OracleUnavailable(_))));
    }

    #[tokio::test]
    async fn test_observe_through_trait_object() {
        let oracle: std::sync::Arc<dyn ProbabilityOracle> =
            std::sync::Arc::new(EmpiricalOracle::new(2));
        assert!(oracle.estimate(&ftc(), &[1.0]).await.is_err());

        oracle.observe(&[label(DpKind::Ftc, 0.5), label(DpKind::Ftc, 2.0)]);
        let probs = oracle.estimate(&ftc(), &[1.0]).await.unwrap();
        assert_eq!(probs, vec![0.5]);
    }

    #[test]
    fn test_select_last_before_crossing() {
        let rr = [1.0, 2.0, 3.0, 4.0];
        let decision = select_reward_ratio(&rr, &[0.7, 0.55, 0.42, 0.3], 0.4, 0.0).unwrap();
        assert_eq!(decision.rr, 3.0);
        assert_eq!(decision.probability, 0.42);
    }

    #[test]
    fn test_select_rejects_non_monotonic() {
        let rr = [1.0, 2.0, 3.0];
        assert_eq!(
            select_reward_ratio(&rr, &[0.5, 0.6, 0.4], 0.3, 0.05),
            Err(SelectionRejection::NotMonotonic { index: 1 })
        );
        // 허용 오차 안의 증가는 통과
        assert!(select_reward_ratio(&rr, &[0.5, 0.52, 0.4], 0.3, 0.05).is_ok());
    }

    #[test]
    fn test_select_below_threshold() {
        assert_eq!(
            select_reward_ratio(&[1.0, 2.0], &[0.3, 0.2], 0.35, 0.0),
            Err(SelectionRejection::BelowThreshold)
        );
        assert_eq!(
            select_reward_ratio(&[1.0], &[0.3, 0.2], 0.35, 0.0),
            Err(SelectionRejection::LengthMismatch)
        );
    }
}
