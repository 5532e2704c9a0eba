//! 리스크 및 사이징 엔진.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 연속 손실 모델과 켈리 비율을 이용한 거래당 리스크 비율 계산
//! - 브로커 규격에 맞는 로트 크기 계산
//! - 보상 비율별 승률 추정 오라클과 거래 선택 규칙
//! - 확률 모델 점수
//!
//! # 예제
//!
//! ```rust,ignore
//! use flagbot_risk::{risk_fraction, lot_size, RiskParams};
//!
//! let params = RiskParams::from_config(&config.risk);
//! let fraction = risk_fraction(0.55, 2.0, &params);
//! let volume = lot_size(entry, stop, fraction * 100.0, balance, &spec)?;
//! ```

pub mod error;
pub mod oracle;
pub mod score;
pub mod sizing;

// 주요 타입 재내보내기
pub use error::{SizingError, SizingResult};
pub use oracle::{
    select_reward_ratio, EmpiricalOracle, ProbabilityOracle, SelectionRejection, TradeDecision,
};
pub use score::{model_score, ScoreWeights};
pub use sizing::{kelly_fraction, losing_streak_length, lot_size, risk_fraction, RiskParams};
