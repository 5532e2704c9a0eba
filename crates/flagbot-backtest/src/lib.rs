//! # Flagbot Backtest
//!
//! 저장된 의사결정 포인트를 최신 가격 시리즈로 다시 검증하고,
//! 소진된 DP의 실현 보상 비율을 계산합니다.
//!
//! - [`validate_dp`]: 단일 DP 검증 (순수 함수)
//! - [`validate_all`]: 여러 DP 검증 결과를 하나의 보고서로 병합
//! - [`sweep_reward_ratios`]: 보상 비율별 손익/승률 스윕

pub mod sweep;
pub mod validation;

pub use sweep::{sweep_reward_ratios, SweepPoint, SweepReport};
pub use validation::{
    el_reaction, validate_all, validate_dp, ValidationFaultRecord, ValidationOutcome,
    ValidationReport,
};
