//! 사이징 에러 타입.

use flagbot_core::FlagError;
use thiserror::Error;

/// 로트 계산 에러.
///
/// 입력이 잘못된 경우이므로 재시도하지 않고 보고만 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    /// 틱 크기가 0
    #[error("틱 크기가 0입니다: {0}")]
    ZeroTickSize(String),

    /// 틱 가치가 0
    #[error("틱 가치가 0입니다: {0}")]
    ZeroTickValue(String),

    /// 진입가와 손절가가 같음
    #[error("손절 거리가 0입니다")]
    ZeroStopDistance,

    /// 로트당 손실이 0
    #[error("로트당 손실이 0입니다")]
    ZeroLossPerLot,

    /// 거래량 단위가 0
    #[error("거래량 단위가 0입니다: {0}")]
    ZeroVolumeStep(String),

    /// 리스크 비율이 유한하지 않거나 음수
    #[error("잘못된 리스크 비율: {0}")]
    InvalidRisk(String),
}

/// 사이징 작업을 위한 Result 타입.
pub type SizingResult<T> = Result<T, SizingError>;

impl SizingError {
    /// 재시도 가능 여부. 사이징 에러는 항상 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<SizingError> for FlagError {
    fn from(err: SizingError) -> Self {
        FlagError::Sizing(err.to_string())
    }
}
