//! 실행 에러 타입.

use flagbot_core::FlagError;
use flagbot_risk::SizingError;
use thiserror::Error;

/// 주문 실행 관련 에러.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 브로커가 주문을 거부함
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// 심볼을 찾을 수 없음
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// 주문 의도를 만들 수 없는 DP
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    /// 로트 계산 실패
    #[error("Sizing failed: {0}")]
    Sizing(#[from] SizingError),
}

/// 실행 작업을 위한 Result 타입.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

impl ExecutionError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutionError::Network(_))
    }
}

impl From<ExecutionError> for FlagError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Network(msg) => FlagError::Network(msg),
            ExecutionError::Sizing(e) => FlagError::Sizing(e.to_string()),
            other => FlagError::Execution(other.to_string()),
        }
    }
}
