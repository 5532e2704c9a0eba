//! 러너 에러 타입.

use flagbot_core::FlagError;
use thiserror::Error;

/// 사이클 실행 에러.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// 핵심 에러 (재시도 불가 또는 재시도 없이 전파됨)
    #[error(transparent)]
    Core(#[from] FlagError),

    /// 재시도 소진
    #[error("{stage} 단계 재시도 소진 ({attempts}회): {source}")]
    RetriesExhausted {
        stage: &'static str,
        attempts: u32,
        #[source]
        source: FlagError,
    },

    /// 검증 태스크 실패
    #[error("태스크 실패: {0}")]
    Task(String),
}

/// 러너 작업을 위한 Result 타입.
pub type RunnerResult<T> = Result<T, RunnerError>;

impl RunnerError {
    /// 종료 요청에 의한 에러인지 확인합니다.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, RunnerError::Core(FlagError::ShutdownRequested))
    }

    /// 사이클을 조용히 건너뛰어야 하는 에러인지 확인합니다.
    pub fn is_skip(&self) -> bool {
        matches!(self, RunnerError::Core(e) if e.is_skip())
    }

    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            RunnerError::Core(e) => e.is_retryable(),
            RunnerError::RetriesExhausted { .. } | RunnerError::Task(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RunnerError::Core(FlagError::ShutdownRequested).is_shutdown());
        assert!(RunnerError::Core(FlagError::NoData("closed".into())).is_skip());

        let exhausted = RunnerError::RetriesExhausted {
            stage: "fetch",
            attempts: 3,
            source: FlagError::Network("timeout".into()),
        };
        assert!(!exhausted.is_retryable());
        assert!(exhausted.to_string().contains("fetch"));
    }
}
