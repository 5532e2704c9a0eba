//! 플래그 트레이딩 시스템의 에러 타입.
//!
//! 기하 조건 불충족(플래그/DP 규칙 미충족)은 에러가 아닌 정상적인 음성 결과이므로
//! 여기에 포함되지 않습니다. 탐지기는 이를 데이터로 반환합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum FlagError {
    /// 시장 휴장 또는 빈 데이터 수신. 사이클을 건너뜁니다.
    #[error("데이터 없음: {0}")]
    NoData(String),

    /// 잘못된 봉 데이터 (시간 역순 등)
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 단일 DP 검증 중 발생한 에러
    #[error("검증 실패 ({dp_id}): {reason}")]
    ValidationFault {
        /// 대상 DP 식별자
        dp_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 저장소 에러
    #[error("저장소 에러: {0}")]
    Persistence(String),

    /// 사용할 수 있는 확률 추정치 없음
    #[error("확률 오라클 사용 불가: {0}")]
    OracleUnavailable(String),

    /// 주문 실행 에러
    #[error("실행 에러: {0}")]
    Execution(String),

    /// 로트 계산 에러
    #[error("사이징 에러: {0}")]
    Sizing(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 종료 요청됨
    #[error("종료 요청됨")]
    ShutdownRequested,
}

/// 핵심 작업을 위한 Result 타입.
pub type FlagResult<T> = Result<T, FlagError>;

impl FlagError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 외부 I/O 경계(저장소, 네트워크)에서 발생한 에러만 재시도합니다.
    /// 브로커 거부와 사이징 에러는 같은 입력으로 다시 시도해도 결과가 같습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlagError::Persistence(_) | FlagError::Network(_))
    }

    /// 사이클을 조용히 건너뛰어야 하는 에러인지 확인합니다.
    pub fn is_skip(&self) -> bool {
        matches!(self, FlagError::NoData(_) | FlagError::OracleUnavailable(_))
    }
}

impl From<serde_json::Error> for FlagError {
    fn from(err: serde_json::Error) -> Self {
        FlagError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for FlagError {
    fn from(err: config::ConfigError) -> Self {
        FlagError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(FlagError::Persistence("locked".to_string()).is_retryable());
        assert!(FlagError::Network("timeout".to_string()).is_retryable());
        assert!(!FlagError::Sizing("zero tick".to_string()).is_retryable());
        assert!(!FlagError::Execution("rejected".to_string()).is_retryable());
        assert!(!FlagError::ShutdownRequested.is_retryable());
    }

    #[test]
    fn test_error_skip() {
        assert!(FlagError::NoData("market closed".to_string()).is_skip());
        assert!(!FlagError::Data("unordered".to_string()).is_skip());
    }

    #[test]
    fn test_validation_fault_message() {
        let err = FlagError::ValidationFault {
            dp_id: "FTC:a:b".to_string(),
            reason: "zero range".to_string(),
        };
        assert_eq!(err.to_string(), "검증 실패 (FTC:a:b): zero range");
    }
}
