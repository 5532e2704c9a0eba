//! 고정 횟수/간격 재시도 정책.
//!
//! 재시도 가능한 에러만 다시 시도하며, 대기 중 종료 신호가 오면 즉시
//! `ShutdownRequested`로 중단합니다.

use std::future::Future;
use std::time::Duration;

use flagbot_core::{FlagError, FlagResult, RuntimeConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{RunnerError, RunnerResult};

/// 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 총 시도 횟수 (최소 1)
    pub attempts: u32,
    /// 시도 간 대기 시간
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.retry_attempts, Duration::from_secs(config.retry_delay_secs))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// 정책에 따라 작업을 재시도합니다.
///
/// - 매 시도 전 종료 신호를 확인합니다.
/// - 재시도 불가 에러는 그대로 반환합니다.
/// - 모든 시도가 실패하면 [`RunnerError::RetriesExhausted`]를 반환합니다.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    token: &CancellationToken,
    stage: &'static str,
    mut op: F,
) -> RunnerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FlagResult<T>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.attempts {
        if token.is_cancelled() {
            return Err(FlagError::ShutdownRequested.into());
        }

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(stage, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e.into()),
            Err(e) => {
                warn!(
                    stage,
                    attempt,
                    max_attempts = policy.attempts,
                    error = %e,
                    "Attempt failed"
                );
                last_error = Some(e);
            }
        }

        if attempt < policy.attempts {
            tokio::select! {
                _ = token.cancelled() => return Err(FlagError::ShutdownRequested.into()),
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }
    }

    Err(RunnerError::RetriesExhausted {
        stage,
        attempts: policy.attempts,
        source: last_error.unwrap_or(FlagError::ShutdownRequested),
    })
}
