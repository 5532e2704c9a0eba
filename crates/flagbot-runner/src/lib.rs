//! 플래그 트레이딩 사이클 오케스트레이터.
//!
//! 이 crate는 봇 데몬을 구성하는 요소를 제공합니다:
//! - 사이클 단계 (Fetch → Detect → Validate → Size/Decide → Persist/Execute)
//! - 고정 횟수/간격 재시도 정책과 협조적 종료
//! - 저장소 및 시세 데이터 인터페이스와 메모리/파일 기반 구현
//! - 타임프레임별 동시 실행 데몬

pub mod error;
pub mod modules;
pub mod stats;

pub use error::{RunnerError, RunnerResult};
pub use modules::{
    shutdown_signal, validate_concurrently, with_retry, CycleDeps, CycleState, Daemon,
    FlagRepository, InMemoryRepository, JsonFileSource, MarketDataSource, MemorySource,
    RepositorySnapshot, RetryPolicy, TimeframeState, TradingCycle, TradingSession,
};
pub use stats::CycleStats;
