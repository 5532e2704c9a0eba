//! 사이클 구성 모듈.

pub mod cycle;
pub mod daemon;
pub mod retry;
pub mod session;
pub mod source;
pub mod state;
pub mod store;

pub use cycle::{validate_concurrently, CycleDeps, TimeframeState, TradingCycle};
pub use daemon::{shutdown_signal, Daemon};
pub use retry::{with_retry, RetryPolicy};
pub use session::TradingSession;
pub use source::{JsonFileSource, MarketDataSource, MemorySource};
pub use state::CycleState;
pub use store::{FlagRepository, InMemoryRepository, RepositorySnapshot};
