//! 주문 실행.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 브로커 인터페이스 ([`Broker`])
//! - 거래 가능한 FTC에서 주문 의도 생성
//! - 리스크 비율과 로트 크기를 적용한 주문 실행 ([`OrderExecutor`])
//! - 메모리 기반 모의 브로커 ([`PaperBroker`])

pub mod error;
pub mod executor;
pub mod intent;
pub mod paper;
pub mod traits;

pub use error::{ExecutionError, ExecutionResult};
pub use executor::{ExecutionOutcome, OrderExecutor};
pub use intent::build_order_intent;
pub use paper::{PaperBroker, PaperConfig, PaperOrder};
pub use traits::Broker;
