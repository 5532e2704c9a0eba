//! 브로커 trait 정의.

use crate::error::ExecutionResult;
use async_trait::async_trait;
use flagbot_core::{OrderIntent, SymbolSpec};
use rust_decimal::Decimal;

/// 주문을 받는 브로커 인터페이스.
///
/// 주문 접수 후 불투명한 주문 ID를 돌려주며 즉시 체결을 보장하지 않습니다.
#[async_trait]
pub trait Broker: Send + Sync {
    /// 브로커 이름.
    fn name(&self) -> &str;

    /// 계좌 잔고.
    async fn account_balance(&self) -> ExecutionResult<Decimal>;

    /// 심볼 거래 규격.
    async fn symbol_spec(&self, symbol: &str) -> ExecutionResult<SymbolSpec>;

    /// 주문 제출. 브로커 주문 ID를 반환합니다.
    async fn place_order(&self, intent: &OrderIntent) -> ExecutionResult<String>;
}
