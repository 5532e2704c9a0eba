//! 메모리 기반 모의 브로커.
//!
//! 주문을 체결하지 않고 접수 내역만 기록합니다. 데몬의 기본 브로커이자
//! 테스트용 브로커로 쓰입니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ExecutionError, ExecutionResult};
use crate::traits::Broker;
use flagbot_core::{OrderIntent, SymbolSpec};

/// 모의 브로커 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// 계좌 잔고
    pub balance: Decimal,
    /// 심볼별 거래 규격
    pub symbols: HashMap<String, SymbolSpec>,
}

impl PaperConfig {
    /// 잔고만 지정한 설정을 생성합니다.
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance,
            symbols: HashMap::new(),
        }
    }

    /// 심볼 규격을 추가합니다.
    pub fn with_symbol(mut self, spec: SymbolSpec) -> Self {
        self.symbols.insert(spec.symbol.clone(), spec);
        self
    }

    /// 5자리 FX 심볼 규격 (틱 0.00001, 틱 가치 1, 0.01~100 로트).
    pub fn fx_symbol(symbol: &str) -> SymbolSpec {
        SymbolSpec {
            symbol: symbol.to_string(),
            tick_size: dec!(0.00001),
            tick_value: dec!(1),
            volume_min: dec!(0.01),
            volume_max: dec!(100),
            volume_step: dec!(0.01),
        }
    }
}

/// 접수된 주문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperOrder {
    pub order_id: String,
    pub intent: OrderIntent,
}

/// 주문을 기록만 하는 모의 브로커.
pub struct PaperBroker {
    config: PaperConfig,
    orders: Arc<RwLock<Vec<PaperOrder>>>,
    /// 남은 강제 실패 횟수 (테스트용)
    failures: Arc<RwLock<u32>>,
}

impl PaperBroker {
    /// 새 모의 브로커를 생성합니다.
    pub fn new(config: PaperConfig) -> Self {
        Self {
            config,
            orders: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(0)),
        }
    }

    /// 다음 `count`번의 주문을 네트워크 에러로 실패시킵니다.
    pub async fn fail_next(&self, count: u32) {
        *self.failures.write().await = count;
    }

    /// 지금까지 접수된 주문.
    pub async fn orders(&self) -> Vec<PaperOrder> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn name(&self) -> &str {
        "paper"
    }

    async fn account_balance(&self) -> ExecutionResult<Decimal> {
        Ok(self.config.balance)
    }

    async fn symbol_spec(&self, symbol: &str) -> ExecutionResult<SymbolSpec> {
        self.config
            .symbols
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExecutionError::SymbolNotFound(symbol.to_string()))
    }

    async fn place_order(&self, intent: &OrderIntent) -> ExecutionResult<String> {
        {
            let mut failures = self.failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                warn!(symbol = %intent.symbol, remaining = *failures, "Injected broker failure");
                return Err(ExecutionError::Network("injected failure".to_string()));
            }
        }

        let spec = self.symbol_spec(&intent.symbol).await?;
        if intent.volume < spec.volume_min || intent.volume > spec.volume_max {
            return Err(ExecutionError::Rejected(format!(
                "volume {} outside [{}, {}]",
                intent.volume, spec.volume_min, spec.volume_max
            )));
        }

        let order_id = Uuid::new_v4().to_string();
        info!(
            order_id = %order_id,
            symbol = %intent.symbol,
            side = %intent.side,
            entry = %intent.entry,
            volume = %intent.volume,
            "Paper order accepted"
        );
        self.orders.write().await.push(PaperOrder {
            order_id: order_id.clone(),
            intent: intent.clone(),
        });
        Ok(order_id)
    }
}
