//! 주문 실행기.
//!
//! 선택된 RR과 확률로 리스크 비율을 구하고, 브로커 규격으로 로트를 계산한 뒤
//! 지정가 주문을 제출합니다.

use std::sync::Arc;

use chrono::Utc;
use flagbot_core::{DecisionPoint, OrderIntent, PositionRecord};
use flagbot_risk::{lot_size, risk_fraction, RiskParams, TradeDecision};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExecutionError, ExecutionResult};
use crate::intent::build_order_intent;
use crate::traits::Broker;

/// 실행 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// 주문 접수됨
    Placed {
        intent: OrderIntent,
        record: PositionRecord,
    },
    /// 리스크 비율이 0이라 주문하지 않음
    NoRisk { dp_id: String, probability: f64 },
}

/// 리스크 엔진과 브로커를 잇는 실행기.
pub struct OrderExecutor {
    broker: Arc<dyn Broker>,
    params: RiskParams,
    symbol: String,
}

impl OrderExecutor {
    /// 새 실행기를 생성합니다.
    pub fn new(broker: Arc<dyn Broker>, params: RiskParams, symbol: impl Into<String>) -> Self {
        Self {
            broker,
            params,
            symbol: symbol.into(),
        }
    }

    /// 브로커 이름.
    pub fn broker_name(&self) -> &str {
        self.broker.name()
    }

    /// 거래 가능한 DP에 대해 주문을 제출합니다.
    pub async fn execute(
        &self,
        dp: &DecisionPoint,
        decision: TradeDecision,
    ) -> ExecutionResult<ExecutionOutcome> {
        let dp_id = dp
            .id()
            .ok_or_else(|| ExecutionError::InvalidIntent("decision point has no identity".to_string()))?;

        let fraction = risk_fraction(decision.probability, decision.rr, &self.params);
        if fraction <= 0.0 {
            debug!(dp_id = %dp_id, probability = decision.probability, "Zero risk fraction, skipping order");
            return Ok(ExecutionOutcome::NoRisk {
                dp_id,
                probability: decision.probability,
            });
        }

        let balance = self.broker.account_balance().await?;
        let spec = self.broker.symbol_spec(&self.symbol).await?;

        // 최소 거래량으로 먼저 만든 뒤 계산된 로트로 교체
        let draft = build_order_intent(dp, decision.rr, spec.volume_min, &self.symbol)?;
        let volume = lot_size(draft.entry, draft.stop_loss, fraction * 100.0, balance, &spec)?;
        let intent = OrderIntent { volume, ..draft };

        let order_id = self.broker.place_order(&intent).await?;

        info!(
            broker = self.broker.name(),
            dp_id = %dp_id,
            order_id = %order_id,
            side = %intent.side,
            entry = %intent.entry,
            stop_loss = %intent.stop_loss,
            take_profit = %intent.take_profit,
            volume = %intent.volume,
            rr = decision.rr,
            probability = decision.probability,
            risk_fraction = fraction,
            "Order placed"
        );

        let record = PositionRecord::from_intent(&intent, order_id, Utc::now());
        Ok(ExecutionOutcome::Placed { intent, record })
    }
}
