//! 주문 의도 및 포지션 기록.

use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// 시장가 매수
    #[serde(rename = "Buy")]
    Buy,
    /// 시장가 매도
    #[serde(rename = "Sell")]
    Sell,
    /// 지정가 매수
    #[serde(rename = "Buy Limit")]
    BuyLimit,
    /// 지정가 매도
    #[serde(rename = "Sell Limit")]
    SellLimit,
}

impl OrderSide {
    /// 매수 계열인지 확인합니다.
    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy | OrderSide::BuyLimit)
    }

    /// 지정가 주문인지 확인합니다.
    pub fn is_pending(&self) -> bool {
        matches!(self, OrderSide::BuyLimit | OrderSide::SellLimit)
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "Buy"),
            OrderSide::Sell => write!(f, "Sell"),
            OrderSide::BuyLimit => write!(f, "Buy Limit"),
            OrderSide::SellLimit => write!(f, "Sell Limit"),
        }
    }
}

/// 브로커로 보낼 주문 의도.
///
/// 체결은 비동기로 이루어지며 코어는 즉시 체결을 가정하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub entry: Price,
    pub stop_loss: Price,
    pub take_profit: Price,
    pub volume: Quantity,
    /// 주문 코멘트 (DP 식별자)
    pub comment: String,
}

/// 브로커 심볼 거래 규격.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    /// 최소 가격 변동 단위
    pub tick_size: Price,
    /// 1로트 기준 틱당 손익 (계좌 통화)
    pub tick_value: Decimal,
    pub volume_min: Quantity,
    pub volume_max: Quantity,
    pub volume_step: Quantity,
}

/// 배치된 포지션 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// 거래한 DP 식별자
    pub traded_dp: String,
    pub side: OrderSide,
    pub price: Price,
    pub stop_loss: Price,
    pub take_profit: Price,
    pub last_modified: DateTime<Utc>,
    pub volume: Quantity,
    /// 브로커 주문 ID
    pub order_id: String,
    /// 결과 (0 = 미결)
    pub result: i32,
}

impl PositionRecord {
    /// 주문 의도와 브로커 주문 ID로 기록을 생성합니다.
    pub fn from_intent(intent: &OrderIntent, order_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            traded_dp: intent.comment.clone(),
            side: intent.side,
            price: intent.entry,
            stop_loss: intent.stop_loss,
            take_profit: intent.take_profit,
            last_modified: now,
            volume: intent.volume,
            order_id: order_id.into(),
            result: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_serde_names() {
        let json = serde_json::to_string(&OrderSide::BuyLimit).unwrap();
        assert_eq!(json, "\"Buy Limit\"");
        assert!(OrderSide::BuyLimit.is_buy());
        assert!(!OrderSide::Sell.is_pending());
        assert_eq!(OrderSide::SellLimit.to_string(), "Sell Limit");
    }
}
