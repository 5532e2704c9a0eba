//! 거래 가능한 DP에서 주문 의도를 만듭니다.

use crate::error::{ExecutionError, ExecutionResult};
use flagbot_core::{decimal_from_f64, DecisionPoint, Direction, OrderIntent, OrderSide, Quantity};

/// DP와 선택된 RR로 지정가 주문 의도를 생성합니다.
///
/// - 상승: 고점에서 Buy Limit, 손절은 저점, 목표가는 `high + RR·range`
/// - 하락: 저점에서 Sell Limit, 손절은 고점, 목표가는 `low − RR·range`
pub fn build_order_intent(
    dp: &DecisionPoint,
    rr: f64,
    volume: Quantity,
    symbol: &str,
) -> ExecutionResult<OrderIntent> {
    let comment = dp
        .id()
        .ok_or_else(|| ExecutionError::InvalidIntent("decision point has no identity".to_string()))?;
    let (Some(high), Some(low)) = (dp.high.price, dp.low.price) else {
        return Err(ExecutionError::InvalidIntent(format!("{comment}: missing price")));
    };
    let range = high - low;
    if range <= rust_decimal::Decimal::ZERO {
        return Err(ExecutionError::InvalidIntent(format!(
            "{comment}: non-positive range {range}"
        )));
    }
    let rr = decimal_from_f64(rr)
        .filter(|r| r.is_sign_positive() && !r.is_zero())
        .ok_or_else(|| ExecutionError::InvalidIntent(format!("{comment}: invalid reward ratio {rr}")))?;

    let (side, entry, stop_loss, take_profit) = match dp.trade_direction {
        Direction::Bullish => (OrderSide::BuyLimit, high, low, high + rr * range),
        Direction::Bearish => (OrderSide::SellLimit, low, high, low - rr * range),
        Direction::Undefined => {
            return Err(ExecutionError::InvalidIntent(format!(
                "{comment}: undefined trade direction"
            )))
        }
    };

    Ok(OrderIntent {
        symbol: symbol.to_string(),
        side,
        entry,
        stop_loss,
        take_profit,
        volume,
        comment,
    })
}
